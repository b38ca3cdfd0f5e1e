//! Field hash primitive.
//!
//! Attribute values are mapped onto elements of the BN254 scalar field and
//! compressed pairwise with the circom-compatible Poseidon permutation. The
//! same field is the base field of the curve used by the field-native
//! attestation backend, so every hash output can be signed without
//! re-encoding.
//!
//! `combine` is order-sensitive: `combine(a, b)` and `combine(b, a)` differ,
//! which is what gives the left/right position in a decommitment path its
//! meaning.

use crate::error::{CoreError, Result};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use light_poseidon::{Poseidon, PoseidonHasher};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Width in bytes of the canonical field element encoding.
pub const FIELD_ELEMENT_BYTES: usize = 32;

/// The field prime, in decimal.
pub const FIELD_PRIME_DECIMAL: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// An element of the BN254 scalar field, always in `[0, FIELD_PRIME)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldElement(Fr);

impl FieldElement {
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Wraps an arkworks field element.
    pub fn from_fr(value: Fr) -> Self {
        Self(value)
    }

    pub fn as_fr(&self) -> &Fr {
        &self.0
    }

    /// The field prime as a 32-byte big-endian integer.
    pub fn modulus_be_bytes() -> [u8; FIELD_ELEMENT_BYTES] {
        let mut out = [0u8; FIELD_ELEMENT_BYTES];
        out.copy_from_slice(&Fr::MODULUS.to_bytes_be());
        out
    }

    /// Interprets `bytes` as a big-endian unsigned integer.
    ///
    /// Inputs wider than 32 bytes or numerically `>= FIELD_PRIME` are
    /// rejected; distinct inputs never alias to the same element.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FIELD_ELEMENT_BYTES {
            return Err(CoreError::Encoding(format!(
                "value is {} bytes wide (max {})",
                bytes.len(),
                FIELD_ELEMENT_BYTES
            )));
        }

        let mut padded = [0u8; FIELD_ELEMENT_BYTES];
        padded[FIELD_ELEMENT_BYTES - bytes.len()..].copy_from_slice(bytes);

        // Equal-width big-endian arrays compare numerically.
        if padded >= Self::modulus_be_bytes() {
            return Err(CoreError::Encoding(
                "value is not below the field prime".to_string(),
            ));
        }

        Ok(Self(Fr::from_be_bytes_mod_order(&padded)))
    }

    /// Canonical fixed-width big-endian encoding.
    pub fn to_be_bytes(&self) -> [u8; FIELD_ELEMENT_BYTES] {
        let bytes = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; FIELD_ELEMENT_BYTES];
        out[FIELD_ELEMENT_BYTES - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    /// Parses hex with or without a `0x` prefix. Odd digit counts are
    /// left-padded with a zero nibble.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches("0x");
        let normalized = if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&normalized)
            .map_err(|e| CoreError::Encoding(format!("invalid hex field element: {}", e)))?;
        Self::from_be_bytes(&bytes)
    }

    /// 64 lowercase hex digits, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// Parses an unsigned decimal integer, rejecting values `>= FIELD_PRIME`.
    pub fn from_decimal_str(s: &str) -> Result<Self> {
        Self::from_be_bytes(&parse_u256(s)?)
    }
}

/// Parses a decimal or `0x`-prefixed hex integer of at most 256 bits into
/// its 32-byte big-endian form.
pub fn parse_u256(s: &str) -> Result<[u8; FIELD_ELEMENT_BYTES]> {
    let s = s.trim();
    if let Some(digits) = s.strip_prefix("0x") {
        if digits.is_empty() {
            return Err(CoreError::Encoding("empty hex integer".to_string()));
        }
        let normalized = if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&normalized)
            .map_err(|e| CoreError::Encoding(format!("invalid hex integer: {}", e)))?;
        if bytes.len() > FIELD_ELEMENT_BYTES {
            return Err(CoreError::Encoding("hex value exceeds 256 bits".to_string()));
        }
        let mut out = [0u8; FIELD_ELEMENT_BYTES];
        out[FIELD_ELEMENT_BYTES - bytes.len()..].copy_from_slice(&bytes);
        return Ok(out);
    }

    if s.is_empty() {
        return Err(CoreError::Encoding("empty decimal string".to_string()));
    }

    let mut acc = [0u8; FIELD_ELEMENT_BYTES];
    for ch in s.chars() {
        let digit = ch
            .to_digit(10)
            .ok_or_else(|| CoreError::Encoding(format!("invalid decimal digit '{}'", ch)))?;
        let mut carry = digit;
        for byte in acc.iter_mut().rev() {
            let v = u32::from(*byte) * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return Err(CoreError::Encoding(
                "decimal value exceeds 256 bits".to_string(),
            ));
        }
    }
    Ok(acc)
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(Fr::from(value))
    }
}

impl From<u128> for FieldElement {
    fn from(value: u128) -> Self {
        Self(Fr::from(value))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement(0x{})", self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FieldElement::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A raw attribute value before encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Text(String),
    Integer(u128),
    Bytes(Vec<u8>),
    /// Already encoded, e.g. a pre-hashed identifier or a wallet address.
    Field(FieldElement),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Integer(u128::from(value))
    }
}

impl From<u128> for AttributeValue {
    fn from(value: u128) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        AttributeValue::Bytes(value)
    }
}

impl From<FieldElement> for AttributeValue {
    fn from(value: FieldElement) -> Self {
        AttributeValue::Field(value)
    }
}

/// Maps a raw attribute value onto a field element.
///
/// Text is encoded as its UTF-8 bytes read big-endian. Oversized values are
/// an `Encoding` error rather than being reduced.
pub fn encode(value: &AttributeValue) -> Result<FieldElement> {
    match value {
        AttributeValue::Integer(n) => Ok(FieldElement::from(*n)),
        AttributeValue::Field(f) => Ok(*f),
        AttributeValue::Text(s) => FieldElement::from_be_bytes(s.as_bytes()),
        AttributeValue::Bytes(b) => FieldElement::from_be_bytes(b),
    }
}

fn poseidon(inputs: &[Fr]) -> Result<FieldElement> {
    let mut hasher =
        Poseidon::<Fr>::new_circom(inputs.len()).map_err(|err| CoreError::Hash(err.to_string()))?;
    let hash = hasher
        .hash(inputs)
        .map_err(|err| CoreError::Hash(err.to_string()))?;
    Ok(FieldElement(hash))
}

/// Two-input Poseidon compression, no domain tag.
pub fn combine(left: FieldElement, right: FieldElement) -> Result<FieldElement> {
    poseidon(&[left.0, right.0])
}

/// Poseidon compression with an optional leading domain tag.
pub fn combine_tagged(
    tag: Option<FieldElement>,
    left: FieldElement,
    right: FieldElement,
) -> Result<FieldElement> {
    match tag {
        None => combine(left, right),
        Some(tag) => poseidon(&[tag.0, left.0, right.0]),
    }
}

/// Separation between leaf hashing and internal node hashing.
///
/// `Untagged` reproduces the legacy scheme where a leaf hash is simply
/// `combine(value, 0)` and nothing distinguishes it from an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HashDomain {
    #[default]
    Untagged,
    Tagged { leaf_tag: u64, node_tag: u64 },
}

impl HashDomain {
    pub fn leaf_tag(&self) -> Option<FieldElement> {
        match self {
            HashDomain::Untagged => None,
            HashDomain::Tagged { leaf_tag, .. } => Some(FieldElement::from(*leaf_tag)),
        }
    }

    pub fn node_tag(&self) -> Option<FieldElement> {
        match self {
            HashDomain::Untagged => None,
            HashDomain::Tagged { node_tag, .. } => Some(FieldElement::from(*node_tag)),
        }
    }

    /// Rejects tag pairs that would not separate anything.
    pub fn validate(&self) -> Result<()> {
        if let HashDomain::Tagged { leaf_tag, node_tag } = self {
            if leaf_tag == node_tag {
                return Err(CoreError::Config(
                    "leaf_tag and node_tag must differ".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// `combine(encode(value), 0)` under this domain.
    pub fn hash_leaf(&self, value: &AttributeValue) -> Result<FieldElement> {
        let encoded = encode(value)?;
        combine_tagged(self.leaf_tag(), encoded, FieldElement::zero())
    }

    /// Internal node hash of an ordered pair.
    pub fn hash_node(&self, left: FieldElement, right: FieldElement) -> Result<FieldElement> {
        combine_tagged(self.node_tag(), left, right)
    }
}

/// Legacy leaf hash: `combine(encode(value), 0)`.
pub fn leaf_hash(value: &AttributeValue) -> Result<FieldElement> {
    HashDomain::Untagged.hash_leaf(value)
}
