//! Canonical message encoding for attestations.
//!
//! Both signature backends sign exactly these 32 bytes: the Merkle root as a
//! fixed-width big-endian unsigned integer.

use crate::error::{CryptoError, CryptoResult};
use credroot_core::{FieldElement, FIELD_ELEMENT_BYTES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The signed form of a Merkle root.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RootDigest(#[serde(with = "hex::serde")] [u8; FIELD_ELEMENT_BYTES]);

impl RootDigest {
    pub fn from_root(root: &FieldElement) -> Self {
        Self(root.to_be_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; FIELD_ELEMENT_BYTES] = bytes.try_into().map_err(|_| {
            CryptoError::Malformed(format!(
                "root digest must be {} bytes, got {}",
                FIELD_ELEMENT_BYTES,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; FIELD_ELEMENT_BYTES] {
        &self.0
    }

    /// Recovers the root, failing if the bytes are not a field element.
    pub fn to_root(&self) -> CryptoResult<FieldElement> {
        Ok(FieldElement::from_be_bytes(&self.0)?)
    }
}

impl From<&FieldElement> for RootDigest {
    fn from(root: &FieldElement) -> Self {
        Self::from_root(root)
    }
}

impl fmt::Debug for RootDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootDigest({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_fixed_width_big_endian() {
        let digest = RootDigest::from_root(&FieldElement::from(0x0102u64));
        let mut expected = [0u8; 32];
        expected[30] = 0x01;
        expected[31] = 0x02;
        assert_eq!(digest.as_bytes(), &expected);
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        assert!(matches!(
            RootDigest::from_bytes(&[0u8; 31]),
            Err(CryptoError::Malformed(_))
        ));
        assert!(RootDigest::from_bytes(&[0u8; 32]).is_ok());
    }

    #[test]
    fn test_round_trip_to_root() {
        let root = FieldElement::from(987654321u64);
        assert_eq!(RootDigest::from_root(&root).to_root().unwrap(), root);
    }
}
