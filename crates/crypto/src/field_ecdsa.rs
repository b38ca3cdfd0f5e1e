//! Field-native ECDSA over Baby Jubjub.
//!
//! Private keys are scalars below the prime subgroup order `n`; public keys
//! are `d * G` encoded as `x || y` (64 bytes, big-endian). Nonces are derived
//! deterministically from the private key and the digest with keyed BLAKE3,
//! so the same key always produces the same signature for the same root. The
//! 254-bit digest is wider than `n`, so the signed scalar is a wide BLAKE3
//! output over the digest rather than the digest reduced mod `n`. A
//! degenerate nonce or signature component fails the call rather than being
//! silently retried.

use crate::digest::RootDigest;
use crate::domain::DomainParameters;
use crate::error::{CryptoError, CryptoResult};
use crate::signer::{AttestationSignature, PublicKey, RootSigner, RootVerifier, SCALAR_BYTES};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, Fr};
use ark_ff::{BigInteger, Field, PrimeField, Zero};
use credroot_core::{FieldElement, SignatureBackend, FIELD_ELEMENT_BYTES};
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

/// Domain separation for nonce derivation.
const NONCE_DOMAIN: &[u8] = b"credroot/field-ecdsa/nonce/v1";

/// Domain separation for the signed message scalar.
const MESSAGE_DOMAIN: &[u8] = b"credroot/field-ecdsa/message/v1";

/// Width of an encoded public key (`x || y`).
pub const PUBLIC_KEY_BYTES: usize = 2 * FIELD_ELEMENT_BYTES;

fn order_be_bytes() -> [u8; SCALAR_BYTES] {
    let mut out = [0u8; SCALAR_BYTES];
    out.copy_from_slice(&Fr::MODULUS.to_bytes_be());
    out
}

/// Reads a 32-byte big-endian integer as a scalar, `None` if it is not
/// below the subgroup order.
pub(crate) fn scalar_from_be_bytes(bytes: &[u8]) -> Option<Fr> {
    let array: [u8; SCALAR_BYTES] = bytes.try_into().ok()?;
    if array >= order_be_bytes() {
        return None;
    }
    Some(Fr::from_be_bytes_mod_order(&array))
}

pub(crate) fn scalar_to_be_bytes(scalar: &Fr) -> [u8; SCALAR_BYTES] {
    let bytes = scalar.into_bigint().to_bytes_be();
    let mut out = [0u8; SCALAR_BYTES];
    out[SCALAR_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Validates a private key: exactly 32 bytes, in `[1, n-1]`.
pub(crate) fn parse_private_scalar(bytes: &[u8]) -> CryptoResult<Fr> {
    if bytes.len() != SCALAR_BYTES {
        return Err(CryptoError::Malformed(format!(
            "private key must be {} bytes, got {}",
            SCALAR_BYTES,
            bytes.len()
        )));
    }
    let scalar = scalar_from_be_bytes(bytes).ok_or_else(|| {
        CryptoError::InvalidSignatureInput(
            "private key is not below the subgroup order".to_string(),
        )
    })?;
    if scalar.is_zero() {
        return Err(CryptoError::InvalidSignatureInput(
            "private key is zero".to_string(),
        ));
    }
    Ok(scalar)
}

/// The x coordinate reduced modulo the subgroup order.
fn x_mod_order(point: &EdwardsAffine) -> Fr {
    Fr::from_le_bytes_mod_order(&point.x.into_bigint().to_bytes_le())
}

/// Maps the full 32-byte digest to a scalar. Distinct digests never share
/// `z` through reduction mod `n`.
fn message_scalar(digest: &RootDigest) -> Fr {
    let mut hasher = blake3::Hasher::new();
    hasher.update(MESSAGE_DOMAIN);
    hasher.update(digest.as_bytes());
    let mut wide = [0u8; 64];
    hasher.finalize_xof().fill(&mut wide);
    Fr::from_le_bytes_mod_order(&wide)
}

fn derive_nonce(secret: &[u8; SCALAR_BYTES], digest: &RootDigest) -> Fr {
    let mut hasher = blake3::Hasher::new_keyed(secret);
    hasher.update(NONCE_DOMAIN);
    hasher.update(digest.as_bytes());
    let mut wide = [0u8; 64];
    hasher.finalize_xof().fill(&mut wide);
    let nonce = Fr::from_le_bytes_mod_order(&wide);
    wide.zeroize();
    nonce
}

pub fn encode_public_point(point: &EdwardsAffine) -> [u8; PUBLIC_KEY_BYTES] {
    let mut out = [0u8; PUBLIC_KEY_BYTES];
    out[..FIELD_ELEMENT_BYTES].copy_from_slice(&FieldElement::from_fr(point.x).to_be_bytes());
    out[FIELD_ELEMENT_BYTES..].copy_from_slice(&FieldElement::from_fr(point.y).to_be_bytes());
    out
}

pub fn decode_public_point(
    bytes: &[u8],
    domain: &DomainParameters,
) -> CryptoResult<EdwardsAffine> {
    if bytes.len() != PUBLIC_KEY_BYTES {
        return Err(CryptoError::Malformed(format!(
            "field public key must be {} bytes, got {}",
            PUBLIC_KEY_BYTES,
            bytes.len()
        )));
    }
    let x = FieldElement::from_be_bytes(&bytes[..FIELD_ELEMENT_BYTES])
        .map_err(|e| CryptoError::InvalidSignatureInput(format!("public key x: {}", e)))?;
    let y = FieldElement::from_be_bytes(&bytes[FIELD_ELEMENT_BYTES..])
        .map_err(|e| CryptoError::InvalidSignatureInput(format!("public key y: {}", e)))?;
    let point = EdwardsAffine::new_unchecked(*x.as_fr(), *y.as_fr());
    domain.validate_public_point(&point)?;
    Ok(point)
}

/// Signs root digests with a Baby Jubjub private key.
pub struct FieldEcdsaSigner {
    secret: Zeroizing<[u8; SCALAR_BYTES]>,
    public: EdwardsAffine,
    domain: Arc<DomainParameters>,
}

impl FieldEcdsaSigner {
    pub fn new(private_key: &[u8], domain: Arc<DomainParameters>) -> CryptoResult<Self> {
        let scalar = parse_private_scalar(private_key)?;
        let public = domain.mul_generator(&scalar).into_affine();

        let mut secret = Zeroizing::new([0u8; SCALAR_BYTES]);
        secret.copy_from_slice(private_key);

        Ok(Self {
            secret,
            public,
            domain,
        })
    }

    pub fn public_point(&self) -> &EdwardsAffine {
        &self.public
    }
}

impl std::fmt::Debug for FieldEcdsaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldEcdsaSigner")
            .field("public_key_id", &self.public_key().key_id())
            .finish_non_exhaustive()
    }
}

impl RootSigner for FieldEcdsaSigner {
    fn backend(&self) -> SignatureBackend {
        SignatureBackend::FieldEcdsa
    }

    fn public_key(&self) -> PublicKey {
        PublicKey {
            backend: SignatureBackend::FieldEcdsa,
            bytes: encode_public_point(&self.public).to_vec(),
        }
    }

    fn sign_digest(&self, digest: &RootDigest) -> CryptoResult<AttestationSignature> {
        let d = parse_private_scalar(self.secret.as_ref())?;
        let z = message_scalar(digest);

        let k = derive_nonce(&self.secret, digest);
        if k.is_zero() {
            return Err(CryptoError::DegenerateSignature("nonce is zero".to_string()));
        }

        let r_point = self.domain.mul_generator(&k).into_affine();
        let r = x_mod_order(&r_point);
        if r.is_zero() {
            return Err(CryptoError::DegenerateSignature("r is zero".to_string()));
        }

        let k_inv = k
            .inverse()
            .ok_or_else(|| CryptoError::DegenerateSignature("nonce not invertible".to_string()))?;
        let s = k_inv * (z + r * d);
        if s.is_zero() {
            return Err(CryptoError::DegenerateSignature("s is zero".to_string()));
        }

        debug!(digest = ?digest, "Root digest signed (field_ecdsa)");
        Ok(AttestationSignature {
            backend: SignatureBackend::FieldEcdsa,
            r: scalar_to_be_bytes(&r),
            s: scalar_to_be_bytes(&s),
        })
    }
}

/// Verifies field-native signatures under shared domain parameters.
#[derive(Debug, Clone)]
pub struct FieldEcdsaVerifier {
    domain: Arc<DomainParameters>,
}

impl FieldEcdsaVerifier {
    pub fn new(domain: Arc<DomainParameters>) -> Self {
        Self { domain }
    }
}

impl RootVerifier for FieldEcdsaVerifier {
    fn backend(&self) -> SignatureBackend {
        SignatureBackend::FieldEcdsa
    }

    fn verify_digest(
        &self,
        digest: &RootDigest,
        signature: &AttestationSignature,
        public_key: &PublicKey,
    ) -> CryptoResult<bool> {
        let q = decode_public_point(&public_key.bytes, &self.domain)?;

        let (r, s) = match (
            scalar_from_be_bytes(&signature.r),
            scalar_from_be_bytes(&signature.s),
        ) {
            (Some(r), Some(s)) if !r.is_zero() && !s.is_zero() => (r, s),
            _ => {
                warn!("Signature component outside [1, n-1]");
                return Ok(false);
            }
        };

        let w = match s.inverse() {
            Some(w) => w,
            None => return Ok(false),
        };
        let z = message_scalar(digest);
        let u1 = z * w;
        let u2 = r * w;

        let point = (self.domain.mul_generator(&u1) + q * u2).into_affine();
        if AffineRepr::is_zero(&point) {
            return Ok(false);
        }
        Ok(x_mod_order(&point) == r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Arc<DomainParameters> {
        Arc::new(DomainParameters::baby_jubjub().unwrap())
    }

    fn key(byte: u8) -> [u8; 32] {
        let mut k = [0u8; 32];
        k[31] = byte;
        k[0] = 0x01;
        k
    }

    fn digest(value: u64) -> RootDigest {
        RootDigest::from_root(&FieldElement::from(value))
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(7), domain.clone()).unwrap();
        let verifier = FieldEcdsaVerifier::new(domain);
        let d = digest(123456);

        let signature = signer.sign_digest(&d).unwrap();
        assert!(verifier
            .verify_digest(&d, &signature, &signer.public_key())
            .unwrap());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(9), domain.clone()).unwrap();
        let again = FieldEcdsaSigner::new(&key(9), domain).unwrap();
        let d = digest(42);
        assert_eq!(signer.sign_digest(&d).unwrap(), again.sign_digest(&d).unwrap());
        assert_ne!(
            signer.sign_digest(&d).unwrap(),
            signer.sign_digest(&digest(43)).unwrap()
        );
    }

    #[test]
    fn test_public_key_matches_generic_multiplication() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(3), domain.clone()).unwrap();
        let d = parse_private_scalar(&key(3)).unwrap();
        assert_eq!(*signer.public_point(), (*domain.generator() * d).into_affine());
    }

    #[test]
    fn test_rejects_tampered_digest() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(5), domain.clone()).unwrap();
        let verifier = FieldEcdsaVerifier::new(domain);
        let signature = signer.sign_digest(&digest(1000)).unwrap();
        assert!(!verifier
            .verify_digest(&digest(1001), &signature, &signer.public_key())
            .unwrap());
    }

    #[test]
    fn test_root_plus_order_does_not_verify() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(7), domain.clone()).unwrap();
        let verifier = FieldEcdsaVerifier::new(domain);

        let root = FieldElement::from(123456u64);
        let signature = signer.sign_root(&root).unwrap();
        assert!(verifier
            .verify_root(&root, &signature, &signer.public_key())
            .unwrap());

        // root + n is still a valid hash-field element but a different root.
        let order = FieldElement::from_be_bytes(&order_be_bytes()).unwrap();
        let shifted = FieldElement::from_fr(*root.as_fr() + *order.as_fr());
        assert_ne!(shifted, root);
        assert!(!verifier
            .verify_root(&shifted, &signature, &signer.public_key())
            .unwrap());
    }

    #[test]
    fn test_message_scalar_binds_all_digest_bits() {
        let low = digest(1);
        let mut high = *low.as_bytes();
        high[0] = 0x20;
        assert_ne!(
            message_scalar(&low),
            message_scalar(&RootDigest::from_bytes(&high).unwrap())
        );
    }

    #[test]
    fn test_rejects_tampered_signature() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(5), domain.clone()).unwrap();
        let verifier = FieldEcdsaVerifier::new(domain);
        let d = digest(77);
        let signature = signer.sign_digest(&d).unwrap();

        let mut bad_s = signature.clone();
        bad_s.s[31] ^= 0x01;
        assert!(!verifier.verify_digest(&d, &bad_s, &signer.public_key()).unwrap());

        let mut bad_r = signature;
        bad_r.r[20] ^= 0x10;
        assert!(!verifier.verify_digest(&d, &bad_r, &signer.public_key()).unwrap());
    }

    #[test]
    fn test_out_of_range_components_return_false() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(5), domain.clone()).unwrap();
        let verifier = FieldEcdsaVerifier::new(domain);
        let d = digest(77);
        let signature = signer.sign_digest(&d).unwrap();

        let mut zero_r = signature.clone();
        zero_r.r = [0u8; 32];
        assert!(!verifier.verify_digest(&d, &zero_r, &signer.public_key()).unwrap());

        let mut huge_s = signature;
        huge_s.s = [0xff; 32];
        assert!(!verifier.verify_digest(&d, &huge_s, &signer.public_key()).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(5), domain.clone()).unwrap();
        let other = FieldEcdsaSigner::new(&key(6), domain.clone()).unwrap();
        let verifier = FieldEcdsaVerifier::new(domain);
        let d = digest(5);
        let signature = signer.sign_digest(&d).unwrap();
        assert!(!verifier.verify_digest(&d, &signature, &other.public_key()).unwrap());
    }

    #[test]
    fn test_rejects_zero_and_out_of_range_keys() {
        let domain = domain();
        assert!(matches!(
            FieldEcdsaSigner::new(&[0u8; 32], domain.clone()),
            Err(CryptoError::InvalidSignatureInput(_))
        ));
        assert!(matches!(
            FieldEcdsaSigner::new(&order_be_bytes(), domain.clone()),
            Err(CryptoError::InvalidSignatureInput(_))
        ));
        assert!(matches!(
            FieldEcdsaSigner::new(&[1u8; 16], domain),
            Err(CryptoError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_public_key() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(5), domain.clone()).unwrap();
        let verifier = FieldEcdsaVerifier::new(domain);
        let d = digest(5);
        let signature = signer.sign_digest(&d).unwrap();

        let short = PublicKey {
            backend: SignatureBackend::FieldEcdsa,
            bytes: vec![0u8; 10],
        };
        assert!(matches!(
            verifier.verify_digest(&d, &signature, &short),
            Err(CryptoError::Malformed(_))
        ));

        let mut off_curve = signer.public_key();
        off_curve.bytes[63] ^= 0x01;
        assert!(matches!(
            verifier.verify_digest(&d, &signature, &off_curve),
            Err(CryptoError::InvalidSignatureInput(_))
        ));
    }

    #[test]
    fn test_public_key_round_trip() {
        let domain = domain();
        let signer = FieldEcdsaSigner::new(&key(11), domain.clone()).unwrap();
        let decoded = decode_public_point(&signer.public_key().bytes, &domain).unwrap();
        assert_eq!(decoded, *signer.public_point());
    }
}
