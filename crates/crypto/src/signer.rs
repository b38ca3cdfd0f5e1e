//! Backend-neutral attestation signing interface.
//!
//! Callers hold an [`AttestationSigner`] or [`AttestationVerifier`] chosen by
//! the configured [`SignatureBackend`]; both backends sign the same
//! [`RootDigest`] and emit the same `(r, s)` shape.

use crate::digest::RootDigest;
use crate::domain::DomainParameters;
use crate::error::{CryptoError, CryptoResult};
use crate::field_ecdsa::{scalar_to_be_bytes, FieldEcdsaSigner, FieldEcdsaVerifier};
use crate::p256_ecdsa::{P256Signer, P256Verifier};
use ark_ed_on_bn254::Fr;
use ark_ff::{UniformRand, Zero};
use credroot_core::{FieldElement, SignatureBackend, SigningConfig};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Width of each signature component and of a private key.
pub const SCALAR_BYTES: usize = 32;

/// An ECDSA signature over a root digest.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationSignature {
    pub backend: SignatureBackend,
    #[serde(with = "hex::serde")]
    pub r: [u8; SCALAR_BYTES],
    #[serde(with = "hex::serde")]
    pub s: [u8; SCALAR_BYTES],
}

impl AttestationSignature {
    /// `r || s`, 64 bytes.
    pub fn to_bytes(&self) -> [u8; 2 * SCALAR_BYTES] {
        let mut out = [0u8; 2 * SCALAR_BYTES];
        out[..SCALAR_BYTES].copy_from_slice(&self.r);
        out[SCALAR_BYTES..].copy_from_slice(&self.s);
        out
    }

    pub fn from_bytes(backend: SignatureBackend, bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != 2 * SCALAR_BYTES {
            return Err(CryptoError::Malformed(format!(
                "signature must be {} bytes, got {}",
                2 * SCALAR_BYTES,
                bytes.len()
            )));
        }
        let mut r = [0u8; SCALAR_BYTES];
        let mut s = [0u8; SCALAR_BYTES];
        r.copy_from_slice(&bytes[..SCALAR_BYTES]);
        s.copy_from_slice(&bytes[SCALAR_BYTES..]);
        Ok(Self { backend, r, s })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(backend: SignatureBackend, s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x"))
            .map_err(|e| CryptoError::Malformed(format!("signature hex: {}", e)))?;
        Self::from_bytes(backend, &bytes)
    }
}

impl fmt::Debug for AttestationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationSignature")
            .field("backend", &self.backend)
            .field("r", &hex::encode(self.r))
            .field("s", &hex::encode(self.s))
            .finish()
    }
}

/// A public key tagged with the backend it belongs to.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    pub backend: SignatureBackend,
    #[serde(with = "hex::serde")]
    pub bytes: Vec<u8>,
}

impl PublicKey {
    /// Stable identifier: first 16 bytes of the BLAKE3 hash, hex encoded.
    pub fn key_id(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.backend.as_str().as_bytes());
        hasher.update(&self.bytes);
        let hash = hasher.finalize();
        hex::encode(&hash.as_bytes()[..16])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn from_hex(backend: SignatureBackend, s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x"))
            .map_err(|e| CryptoError::Malformed(format!("public key hex: {}", e)))?;
        Ok(Self { backend, bytes })
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}:{})", self.backend, self.to_hex())
    }
}

/// Produces signatures over root digests.
pub trait RootSigner {
    fn backend(&self) -> SignatureBackend;

    fn public_key(&self) -> PublicKey;

    fn sign_digest(&self, digest: &RootDigest) -> CryptoResult<AttestationSignature>;

    fn sign_root(&self, root: &FieldElement) -> CryptoResult<AttestationSignature> {
        self.sign_digest(&RootDigest::from_root(root))
    }
}

/// Checks signatures over root digests.
///
/// `Ok(false)` means the signature does not verify; `Err` is reserved for
/// structurally invalid input such as an off-curve public key.
pub trait RootVerifier {
    fn backend(&self) -> SignatureBackend;

    fn verify_digest(
        &self,
        digest: &RootDigest,
        signature: &AttestationSignature,
        public_key: &PublicKey,
    ) -> CryptoResult<bool>;

    fn verify_root(
        &self,
        root: &FieldElement,
        signature: &AttestationSignature,
        public_key: &PublicKey,
    ) -> CryptoResult<bool> {
        self.verify_digest(&RootDigest::from_root(root), signature, public_key)
    }
}

#[derive(Debug)]
pub enum AttestationSigner {
    FieldEcdsa(FieldEcdsaSigner),
    P256(P256Signer),
}

impl AttestationSigner {
    /// `domain` is only consulted by the field-native backend.
    pub fn new(
        backend: SignatureBackend,
        private_key: &[u8],
        domain: Arc<DomainParameters>,
    ) -> CryptoResult<Self> {
        let signer = match backend {
            SignatureBackend::FieldEcdsa => {
                Self::FieldEcdsa(FieldEcdsaSigner::new(private_key, domain)?)
            }
            SignatureBackend::P256Ecdsa => Self::P256(P256Signer::new(private_key)?),
        };
        info!(
            backend = %backend,
            key_id = %signer.public_key().key_id(),
            "STATUS: AttestationSigner :: READY"
        );
        Ok(signer)
    }

    /// Builds a signer for the configured backend. `domain` is the value
    /// already loaded from `config.domain`.
    pub fn from_config(
        config: &SigningConfig,
        private_key: &[u8],
        domain: Arc<DomainParameters>,
    ) -> CryptoResult<Self> {
        Self::new(config.backend, private_key, domain)
    }
}

impl RootSigner for AttestationSigner {
    fn backend(&self) -> SignatureBackend {
        match self {
            Self::FieldEcdsa(s) => s.backend(),
            Self::P256(s) => s.backend(),
        }
    }

    fn public_key(&self) -> PublicKey {
        match self {
            Self::FieldEcdsa(s) => s.public_key(),
            Self::P256(s) => s.public_key(),
        }
    }

    fn sign_digest(&self, digest: &RootDigest) -> CryptoResult<AttestationSignature> {
        match self {
            Self::FieldEcdsa(s) => s.sign_digest(digest),
            Self::P256(s) => s.sign_digest(digest),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AttestationVerifier {
    FieldEcdsa(FieldEcdsaVerifier),
    P256(P256Verifier),
}

impl AttestationVerifier {
    pub fn new(backend: SignatureBackend, domain: Arc<DomainParameters>) -> Self {
        match backend {
            SignatureBackend::FieldEcdsa => Self::FieldEcdsa(FieldEcdsaVerifier::new(domain)),
            SignatureBackend::P256Ecdsa => Self::P256(P256Verifier),
        }
    }
}

impl RootVerifier for AttestationVerifier {
    fn backend(&self) -> SignatureBackend {
        match self {
            Self::FieldEcdsa(v) => v.backend(),
            Self::P256(v) => v.backend(),
        }
    }

    fn verify_digest(
        &self,
        digest: &RootDigest,
        signature: &AttestationSignature,
        public_key: &PublicKey,
    ) -> CryptoResult<bool> {
        let backend = self.backend();
        if signature.backend != backend || public_key.backend != backend {
            warn!(
                verifier = %backend,
                signature = %signature.backend,
                public_key = %public_key.backend,
                "Signature backend mismatch"
            );
            return Ok(false);
        }
        match self {
            Self::FieldEcdsa(v) => v.verify_digest(digest, signature, public_key),
            Self::P256(v) => v.verify_digest(digest, signature, public_key),
        }
    }
}

/// Draws a fresh private key valid for `backend`.
pub fn generate_private_key<R: RngCore + CryptoRng>(
    backend: SignatureBackend,
    rng: &mut R,
) -> Zeroizing<[u8; SCALAR_BYTES]> {
    let mut out = Zeroizing::new([0u8; SCALAR_BYTES]);
    match backend {
        SignatureBackend::FieldEcdsa => {
            let mut scalar = Fr::rand(rng);
            while scalar.is_zero() {
                scalar = Fr::rand(rng);
            }
            out.copy_from_slice(&scalar_to_be_bytes(&scalar));
        }
        SignatureBackend::P256Ecdsa => {
            let secret = p256::SecretKey::random(rng);
            out.copy_from_slice(&secret.to_bytes());
        }
    }
    out
}

/// Derives the public key for `private_key` without keeping a signer.
pub fn derive_public_key(
    backend: SignatureBackend,
    private_key: &[u8],
    domain: Arc<DomainParameters>,
) -> CryptoResult<PublicKey> {
    Ok(AttestationSigner::new(backend, private_key, domain)?.public_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn domain() -> Arc<DomainParameters> {
        Arc::new(DomainParameters::baby_jubjub().unwrap())
    }

    const BACKENDS: [SignatureBackend; 2] =
        [SignatureBackend::FieldEcdsa, SignatureBackend::P256Ecdsa];

    #[test]
    fn test_both_backends_round_trip() {
        let domain = domain();
        let root = FieldElement::from(424242u64);
        for backend in BACKENDS {
            let key = generate_private_key(backend, &mut rand::thread_rng());
            let signer = AttestationSigner::new(backend, key.as_ref(), domain.clone()).unwrap();
            let verifier = AttestationVerifier::new(backend, domain.clone());
            let signature = signer.sign_root(&root).unwrap();
            assert_eq!(signature.backend, backend);
            assert!(verifier
                .verify_root(&root, &signature, &signer.public_key())
                .unwrap());
        }
    }

    #[test]
    fn test_backend_mismatch_is_false() {
        let domain = domain();
        let key = generate_private_key(SignatureBackend::P256Ecdsa, &mut rand::thread_rng());
        let signer =
            AttestationSigner::new(SignatureBackend::P256Ecdsa, key.as_ref(), domain.clone())
                .unwrap();
        let root = FieldElement::from(1u64);
        let signature = signer.sign_root(&root).unwrap();

        let verifier = AttestationVerifier::new(SignatureBackend::FieldEcdsa, domain);
        assert!(!verifier
            .verify_root(&root, &signature, &signer.public_key())
            .unwrap());
    }

    #[test]
    fn test_signer_from_config_follows_backend() {
        let domain = Arc::new(DomainParameters::baby_jubjub().unwrap());
        let config = SigningConfig {
            backend: SignatureBackend::P256Ecdsa,
            ..SigningConfig::default()
        };
        let signer = AttestationSigner::from_config(&config, &[0x07; 32], domain).unwrap();
        assert_eq!(signer.backend(), SignatureBackend::P256Ecdsa);
        assert!(matches!(signer, AttestationSigner::P256(_)));
    }

    #[test]
    fn test_public_key_hex_round_trip() {
        let domain = Arc::new(DomainParameters::baby_jubjub().unwrap());
        let key = derive_public_key(SignatureBackend::FieldEcdsa, &[0x03; 32], domain).unwrap();
        let parsed = PublicKey::from_hex(key.backend, &format!("0x{}", key.to_hex())).unwrap();
        assert_eq!(parsed, key);
        assert_eq!(parsed.key_id(), key.key_id());
        assert!(matches!(
            PublicKey::from_hex(key.backend, "zz"),
            Err(CryptoError::Malformed(_))
        ));
    }

    #[test]
    fn test_signature_bytes_round_trip() {
        let sig = AttestationSignature {
            backend: SignatureBackend::FieldEcdsa,
            r: [0x11; 32],
            s: [0x22; 32],
        };
        let parsed = AttestationSignature::from_hex(sig.backend, &sig.to_hex()).unwrap();
        assert_eq!(parsed, sig);
        assert!(matches!(
            AttestationSignature::from_bytes(sig.backend, &[0u8; 63]),
            Err(CryptoError::Malformed(_))
        ));
    }

    #[test]
    fn test_signature_json_uses_hex() {
        let sig = AttestationSignature {
            backend: SignatureBackend::P256Ecdsa,
            r: [0xab; 32],
            s: [0x01; 32],
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["backend"], "p256_ecdsa");
        assert_eq!(json["r"], hex::encode([0xab; 32]));
        let back: AttestationSignature = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_key_id_is_stable_and_backend_scoped() {
        let a = PublicKey {
            backend: SignatureBackend::FieldEcdsa,
            bytes: vec![1, 2, 3],
        };
        let b = PublicKey {
            backend: SignatureBackend::P256Ecdsa,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(a.key_id(), a.clone().key_id());
        assert_eq!(a.key_id().len(), 32);
        assert_ne!(a.key_id(), b.key_id());
    }

    #[test]
    fn test_derive_public_key_matches_signer() {
        let domain = domain();
        for backend in BACKENDS {
            let key = generate_private_key(backend, &mut rand::thread_rng());
            let derived = derive_public_key(backend, key.as_ref(), domain.clone()).unwrap();
            let signer = AttestationSigner::new(backend, key.as_ref(), domain.clone()).unwrap();
            assert_eq!(derived, signer.public_key());
        }
        assert!(derive_public_key(SignatureBackend::FieldEcdsa, &[0u8; 32], domain).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_field_signatures_verify(seed in 1u64.., value in any::<u128>()) {
            let domain = domain();
            let mut key = [0u8; 32];
            key[24..].copy_from_slice(&seed.to_be_bytes());
            let signer = AttestationSigner::new(SignatureBackend::FieldEcdsa, &key, domain.clone()).unwrap();
            let verifier = AttestationVerifier::new(SignatureBackend::FieldEcdsa, domain);
            let root = FieldElement::from(value);
            let signature = signer.sign_root(&root).unwrap();
            prop_assert!(verifier.verify_root(&root, &signature, &signer.public_key()).unwrap());

            let other = FieldElement::from(value.wrapping_add(1));
            prop_assert!(!verifier.verify_root(&other, &signature, &signer.public_key()).unwrap());
        }
    }
}
