//! NIST P-256 ECDSA backend.
//!
//! Signs the same 32-byte root digest as the field-native backend, using
//! RFC 6979 deterministic nonces. Public keys are compressed SEC1 points.

use crate::digest::RootDigest;
use crate::error::{CryptoError, CryptoResult};
use crate::signer::{AttestationSignature, PublicKey, RootSigner, RootVerifier, SCALAR_BYTES};
use credroot_core::SignatureBackend;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use tracing::{debug, warn};

pub struct P256Signer {
    signing_key: SigningKey,
}

impl P256Signer {
    /// Rejects keys that are not 32 bytes or not in `[1, n-1]`.
    pub fn new(private_key: &[u8]) -> CryptoResult<Self> {
        if private_key.len() != SCALAR_BYTES {
            return Err(CryptoError::Malformed(format!(
                "private key must be {} bytes, got {}",
                SCALAR_BYTES,
                private_key.len()
            )));
        }
        let signing_key = SigningKey::from_slice(private_key).map_err(|_| {
            CryptoError::InvalidSignatureInput("private key is zero or out of range".to_string())
        })?;
        Ok(Self { signing_key })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl std::fmt::Debug for P256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P256Signer")
            .field("public_key_id", &self.public_key().key_id())
            .finish_non_exhaustive()
    }
}

impl RootSigner for P256Signer {
    fn backend(&self) -> SignatureBackend {
        SignatureBackend::P256Ecdsa
    }

    fn public_key(&self) -> PublicKey {
        PublicKey {
            backend: SignatureBackend::P256Ecdsa,
            bytes: self
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
        }
    }

    fn sign_digest(&self, digest: &RootDigest) -> CryptoResult<AttestationSignature> {
        let signature: Signature = self
            .signing_key
            .try_sign(digest.as_bytes())
            .map_err(|e| CryptoError::DegenerateSignature(e.to_string()))?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; SCALAR_BYTES];
        let mut s = [0u8; SCALAR_BYTES];
        r.copy_from_slice(&bytes[..SCALAR_BYTES]);
        s.copy_from_slice(&bytes[SCALAR_BYTES..]);

        debug!(digest = ?digest, "Root digest signed (p256_ecdsa)");
        Ok(AttestationSignature {
            backend: SignatureBackend::P256Ecdsa,
            r,
            s,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct P256Verifier;

impl RootVerifier for P256Verifier {
    fn backend(&self) -> SignatureBackend {
        SignatureBackend::P256Ecdsa
    }

    fn verify_digest(
        &self,
        digest: &RootDigest,
        signature: &AttestationSignature,
        public_key: &PublicKey,
    ) -> CryptoResult<bool> {
        let verifying_key = VerifyingKey::from_sec1_bytes(&public_key.bytes).map_err(|_| {
            CryptoError::InvalidSignatureInput("public key is not a P-256 point".to_string())
        })?;

        let signature = match Signature::from_slice(&signature.to_bytes()) {
            Ok(signature) => signature,
            Err(_) => {
                warn!("Signature component outside [1, n-1]");
                return Ok(false);
            }
        };

        Ok(verifying_key.verify(digest.as_bytes(), &signature).is_ok())
    }
}
