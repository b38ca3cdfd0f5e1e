//! Attestation signatures over Merkle commitment roots.
//!
//! An issuer signs the 32-byte big-endian encoding of a commitment root
//! ([`RootDigest`]) so that holders and verifiers can confirm the root came
//! from them. Two ECDSA backends are available behind one interface:
//!
//! - **field_ecdsa**: ECDSA over Baby Jubjub, whose coordinates live in the
//!   same field as the Merkle hash. Nonces are derived deterministically
//!   from the key and digest with keyed BLAKE3.
//! - **p256_ecdsa**: NIST P-256 with RFC 6979 nonces.
//!
//! # Security Principles
//!
//! - Private keys are zeroized on drop and never logged
//! - Verification returns `Ok(false)` for signatures that do not verify and
//!   reserves errors for structurally invalid inputs
//! - Curve constants loaded from configuration are checked against the
//!   compiled-in arithmetic before any signer is built

pub mod digest;
pub mod domain;
pub mod error;
pub mod field_ecdsa;
pub mod p256_ecdsa;
pub mod signer;

#[cfg(test)]
mod test_vectors;

pub use digest::RootDigest;
pub use domain::DomainParameters;
pub use error::{CryptoError, CryptoResult};
pub use field_ecdsa::{FieldEcdsaSigner, FieldEcdsaVerifier, PUBLIC_KEY_BYTES};
pub use p256_ecdsa::{P256Signer, P256Verifier};
pub use signer::{
    derive_public_key, generate_private_key, AttestationSignature, AttestationSigner,
    AttestationVerifier, PublicKey, RootSigner, RootVerifier, SCALAR_BYTES,
};
