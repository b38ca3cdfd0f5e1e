//! Identity attribute commitments with signed roots.
//!
//! An issuer commits to an ordered bundle of identity attributes with a
//! Poseidon Merkle tree and signs the root. A holder can later reveal a
//! single attribute together with a decommitment path; anyone holding the
//! issuer's public key can check both the path and the signature without
//! seeing the other attributes.
//!
//! # Core Concepts
//!
//! - **Attribute bundle**: ordered, name-unique attributes to commit to
//! - **Commitment**: the Merkle tree over the bundle and its root
//! - **Attestation**: an ECDSA signature over the 32-byte root
//! - **Inclusion proof**: leaf hash, siblings, index and root for one attribute
//!
//! # Example
//!
//! ```no_run
//! use credroot_identity::{AttributeBundle, CommitmentService};
//! use credroot_crypto::generate_private_key;
//! use credroot_core::{AttributeValue, SignatureBackend};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = CommitmentService::with_defaults()?;
//! let bundle = AttributeBundle::new()
//!     .with("first_name", "Alice")?
//!     .with("nationality", "Swiss")?;
//!
//! let key = generate_private_key(SignatureBackend::FieldEcdsa, &mut rand::thread_rng());
//! let receipt = service.issue(&bundle, key.as_ref())?;
//!
//! let proof = service.prove_attribute(&receipt.commitment, "nationality")?;
//! assert!(service.verify_proof(&AttributeValue::from("Swiss"), &proof)?);
//! assert!(service.verify_attestation(&receipt.attestation)?);
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod commitment;
pub mod error;

pub use attribute::{Attribute, AttributeBundle, IdentityRecord, IDENTITY_ATTRIBUTES};
pub use commitment::{
    verify_inclusion, verify_inclusion_in, verify_signature, Attestation, Commitment,
    CommitmentReceipt, CommitmentService,
};
pub use error::{IdentityError, IdentityResult};
