//! Core functionality for Credroot attribute commitments.
//!
//! This crate provides the field hash primitive and the Merkle commitment
//! engine built on it, together with the configuration, error and logging
//! types shared by the rest of the workspace.
//!
//! # Core Capabilities
//!
//! - **Field encoding**: attribute values to BN254 scalar field elements
//! - **Poseidon compression**: the order-sensitive `combine` used at every level
//! - **Merkle trees**: construction, decommitment paths and proof verification

pub mod config;
pub mod error;
pub mod field;
pub mod logging;
pub mod merkle;

pub use config::{
    CommitmentConfig, DomainParametersConfig, LoggingConfig, MerkleConfig, PointConfig,
    SignatureBackend, SigningConfig,
};
pub use error::{CoreError, Result};
pub use field::{
    combine, combine_tagged, encode, leaf_hash, parse_u256, AttributeValue, FieldElement, HashDomain,
    FIELD_ELEMENT_BYTES, FIELD_PRIME_DECIMAL,
};
pub use merkle::{
    pair_level, ConstantPadding, DuplicateLast, InclusionProof, MerkleTree, PaddingMode,
    PairingPolicy, DEFAULT_RENDER_DIGITS,
};
