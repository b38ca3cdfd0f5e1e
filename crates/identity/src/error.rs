//! Error types for attribute commitment and attestation.

use credroot_core::CoreError;
use credroot_crypto::CryptoError;
use thiserror::Error;

/// Result type for identity operations
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;

/// Errors that can occur while committing to or attesting identity attributes.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Encoding, hashing, tree and configuration errors
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Key, signature and domain parameter errors
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    /// Attribute name appears twice in one bundle
    #[error("Duplicate attribute: {name}")]
    DuplicateAttribute { name: String },

    /// Attribute name not present in the commitment
    #[error("Attribute not found: {name}")]
    UnknownAttribute { name: String },

    /// Identity record field could not be mapped to an attribute
    #[error("Invalid identity record: {0}")]
    InvalidRecord(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
