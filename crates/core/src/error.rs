//! Core error types

use thiserror::Error;

/// Core error type for Credroot
#[derive(Debug, Error)]
pub enum CoreError {
    /// Attribute value cannot be mapped onto a field element
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Commitment requested over zero attributes
    #[error("Empty input: a commitment needs at least one attribute")]
    EmptyInput,

    /// Proof requested for a leaf the tree does not contain
    #[error("Index out of range: {index} (leaf count {leaf_count})")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    /// Poseidon permutation failure
    #[error("Hash error: {0}")]
    Hash(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
