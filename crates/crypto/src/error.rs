//! Error types for attestation signing and verification.

use thiserror::Error;

/// Result type for crypto operations
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Error types for attestation signing and verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Zero or out-of-range private key, or a public key that is not a
    /// valid curve point
    #[error("Invalid signature input: {0}")]
    InvalidSignatureInput(String),

    /// Malformed or inconsistent curve constants
    #[error("Domain parameter error: {0}")]
    DomainParameter(String),

    /// Deterministic signing hit `k == 0`, `r == 0` or `s == 0`
    #[error("Degenerate signature: {0}")]
    DegenerateSignature(String),

    /// Wrong-length or otherwise unparseable byte input
    #[error("Malformed input: {0}")]
    Malformed(String),
}

impl From<credroot_core::CoreError> for CryptoError {
    fn from(err: credroot_core::CoreError) -> Self {
        CryptoError::Malformed(err.to_string())
    }
}
