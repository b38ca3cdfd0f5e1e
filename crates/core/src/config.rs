//! Configuration management for Credroot.
//!
//! One TOML document configures the whole pipeline:
//!
//! ```toml
//! [merkle]
//! render_digits = 8
//!
//! [merkle.hash_domain]
//! mode = "untagged"
//!
//! [merkle.padding]
//! mode = "duplicate_last"
//!
//! [signing]
//! backend = "field_ecdsa"
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use crate::error::{CoreError, Result};
use crate::field::HashDomain;
use crate::merkle::{PaddingMode, DEFAULT_RENDER_DIGITS};
use serde::{Deserialize, Serialize};
#[cfg(feature = "toml")]
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitmentConfig {
    pub merkle: MerkleConfig,
    pub signing: SigningConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerkleConfig {
    /// Hex digits per element in tree renderings.
    pub render_digits: usize,
    pub hash_domain: HashDomain,
    pub padding: PaddingMode,
}

impl Default for MerkleConfig {
    fn default() -> Self {
        Self {
            render_digits: DEFAULT_RENDER_DIGITS,
            hash_domain: HashDomain::Untagged,
            padding: PaddingMode::DuplicateLast,
        }
    }
}

/// Which signature scheme attests to commitment roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureBackend {
    /// ECDSA over the twisted Edwards curve whose base field is the hash field.
    #[default]
    FieldEcdsa,
    /// Conventional ECDSA over NIST P-256.
    P256Ecdsa,
}

impl SignatureBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureBackend::FieldEcdsa => "field_ecdsa",
            SignatureBackend::P256Ecdsa => "p256_ecdsa",
        }
    }
}

impl std::fmt::Display for SignatureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub backend: SignatureBackend,
    /// Curve constants for the field-native backend. Compiled-in Baby
    /// Jubjub parameters are used when absent.
    pub domain: Option<DomainParametersConfig>,
}

/// Curve domain parameters as decimal or `0x`-prefixed hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainParametersConfig {
    pub field_prime: String,
    pub coeff_a: String,
    pub coeff_d: String,
    pub generator: PointConfig,
    pub subgroup_order: String,
    pub cofactor: String,
    /// `base_points[i] = 2^i * generator`. Recomputed when empty.
    #[serde(default)]
    pub base_points: Vec<PointConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointConfig {
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl CommitmentConfig {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Structural checks that do not need the curve arithmetic.
    pub fn validate(&self) -> Result<()> {
        self.merkle.hash_domain.validate()?;

        if !(1..=64).contains(&self.merkle.render_digits) {
            return Err(CoreError::Config(format!(
                "render_digits must be between 1 and 64, got {}",
                self.merkle.render_digits
            )));
        }

        if self.signing.backend == SignatureBackend::P256Ecdsa && self.signing.domain.is_some() {
            return Err(CoreError::Config(
                "curve domain parameters only apply to the field_ecdsa backend".to_string(),
            ));
        }

        Ok(())
    }

    /// Loads `path` when one is given, otherwise returns the defaults.
    #[cfg(feature = "toml")]
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().is_file() => Self::from_file(path),
            Some(path) => Err(CoreError::Config(format!(
                "config file not found: {}",
                path.as_ref().display()
            ))),
            None => Ok(Self::default()),
        }
    }
}
