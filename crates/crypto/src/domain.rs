//! Curve domain parameters for the field-native signature backend.
//!
//! The curve is Baby Jubjub in twisted Edwards form, whose base field is the
//! BN254 scalar field used by the Merkle hash. A [`DomainParameters`] value is
//! validated once at startup and then shared read-only (behind an `Arc`)
//! between every signer and verifier; there is no global state.
//!
//! Parameters loaded from configuration must agree with the compiled-in field
//! arithmetic. Anything inconsistent is a [`CryptoError::DomainParameter`]
//! and no signer can be built from it.

use crate::error::{CryptoError, CryptoResult};
use ark_ec::twisted_edwards::TECurveConfig;
use ark_ec::{AffineRepr, CurveConfig, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, EdwardsConfig, EdwardsProjective, Fq, Fr};
use ark_ff::{BigInteger, PrimeField, Zero};
use credroot_core::{parse_u256, DomainParametersConfig, FieldElement, PointConfig};
use tracing::{error, info};

/// Validated, immutable curve constants plus the fixed-base table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainParameters {
    generator: EdwardsAffine,
    /// `base_points[i] = 2^i * generator`, one entry per scalar bit.
    base_points: Vec<EdwardsAffine>,
}

fn domain_err(msg: impl Into<String>) -> CryptoError {
    let msg = msg.into();
    error!("DomainParameters :: REJECTED :: {}", msg);
    CryptoError::DomainParameter(msg)
}

fn modulus_bytes<B: BigInteger>(modulus: &B) -> [u8; 32] {
    let bytes = modulus.to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

fn limbs_be(limbs: &[u64]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, limb) in limbs.iter().take(4).enumerate() {
        let end = 32 - i * 8;
        out[end - 8..end].copy_from_slice(&limb.to_be_bytes());
    }
    out
}

fn parse_integer(value: &str, what: &str) -> CryptoResult<[u8; 32]> {
    parse_u256(value).map_err(|e| domain_err(format!("{}: {}", what, e)))
}

fn parse_base_field(value: &str, what: &str) -> CryptoResult<Fq> {
    let bytes = parse_integer(value, what)?;
    let element = FieldElement::from_be_bytes(&bytes)
        .map_err(|e| domain_err(format!("{}: {}", what, e)))?;
    Ok(*element.as_fr())
}

fn parse_point(point: &PointConfig, what: &str) -> CryptoResult<EdwardsAffine> {
    let x = parse_base_field(&point.x, what)?;
    let y = parse_base_field(&point.y, what)?;
    let point = EdwardsAffine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(domain_err(format!("{} is not on the curve", what)));
    }
    Ok(point)
}

fn point_config(point: &EdwardsAffine) -> PointConfig {
    PointConfig {
        x: format!("0x{}", FieldElement::from_fr(point.x).to_hex()),
        y: format!("0x{}", FieldElement::from_fr(point.y).to_hex()),
    }
}

fn doubling_table(generator: EdwardsAffine) -> Vec<EdwardsAffine> {
    let bits = Fr::MODULUS_BIT_SIZE as usize;
    let mut table = Vec::with_capacity(bits);
    let mut current = generator;
    for _ in 0..bits {
        table.push(current);
        current = (EdwardsProjective::from(current) + current).into_affine();
    }
    table
}

impl DomainParameters {
    /// The compiled-in Baby Jubjub parameters.
    pub fn baby_jubjub() -> CryptoResult<Self> {
        let generator = EdwardsAffine::generator();
        let generator = if generator.is_in_correct_subgroup_assuming_on_curve() {
            generator
        } else {
            generator.clear_cofactor()
        };
        Self::from_generator(generator)
    }

    /// Builds parameters around `generator`, which must generate the
    /// prime-order subgroup.
    pub fn from_generator(generator: EdwardsAffine) -> CryptoResult<Self> {
        Self::validate_generator(&generator)?;
        Ok(Self::assemble(generator, doubling_table(generator)))
    }

    fn assemble(generator: EdwardsAffine, base_points: Vec<EdwardsAffine>) -> Self {
        info!(
            scalar_bits = base_points.len(),
            "STATUS: DomainParameters :: Baby Jubjub :: VALIDATED"
        );
        Self {
            generator,
            base_points,
        }
    }

    /// Loads and validates parameters from configuration.
    pub fn from_config(config: &DomainParametersConfig) -> CryptoResult<Self> {
        if parse_integer(&config.field_prime, "field_prime")? != modulus_bytes(&Fq::MODULUS) {
            return Err(domain_err("field_prime does not match the hash field"));
        }
        if parse_integer(&config.subgroup_order, "subgroup_order")? != modulus_bytes(&Fr::MODULUS)
        {
            return Err(domain_err("subgroup_order does not match the scalar field"));
        }
        if parse_integer(&config.cofactor, "cofactor")? != limbs_be(EdwardsConfig::COFACTOR) {
            return Err(domain_err("cofactor does not match the curve"));
        }
        if parse_base_field(&config.coeff_a, "coeff_a")? != EdwardsConfig::COEFF_A {
            return Err(domain_err("coeff_a does not match the curve"));
        }
        if parse_base_field(&config.coeff_d, "coeff_d")? != EdwardsConfig::COEFF_D {
            return Err(domain_err("coeff_d does not match the curve"));
        }

        let generator = parse_point(&config.generator, "generator")?;
        Self::validate_generator(&generator)?;
        let table = doubling_table(generator);

        if !config.base_points.is_empty() {
            if config.base_points.len() != table.len() {
                return Err(domain_err(format!(
                    "expected {} base points, got {}",
                    table.len(),
                    config.base_points.len()
                )));
            }
            for (i, (configured, expected)) in config.base_points.iter().zip(&table).enumerate() {
                let point = parse_point(configured, "base point")?;
                if &point != expected {
                    return Err(domain_err(format!("base point {} is not 2^{} * G", i, i)));
                }
            }
        }

        Ok(Self::assemble(generator, table))
    }

    /// Compiled-in parameters unless a configuration is supplied.
    pub fn load(config: Option<&DomainParametersConfig>) -> CryptoResult<Self> {
        match config {
            Some(config) => Self::from_config(config),
            None => Self::baby_jubjub(),
        }
    }

    /// Serializable form, including the full base-point table.
    pub fn to_config(&self) -> DomainParametersConfig {
        DomainParametersConfig {
            field_prime: format!("0x{}", hex::encode(modulus_bytes(&Fq::MODULUS))),
            coeff_a: format!("0x{}", FieldElement::from_fr(EdwardsConfig::COEFF_A).to_hex()),
            coeff_d: format!("0x{}", FieldElement::from_fr(EdwardsConfig::COEFF_D).to_hex()),
            generator: point_config(&self.generator),
            subgroup_order: format!("0x{}", hex::encode(modulus_bytes(&Fr::MODULUS))),
            cofactor: format!("0x{}", hex::encode(limbs_be(EdwardsConfig::COFACTOR))),
            base_points: self.base_points.iter().map(point_config).collect(),
        }
    }

    fn validate_generator(generator: &EdwardsAffine) -> CryptoResult<()> {
        if !generator.is_on_curve() {
            return Err(domain_err("generator is not on the curve"));
        }
        if AffineRepr::is_zero(generator) {
            return Err(domain_err("generator is the identity"));
        }
        if !generator.is_in_correct_subgroup_assuming_on_curve() {
            return Err(domain_err("generator is outside the prime-order subgroup"));
        }
        if !generator.mul_bigint(Fr::MODULUS).is_zero() {
            return Err(domain_err("subgroup_order * generator is not the identity"));
        }
        Ok(())
    }

    pub fn generator(&self) -> &EdwardsAffine {
        &self.generator
    }

    pub fn base_points(&self) -> &[EdwardsAffine] {
        &self.base_points
    }

    pub fn scalar_bits(&self) -> usize {
        self.base_points.len()
    }

    /// `scalar * G` using the precomputed doubling table.
    pub fn mul_generator(&self, scalar: &Fr) -> EdwardsProjective {
        let bits = scalar.into_bigint();
        let mut acc = EdwardsProjective::zero();
        for (i, point) in self.base_points.iter().enumerate() {
            if bits.get_bit(i) {
                acc += point;
            }
        }
        acc
    }

    /// Checks that `point` may serve as a public key under these parameters.
    pub fn validate_public_point(&self, point: &EdwardsAffine) -> CryptoResult<()> {
        if !point.is_on_curve() {
            return Err(CryptoError::InvalidSignatureInput(
                "public key is not on the curve".to_string(),
            ));
        }
        if AffineRepr::is_zero(point) {
            return Err(CryptoError::InvalidSignatureInput(
                "public key is the identity".to_string(),
            ));
        }
        if !point.is_in_correct_subgroup_assuming_on_curve() {
            return Err(CryptoError::InvalidSignatureInput(
                "public key is outside the prime-order subgroup".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;

    #[test]
    fn test_baby_jubjub_validates() {
        let params = DomainParameters::baby_jubjub().unwrap();
        assert_eq!(params.scalar_bits(), 251);
        assert_eq!(params.base_points()[0], *params.generator());
    }

    #[test]
    fn test_fixed_base_matches_generic_multiplication() {
        let params = DomainParameters::baby_jubjub().unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..8 {
            let k = Fr::rand(&mut rng);
            let expected = (*params.generator() * k).into_affine();
            assert_eq!(params.mul_generator(&k).into_affine(), expected);
        }
        assert!(params.mul_generator(&Fr::zero()).is_zero());
    }

    #[test]
    fn test_config_round_trip() {
        let params = DomainParameters::baby_jubjub().unwrap();
        let config = params.to_config();
        assert_eq!(DomainParameters::from_config(&config).unwrap(), params);

        let mut without_table = config.clone();
        without_table.base_points.clear();
        assert_eq!(DomainParameters::from_config(&without_table).unwrap(), params);
    }

    #[test]
    fn test_rejects_wrong_prime() {
        let mut config = DomainParameters::baby_jubjub().unwrap().to_config();
        config.field_prime = "0x07".to_string();
        assert!(matches!(
            DomainParameters::from_config(&config),
            Err(CryptoError::DomainParameter(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_coefficient() {
        let mut config = DomainParameters::baby_jubjub().unwrap().to_config();
        config.coeff_d = "3".to_string();
        assert!(matches!(
            DomainParameters::from_config(&config),
            Err(CryptoError::DomainParameter(_))
        ));
    }

    #[test]
    fn test_rejects_off_curve_generator() {
        let mut config = DomainParameters::baby_jubjub().unwrap().to_config();
        config.generator.x = "5".to_string();
        assert!(matches!(
            DomainParameters::from_config(&config),
            Err(CryptoError::DomainParameter(_))
        ));
    }

    #[test]
    fn test_rejects_tampered_table() {
        let mut config = DomainParameters::baby_jubjub().unwrap().to_config();
        config.base_points.swap(3, 4);
        assert!(matches!(
            DomainParameters::from_config(&config),
            Err(CryptoError::DomainParameter(_))
        ));

        let mut short = DomainParameters::baby_jubjub().unwrap().to_config();
        short.base_points.truncate(10);
        assert!(DomainParameters::from_config(&short).is_err());
    }

    #[test]
    fn test_rejects_identity_generator() {
        assert!(DomainParameters::from_generator(<EdwardsAffine as AffineRepr>::zero()).is_err());
    }

    #[test]
    fn test_rejects_garbage_strings() {
        let mut config = DomainParameters::baby_jubjub().unwrap().to_config();
        config.subgroup_order = "not a number".to_string();
        assert!(DomainParameters::from_config(&config).is_err());
    }
}
