//! Attribute bundles and the identity record form.
//!
//! A bundle is the ordered list of named values an issuer commits to. Order
//! is significant: the same values in a different order give a different
//! root. Names are unique within a bundle so a holder can ask for a proof by
//! name.

use crate::error::{IdentityError, IdentityResult};
use credroot_core::{leaf_hash, AttributeValue, FieldElement};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// One named value in a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            AttributeValue::Text(s) => write!(f, "{}: {}", self.name, s),
            AttributeValue::Integer(n) => write!(f, "{}: {}", self.name, n),
            AttributeValue::Bytes(b) => write!(f, "{}: 0x{}", self.name, hex::encode(b)),
            AttributeValue::Field(e) => write!(f, "{}: {}", self.name, e),
        }
    }
}

/// Ordered, name-unique sequence of attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Attribute>", into = "Vec<Attribute>")]
pub struct AttributeBundle {
    attributes: Vec<Attribute>,
}

impl AttributeBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute, rejecting a name already in the bundle.
    pub fn push(&mut self, attribute: Attribute) -> IdentityResult<()> {
        if self.index_of(&attribute.name).is_some() {
            warn!(name = %attribute.name, "Rejected duplicate attribute");
            return Err(IdentityError::DuplicateAttribute {
                name: attribute.name,
            });
        }
        self.attributes.push(attribute);
        Ok(())
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> IdentityResult<Self> {
        self.push(Attribute::new(name, value))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn names(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.name.clone()).collect()
    }

    pub fn values(&self) -> Vec<AttributeValue> {
        self.attributes.iter().map(|a| a.value.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }
}

impl TryFrom<Vec<Attribute>> for AttributeBundle {
    type Error = IdentityError;

    fn try_from(attributes: Vec<Attribute>) -> IdentityResult<Self> {
        let mut bundle = Self::new();
        for attribute in attributes {
            bundle.push(attribute)?;
        }
        Ok(bundle)
    }
}

impl From<AttributeBundle> for Vec<Attribute> {
    fn from(bundle: AttributeBundle) -> Self {
        bundle.attributes
    }
}

impl fmt::Display for AttributeBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attribute in &self.attributes {
            writeln!(f, "{}", attribute)?;
        }
        Ok(())
    }
}

/// Attribute names used by [`IdentityRecord::to_bundle`], in commitment order.
pub const IDENTITY_ATTRIBUTES: [&str; 8] = [
    "wallet_address",
    "id_number_hash",
    "first_name",
    "last_name",
    "date_of_birth",
    "nationality",
    "favorite_color",
    "favorite_animal",
];

/// The identity form an issuer collects from a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub first_name: String,
    pub last_name: String,
    /// Decimal or `0x` hex; committed only as its leaf hash.
    pub id_number: String,
    /// ISO 8601 calendar date, `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub nationality: String,
    /// Decimal or `0x` hex field element.
    pub wallet_address: String,
    pub favorite_color: String,
    pub favorite_animal: String,
}

fn parse_field(value: &str, what: &str) -> IdentityResult<FieldElement> {
    FieldElement::from_decimal_str(value)
        .map_err(|e| IdentityError::InvalidRecord(format!("{}: {}", what, e)))
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Checks `YYYY-MM-DD` shape and that the day exists in that month.
fn validate_iso_date(value: &str) -> IdentityResult<()> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(IdentityError::InvalidRecord(format!(
            "date_of_birth must be YYYY-MM-DD, got {:?}",
            value
        )));
    }
    let year: u32 = value[..4].parse().unwrap_or(0);
    let month: u32 = value[5..7].parse().unwrap_or(0);
    let day: u32 = value[8..10].parse().unwrap_or(0);
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return Err(IdentityError::InvalidRecord(format!(
            "date_of_birth out of range: {}",
            value
        )));
    }
    Ok(())
}

impl IdentityRecord {
    /// `leaf_hash(id_number)`: the only form in which the ID is committed.
    pub fn id_number_hash(&self) -> IdentityResult<FieldElement> {
        let id = parse_field(&self.id_number, "id_number")?;
        Ok(leaf_hash(&AttributeValue::Field(id))?)
    }

    /// Maps the form onto the committed bundle, ordered as
    /// [`IDENTITY_ATTRIBUTES`].
    pub fn to_bundle(&self) -> IdentityResult<AttributeBundle> {
        validate_iso_date(&self.date_of_birth)?;
        let wallet = parse_field(&self.wallet_address, "wallet_address")?;

        AttributeBundle::new()
            .with(IDENTITY_ATTRIBUTES[0], wallet)?
            .with(IDENTITY_ATTRIBUTES[1], self.id_number_hash()?)?
            .with(IDENTITY_ATTRIBUTES[2], self.first_name.as_str())?
            .with(IDENTITY_ATTRIBUTES[3], self.last_name.as_str())?
            .with(IDENTITY_ATTRIBUTES[4], self.date_of_birth.as_str())?
            .with(IDENTITY_ATTRIBUTES[5], self.nationality.as_str())?
            .with(IDENTITY_ATTRIBUTES[6], self.favorite_color.as_str())?
            .with(IDENTITY_ATTRIBUTES[7], self.favorite_animal.as_str())
    }

    /// Human-readable form echo, including the hashed ID.
    pub fn summary(&self) -> IdentityResult<String> {
        Ok(format!(
            "Name: {} {}, ID: {}, DOB: {}, Nationality: {}\n\
             Wallet Address: {}\n\
             Favorite Color: {}, Favorite Animal: {}\n\
             Hashed ID: {}\n",
            self.first_name,
            self.last_name,
            self.id_number,
            self.date_of_birth,
            self.nationality,
            self.wallet_address,
            self.favorite_color,
            self.favorite_animal,
            self.id_number_hash()?,
        ))
    }
}
