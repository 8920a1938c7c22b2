//! Delivery address types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forkful_core::{AddressId, UserId};

use super::order::DeliveryAddress;
use crate::validation::{self, ValidationError, optional_text, required_text};

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(skip)]
    pub user_id: UserId,
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub phone: Option<String>,
    pub instructions: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Copy of the address to store on an order.
    #[must_use]
    pub fn snapshot(&self) -> DeliveryAddress {
        DeliveryAddress {
            label: self.label.clone(),
            line1: self.line1.clone(),
            line2: self.line2.clone(),
            city: self.city.clone(),
            postcode: self.postcode.clone(),
            phone: self.phone.clone(),
            instructions: self.instructions.clone(),
        }
    }
}

/// Address fields submitted by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressInput {
    pub label: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl AddressInput {
    /// Validate every field, returning the normalized input.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(&self) -> Result<Self, ValidationError> {
        let phone = match self.phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(validation::phone(raw)?),
        };

        Ok(Self {
            label: required_text("label", &self.label, 50)?,
            line1: required_text("line1", &self.line1, 200)?,
            line2: optional_text("line2", self.line2.as_deref(), 200)?,
            city: required_text("city", &self.city, 100)?,
            postcode: validation::postcode(&self.postcode)?,
            phone,
            instructions: optional_text("instructions", self.instructions.as_deref(), 500)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            label: "Home".to_owned(),
            line1: "10 Downing Street".to_owned(),
            line2: None,
            city: "London".to_owned(),
            postcode: "sw1a2aa".to_owned(),
            phone: Some("07700 900123".to_owned()),
            instructions: Some("  Ring the bell ".to_owned()),
        }
    }

    #[test]
    fn test_validated_normalizes() {
        let valid = input().validated().unwrap();
        assert_eq!(valid.postcode, "SW1A 2AA");
        assert_eq!(valid.phone.as_deref(), Some("07700900123"));
        assert_eq!(valid.instructions.as_deref(), Some("Ring the bell"));
    }

    #[test]
    fn test_blank_phone_is_none() {
        let mut blank = input();
        blank.phone = Some("  ".to_owned());
        assert_eq!(blank.validated().unwrap().phone, None);
    }

    #[test]
    fn test_field_limits() {
        let mut long_label = input();
        long_label.label = "x".repeat(51);
        assert_eq!(long_label.validated().unwrap_err().field, "label");

        let mut no_line1 = input();
        no_line1.line1 = String::new();
        assert_eq!(no_line1.validated().unwrap_err().field, "line1");

        let mut long_notes = input();
        long_notes.instructions = Some("x".repeat(501));
        assert_eq!(long_notes.validated().unwrap_err().field, "instructions");

        let mut bad_postcode = input();
        bad_postcode.postcode = "90210".to_owned();
        assert_eq!(bad_postcode.validated().unwrap_err().field, "postcode");
    }
}
