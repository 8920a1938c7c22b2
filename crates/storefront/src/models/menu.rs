//! Menu domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forkful_core::{MenuItemId, Money};

use crate::validation::{ValidationError, optional_text, required_text};

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: Option<String>,
    /// Price in pence.
    pub price: Money,
    pub category: String,
    pub image_url: Option<String>,
    /// Unavailable dishes stay listed for history but cannot be ordered.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A dish to insert, as read from a seed file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in pence.
    pub price: Money,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

impl NewMenuItem {
    /// Trim and check every field, returning the normalized item.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let name = required_text("name", &self.name, 100)?;
        let category = required_text("category", &self.category, 50)?;
        let description = optional_text("description", self.description.as_deref(), 1000)?;
        let image_url = optional_text("image_url", self.image_url.as_deref(), 2048)?;

        if self.price.minor() <= 0 {
            return Err(ValidationError::new("price", "price must be greater than zero"));
        }

        if let Some(ref raw) = image_url {
            url::Url::parse(raw)
                .map_err(|_| ValidationError::new("image_url", "image_url must be a valid URL"))?;
        }

        Ok(Self {
            name,
            description,
            price: self.price,
            category,
            image_url,
            available: self.available,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item() -> NewMenuItem {
        NewMenuItem {
            name: "  Chicken Katsu ".to_owned(),
            description: Some(" ".to_owned()),
            price: Money::from_minor(1195),
            category: "Mains".to_owned(),
            image_url: None,
            available: true,
        }
    }

    #[test]
    fn test_validated_trims() {
        let valid = item().validated().unwrap();
        assert_eq!(valid.name, "Chicken Katsu");
        assert_eq!(valid.description, None);
    }

    #[test]
    fn test_validated_rejects_bad_price_and_url() {
        let mut free = item();
        free.price = Money::ZERO;
        assert_eq!(free.validated().unwrap_err().field, "price");

        let mut bad_url = item();
        bad_url.image_url = Some("not a url".to_owned());
        assert_eq!(bad_url.validated().unwrap_err().field, "image_url");
    }

    #[test]
    fn test_available_defaults_to_true() {
        let parsed: NewMenuItem =
            serde_json::from_str(r#"{"name":"Gyoza","price":550,"category":"Sides"}"#).unwrap();
        assert!(parsed.available);
        assert_eq!(parsed.price, Money::from_minor(550));
    }
}
