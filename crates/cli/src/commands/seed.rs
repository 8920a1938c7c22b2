//! Seed the menu from a YAML file.
//!
//! The file is a list of dishes:
//!
//! ```yaml
//! - name: Margherita
//!   description: Tomato, mozzarella, basil
//!   price: 950
//!   category: Pizza
//! - name: Tiramisu
//!   price: 550
//!   category: Desserts
//!   available: false
//! ```
//!
//! Prices are in pence. The whole file is validated before connecting.

use std::path::Path;

use tracing::{error, info};

use forkful_storefront::db::menu::MenuRepository;
use forkful_storefront::models::NewMenuItem;

use super::{CliError, connect};

/// Parse and validate a menu file's contents.
///
/// # Errors
///
/// Returns `CliError::Yaml` for malformed YAML and `CliError::Invalid` if any
/// dish fails validation; every failure is logged.
pub fn parse_menu(content: &str) -> Result<Vec<NewMenuItem>, CliError> {
    let raw: Vec<NewMenuItem> = serde_yaml::from_str(content)?;

    let mut items = Vec::with_capacity(raw.len());
    let mut failures = 0_usize;
    for (index, item) in raw.into_iter().enumerate() {
        let name = item.name.clone();
        match item.validated() {
            Ok(item) => items.push(item),
            Err(e) => {
                error!("  - dish {} ({name}): {e}", index + 1);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(CliError::Invalid(format!(
            "{failures} validation errors found"
        )));
    }
    if items.is_empty() {
        return Err(CliError::Invalid("menu file contains no dishes".to_owned()));
    }
    Ok(items)
}

/// Insert the dishes in `file_path`, optionally deleting existing ones first.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or a database
/// operation fails.
pub async fn menu(file_path: &str, replace: bool) -> Result<(), CliError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading menu from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let items = parse_menu(&content)?;
    info!(dishes = items.len(), "Menu validated");

    let pool = connect().await?;
    let menu = MenuRepository::new(&pool);

    if replace {
        let removed = menu.delete_all().await?;
        info!(removed, "Removed existing menu items");
    }

    for item in &items {
        let inserted = menu.insert(item).await?;
        info!(id = %inserted.id, name = %inserted.name, "Inserted dish");
    }

    info!("Seeding complete! {} dishes inserted", items.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use forkful_core::Money;

    use super::*;

    #[test]
    fn test_parse_menu() {
        let items = parse_menu(
            r"
- name: '  Margherita '
  description: Tomato, mozzarella, basil
  price: 950
  category: Pizza
- name: Tiramisu
  price: 550
  category: Desserts
  available: false
",
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Margherita");
        assert_eq!(items[0].price, Money::from_minor(950));
        assert!(items[0].available);
        assert!(!items[1].available);
        assert_eq!(items[1].description, None);
    }

    #[test]
    fn test_rejects_invalid_dish() {
        let err = parse_menu(
            r"
- name: Free Lunch
  price: 0
  category: Mains
",
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Invalid(_)));
    }

    #[test]
    fn test_rejects_missing_field() {
        let err = parse_menu("- name: Soup\n  price: 400\n").unwrap_err();
        assert!(matches!(err, CliError::Yaml(_)));
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = parse_menu("[]").unwrap_err();
        assert!(matches!(err, CliError::Invalid(_)));
    }
}
