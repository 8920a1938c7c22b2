//! Input validation shared by services.
//!
//! Validators trim their input and return the normalized value, so callers
//! store exactly what was checked.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// A rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Name of the offending field, as it appears in request bodies.
    pub field: &'static str,
    /// Customer-facing explanation.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Compact UK postcode: outward code then inward code, no space.
static POSTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,2}[0-9][A-Z0-9]?[0-9][A-Z]{2}$").expect("postcode pattern is valid")
});

/// UK phone number after stripping separators.
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+44[0-9]{9,10}|0[0-9]{9,10})$").expect("phone pattern is valid")
});

/// Trim `value` and require 1..=`max_chars` characters.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the trimmed value is empty or too long.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, format!("{field} is required")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("{field} must be at most {max_chars} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional value; blank becomes `None`.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the value is longer than `max_chars`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => required_text(field, v, max_chars).map(Some),
    }
}

/// Validate and normalize a UK postcode to upper case with a single space.
///
/// `"sw1a1aa"` becomes `"SW1A 1AA"`.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the input is not a UK postcode.
pub fn postcode(value: &str) -> Result<String, ValidationError> {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if !POSTCODE.is_match(&compact) {
        return Err(ValidationError::new(
            "postcode",
            "Enter a valid UK postcode",
        ));
    }

    let (outward, inward) = compact.split_at(compact.len() - 3);
    Ok(format!("{outward} {inward}"))
}

/// Validate and normalize a UK phone number to digits with an optional
/// leading `+`.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the input is not a UK phone number.
pub fn phone(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let normalized: String = trimmed
        .char_indices()
        .filter(|&(i, c)| c.is_ascii_digit() || (i == 0 && c == '+'))
        .map(|(_, c)| c)
        .collect();

    let only_separators = trimmed
        .chars()
        .skip(usize::from(trimmed.starts_with('+')))
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'));

    if !only_separators || !PHONE.is_match(&normalized) {
        return Err(ValidationError::new(
            "phone",
            "Enter a valid UK phone number",
        ));
    }
    Ok(normalized)
}

/// Resolve a requested page size against a default and an upper bound.
#[must_use]
pub fn clamp_limit(requested: Option<u32>, default: u32, max: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("label", "  Home ", 50).unwrap(), "Home");
        assert_eq!(
            required_text("label", "   ", 50).unwrap_err().message,
            "label is required"
        );
        assert!(required_text("label", &"x".repeat(51), 50).is_err());
        // Limits count characters, not bytes.
        assert!(required_text("label", &"é".repeat(50), 50).is_ok());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("line2", None, 10).unwrap(), None);
        assert_eq!(optional_text("line2", Some("  "), 10).unwrap(), None);
        assert_eq!(
            optional_text("line2", Some(" Flat 2 "), 10).unwrap(),
            Some("Flat 2".to_owned())
        );
        assert!(optional_text("line2", Some("far too long here"), 10).is_err());
    }

    #[test]
    fn test_postcode_normalizes() {
        assert_eq!(postcode("sw1a1aa").unwrap(), "SW1A 1AA");
        assert_eq!(postcode(" m1  1ae ").unwrap(), "M1 1AE");
        assert_eq!(postcode("B33 8TH").unwrap(), "B33 8TH");
        assert_eq!(postcode("cr2 6xh").unwrap(), "CR2 6XH");
    }

    #[test]
    fn test_postcode_rejects() {
        for bad in ["", "12345", "SW1A", "SW1A 1A", "ZZZ 1AA", "SW1A-1AA"] {
            let err = postcode(bad).unwrap_err();
            assert_eq!(err.field, "postcode", "{bad}");
        }
    }

    #[test]
    fn test_phone_normalizes() {
        assert_eq!(phone("07700 900123").unwrap(), "07700900123");
        assert_eq!(phone("+44 7700 900123").unwrap(), "+447700900123");
        assert_eq!(phone("(020) 7946-0018").unwrap(), "02079460018");
    }

    #[test]
    fn test_phone_rejects() {
        for bad in ["", "12345", "+1 555 0100 1234", "07700 9001ab", "07700+900123"] {
            assert!(phone(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 20, 50), 20);
        assert_eq!(clamp_limit(Some(0), 20, 50), 1);
        assert_eq!(clamp_limit(Some(500), 20, 50), 50);
        assert_eq!(clamp_limit(Some(7), 20, 50), 7);
    }
}
