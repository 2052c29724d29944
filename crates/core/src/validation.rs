//! Input validation utilities.
//!
//! Client-side required-field checks run before any request is sent. A failed check leaves the
//! form untouched so the user can correct it and retry.

use crate::{HmsError, HmsResult};

/// Checks that every named text field has non-whitespace content.
///
/// All missing fields are reported together, in the order given.
///
/// # Errors
///
/// Returns `HmsError::MissingFields` listing the blank fields.
pub fn require_fields(fields: &[(&'static str, &str)]) -> HmsResult<()> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(HmsError::MissingFields(missing))
    }
}

/// Checks that a backend identifier has been chosen (the forms use 0 for "none").
pub fn require_id(field: &'static str, id: i64) -> HmsResult<()> {
    if id <= 0 {
        return Err(HmsError::MissingFields(vec![field]));
    }
    Ok(())
}

/// Rejects negative or non-finite money and quantity values.
pub fn require_non_negative(field: &'static str, value: f64) -> HmsResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(HmsError::NegativeAmount { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_blank_field() {
        let err = require_fields(&[("name", "Ravi"), ("age", " "), ("phone", "")]).unwrap_err();
        match err {
            HmsError::MissingFields(f) => assert_eq!(f, vec!["age", "phone"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn accepts_filled_fields() {
        assert!(require_fields(&[("name", "Ravi"), ("age", "34")]).is_ok());
    }

    #[test]
    fn zero_id_is_missing() {
        assert!(require_id("doctor", 0).is_err());
        assert!(require_id("doctor", 3).is_ok());
    }

    #[test]
    fn negative_amounts_rejected() {
        assert!(require_non_negative("rate", -0.01).is_err());
        assert!(require_non_negative("rate", f64::INFINITY).is_err());
        assert!(require_non_negative("rate", 0.0).is_ok());
    }
}
