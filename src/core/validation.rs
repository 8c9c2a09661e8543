//! Explicit input validation, run before any persistence call
//!
//! Every check here returns a typed [`ValidationError`] so callers reject bad
//! input before touching the store. Nothing in the storage layer re-validates.

use crate::core::error::ValidationError;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

/// Validate a billing period string, `YYYY-MM` with a real month number.
pub fn validate_month(month: &str) -> Result<(), ValidationError> {
    static MONTH_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex =
        MONTH_REGEX.get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap());
    if regex.is_match(month) {
        Ok(())
    } else {
        Err(ValidationError::field(
            "month",
            format!("'{}' does not match YYYY-MM", month),
        ))
    }
}

/// Validate an invoice total: zero is allowed, negative is not.
pub fn validate_amount_due(amount: Decimal) -> Result<(), ValidationError> {
    if amount < Decimal::ZERO {
        Err(ValidationError::field(
            "amount_due",
            format!("must not be negative (got {})", amount),
        ))
    } else {
        Ok(())
    }
}

/// Validate a payment amount: strictly positive.
pub fn validate_payment_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        Err(ValidationError::field(
            "amount_paid",
            format!("must be positive (got {})", amount),
        ))
    } else {
        Ok(())
    }
}

/// Validate an opaque property reference.
pub fn validate_property_id(property_id: &str) -> Result<(), ValidationError> {
    if property_id.trim().is_empty() {
        Err(ValidationError::field("property_id", "must not be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_months() {
        for month in ["2024-01", "2024-12", "1999-06"] {
            assert!(validate_month(month).is_ok(), "{month} should be valid");
        }
    }

    #[test]
    fn test_invalid_months() {
        for month in ["2024-13", "2024-00", "2024-1", "202405", "2024-05-01", "", "may-2024"] {
            assert!(validate_month(month).is_err(), "{month} should be invalid");
        }
    }

    #[test]
    fn test_amount_due_bounds() {
        assert!(validate_amount_due(Decimal::ZERO).is_ok());
        assert!(validate_amount_due(dec!(1200.50)).is_ok());
        assert!(validate_amount_due(dec!(-1)).is_err());
    }

    #[test]
    fn test_payment_amount_bounds() {
        assert!(validate_payment_amount(dec!(0.01)).is_ok());
        assert!(validate_payment_amount(Decimal::ZERO).is_err());
        assert!(validate_payment_amount(dec!(-5)).is_err());
    }

    #[test]
    fn test_property_id_not_empty() {
        assert!(validate_property_id("prop-1").is_ok());
        assert!(validate_property_id("").is_err());
        assert!(validate_property_id("   ").is_err());
    }
}
