//! # Validation Module
//!
//! Input validation utilities for DealerNet write operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary (axum)                                         │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: field rules (VIN, month, amounts, names)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Domain operations (sale, inventory, transfer)                │
//! │  └── State rules (status transitions, ownership)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dealernet_core::validation::{validate_vin, validate_month};
//!
//! validate_vin("1FTER4FH5LLA12345").unwrap();
//! validate_month("2024-06").unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest VIN accepted (the standard length).
pub const MAX_VIN_LENGTH: usize = 17;

/// Longest display name accepted.
pub const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a vehicle identification number.
///
/// ## Rules
/// - Must not be empty
/// - At most 17 characters
/// - Letters and digits only
///
/// ## Example
/// ```rust
/// use dealernet_core::validation::validate_vin;
///
/// assert!(validate_vin("VIN0001").is_ok());
/// assert!(validate_vin("").is_err());
/// assert!(validate_vin("VIN-0001").is_err());
/// ```
pub fn validate_vin(vin: &str) -> ValidationResult<()> {
    let vin = vin.trim();

    if vin.is_empty() {
        return Err(ValidationError::required("vin"));
    }

    if vin.len() > MAX_VIN_LENGTH {
        return Err(ValidationError::TooLong {
            field: "vin".to_string(),
            max: MAX_VIN_LENGTH,
        });
    }

    if !vin.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "vin".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a required display string (names, model, city, ...).
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a `YYYY-MM` month key.
///
/// ## Example
/// ```rust
/// use dealernet_core::validation::validate_month;
///
/// assert!(validate_month("2024-06").is_ok());
/// assert!(validate_month("2024-13").is_err());
/// assert!(validate_month("June").is_err());
/// ```
pub fn validate_month(month: &str) -> ValidationResult<()> {
    let well_formed = month.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").is_ok();

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "month".to_string(),
            reason: "expected YYYY-MM".to_string(),
        });
    }

    Ok(())
}

/// Validates the rejection reason of a transfer decision.
pub fn validate_rejection_reason(reason: Option<&str>) -> ValidationResult<String> {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(r.to_string()),
        _ => Err(ValidationError::required("rejectionReason")),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a commission rate in basis points (0 to 100%).
pub fn validate_commission_rate(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "commissionRateBps".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates a goal target, which must be strictly positive.
pub fn validate_goal_target(target: i64) -> ValidationResult<()> {
    if target <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "target".to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary input in cents, which must not be negative.
///
/// ## Example
/// ```rust
/// use dealernet_core::validation::validate_amount;
///
/// assert!(validate_amount("salePrice", 0).is_ok());
/// assert!(validate_amount("salePrice", -1).is_err());
/// ```
pub fn validate_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a model year.
pub fn validate_model_year(year: i32) -> ValidationResult<()> {
    if !(1900..=2100).contains(&year) {
        return Err(ValidationError::OutOfRange {
            field: "year".to_string(),
            min: 1900,
            max: 2100,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_vin() {
        assert!(validate_vin("1FTER4FH5LLA12345").is_ok());
        assert!(matches!(
            validate_vin("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_vin("1FTER4FH5LLA123456"),
            Err(ValidationError::TooLong { max: 17, .. })
        ));
        assert!(matches!(
            validate_vin("VIN 1"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Costa Motors").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month("2024-01").is_ok());
        assert!(validate_month("2024-12").is_ok());
        assert!(validate_month("2024-00").is_err());
        assert!(validate_month("2024-6").is_err());
        assert!(validate_month("2024-06-01").is_err());
    }

    #[test]
    fn test_validate_rejection_reason() {
        assert_eq!(
            validate_rejection_reason(Some("  no space ")).unwrap(),
            "no space"
        );
        assert!(validate_rejection_reason(Some("   ")).is_err());
        assert!(validate_rejection_reason(None).is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(validate_commission_rate(1000).is_ok());
        assert!(validate_commission_rate(10_001).is_err());
        assert!(validate_goal_target(1).is_ok());
        assert!(validate_goal_target(0).is_err());
        assert!(validate_model_year(2024).is_ok());
        assert!(validate_model_year(1850).is_err());
    }
}
