//! # Validation Module
//!
//! Input validation shared by money, pricing, distribution and billing.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / service flow)                                   │
//! │  └── Resolves refs, parses user input                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: meridian-core                                                │
//! │  └── THIS MODULE: identifiers, quantities, percentages                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Persistence collaborator                                     │
//! │  └── Schema constraints                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator fails fast with a [`ValidationError`]; nothing is clamped
//! or silently corrected.

use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest identifier accepted for any reference.
pub const MAX_IDENTIFIER_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a reference identifier (product, batch, employee, ...).
///
/// ## Rules
/// - Must not be empty or whitespace
/// - At most [`MAX_IDENTIFIER_LEN`] characters
///
/// ## Example
/// ```rust
/// use meridian_core::validation::validate_identifier;
///
/// assert!(validate_identifier("product id", "p-100").is_ok());
/// assert!(validate_identifier("product id", "").is_err());
/// ```
pub fn validate_identifier(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_IDENTIFIER_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// ```rust
/// use meridian_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-3).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock quantity, where zero is allowed.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a percentage in the inclusive range 0-100.
///
/// ```rust
/// use meridian_core::validation::validate_percentage;
/// use rust_decimal::Decimal;
///
/// assert!(validate_percentage("discount", Decimal::new(125, 1)).is_ok()); // 12.5
/// assert!(validate_percentage("discount", Decimal::new(101, 0)).is_err());
/// ```
pub fn validate_percentage(field: &str, pct: Decimal) -> ValidationResult<()> {
    if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(ValidationError::PercentageOutOfRange {
            field: field.to_string(),
            value: pct,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
