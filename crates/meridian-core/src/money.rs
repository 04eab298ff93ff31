//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Currency Tag                             │
//! │    Decimal input ──round half-up to 2dp──► i64 cents + "LKR"            │
//! │    1.005 ──► 101 cents (1.01)                                           │
//! │                                                                         │
//! │  Every arithmetic result goes through the same constructor, so          │
//! │  rounding happens exactly once per operation.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Amounts are never negative (this domain has no negative money)
//! - Both operands of a binary operation share one currency
//! - Values are immutable; every operation returns a new `Money`
//!
//! ## Usage
//! ```rust
//! use meridian_core::money::{CurrencyCode, Money};
//! use rust_decimal::Decimal;
//!
//! let lkr = CurrencyCode::new("LKR").unwrap();
//! let price = Money::new(Decimal::new(1099, 2), lkr).unwrap(); // 10.99
//! let line = price.multiply_by_quantity(3).unwrap();
//! assert_eq!(line.cents(), 3297);
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Currency Code
// =============================================================================

/// ISO-4217 style currency code (three ASCII letters, stored uppercase).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Parses a currency code such as `"LKR"` or `"usd"`.
    pub fn new(code: &str) -> CoreResult<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "currency".to_string(),
            }
            .into());
        }

        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: "must be a three-letter code".to_string(),
            }
            .into());
        }

        Ok(CurrencyCode([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
            bytes[2].to_ascii_uppercase(),
        ]))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Constructed only from ASCII letters.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurrencyCode({})", self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A non-negative monetary value in cents, tagged with its currency.
///
/// ## Where Money is Used
/// ```text
/// unit price ──► line gross (× qty) ──► line total (− discount)
///                      │
///                      └──► bill subtotal ──► final total ──► change
///
/// base price ──► PricingPolicy::calculate ──► PricingDecision
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", try_from = "RawMoney")]
pub struct Money {
    /// Amount in the smallest currency unit.
    cents: i64,
    #[ts(as = "String")]
    currency: CurrencyCode,
}

/// Unchecked wire form, validated on deserialization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMoney {
    cents: i64,
    currency: CurrencyCode,
}

impl TryFrom<RawMoney> for Money {
    type Error = CoreError;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Money::from_cents(raw.cents, raw.currency)
    }
}

impl Money {
    /// Creates money from a decimal amount, rounding half-up to 2 places.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::{CurrencyCode, Money};
    /// use rust_decimal::Decimal;
    ///
    /// let lkr = CurrencyCode::new("LKR").unwrap();
    /// let m = Money::new(Decimal::new(1005, 3), lkr).unwrap(); // 1.005
    /// assert_eq!(m.cents(), 101); // 1.01
    /// assert!(Money::new(Decimal::new(-100, 2), lkr).is_err());
    /// ```
    pub fn new(amount: Decimal, currency: CurrencyCode) -> CoreResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::MustNotBeNegative {
                field: "amount".to_string(),
            }
            .into());
        }

        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let cents = rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.to_i64())
            .ok_or(CoreError::Overflow("money construction"))?;

        Ok(Money { cents, currency })
    }

    /// Creates money from a currency code string.
    pub fn parse(amount: Decimal, currency: &str) -> CoreResult<Self> {
        Money::new(amount, CurrencyCode::new(currency)?)
    }

    /// Creates money from cents (the smallest currency unit).
    pub fn from_cents(cents: i64, currency: CurrencyCode) -> CoreResult<Self> {
        if cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "amount".to_string(),
            }
            .into());
        }
        Ok(Money { cents, currency })
    }

    /// Returns zero in the given currency.
    #[inline]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Money { cents: 0, currency }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the currency tag.
    #[inline]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Returns the amount as a 2-decimal value.
    #[inline]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.cents, 2)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.cents > 0
    }

    fn ensure_same_currency(&self, other: &Money) -> CoreResult<()> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                expected: self.currency.to_string(),
                actual: other.currency.to_string(),
            });
        }
        Ok(())
    }

    /// Adds two amounts of the same currency.
    pub fn add(&self, other: &Money) -> CoreResult<Money> {
        self.ensure_same_currency(other)?;
        let cents = self
            .cents
            .checked_add(other.cents)
            .ok_or(CoreError::Overflow("money addition"))?;
        Ok(Money {
            cents,
            currency: self.currency,
        })
    }

    /// Subtracts `other`, failing if the result would be negative.
    pub fn subtract(&self, other: &Money) -> CoreResult<Money> {
        self.ensure_same_currency(other)?;
        if other.cents > self.cents {
            return Err(CoreError::InsufficientAmount {
                available: self.to_string(),
                requested: other.to_string(),
            });
        }
        Ok(Money {
            cents: self.cents - other.cents,
            currency: self.currency,
        })
    }

    /// Multiplies by an integer quantity.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::{CurrencyCode, Money};
    ///
    /// let lkr = CurrencyCode::new("LKR").unwrap();
    /// let unit = Money::from_cents(299, lkr).unwrap();
    /// assert_eq!(unit.multiply_by_quantity(3).unwrap().cents(), 897);
    /// assert!(unit.multiply_by_quantity(-1).is_err());
    /// ```
    pub fn multiply_by_quantity(&self, qty: i64) -> CoreResult<Money> {
        if qty < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "quantity".to_string(),
            }
            .into());
        }
        let cents = self
            .cents
            .checked_mul(qty)
            .ok_or(CoreError::Overflow("money multiplication"))?;
        Ok(Money {
            cents,
            currency: self.currency,
        })
    }

    /// Multiplies by a decimal factor, rounding half-up to 2 places.
    pub fn multiply_by_factor(&self, factor: Decimal) -> CoreResult<Money> {
        if factor.is_sign_negative() && !factor.is_zero() {
            return Err(ValidationError::MustNotBeNegative {
                field: "factor".to_string(),
            }
            .into());
        }
        let product = self
            .amount()
            .checked_mul(factor)
            .ok_or(CoreError::Overflow("money multiplication"))?;
        Money::new(product, self.currency)
    }

    /// Returns `pct` percent of this amount (half-up to 2 places).
    ///
    /// ```rust
    /// use meridian_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let total = Money::parse(Decimal::new(19000, 2), "LKR").unwrap();
    /// let ten_pct = total.percentage(Decimal::TEN).unwrap();
    /// assert_eq!(ten_pct.cents(), 1900);
    /// ```
    pub fn percentage(&self, pct: Decimal) -> CoreResult<Money> {
        if pct.is_sign_negative() && !pct.is_zero() {
            return Err(ValidationError::MustNotBeNegative {
                field: "percentage".to_string(),
            }
            .into());
        }
        self.multiply_by_factor(pct / Decimal::ONE_HUNDRED)
    }

    /// Strictly greater than `other`.
    pub fn is_greater_than(&self, other: &Money) -> CoreResult<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.cents > other.cents)
    }

    /// Strictly less than `other`.
    pub fn is_less_than(&self, other: &Money) -> CoreResult<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.cents < other.cents)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `"LKR 10.99"`.
///
/// ## Note
/// For logs and error messages. Receipt formatting belongs to the
/// presentation collaborator.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{:02}",
            self.currency,
            self.cents / 100,
            self.cents % 100
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
