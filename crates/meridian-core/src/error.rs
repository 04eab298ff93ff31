//! # Error Types
//!
//! Domain-specific error types for meridian-core.
//!
//! ## Error Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  CoreError          - every rejected operation (technical detail)       │
//! │  ├── ValidationError  - field-level input rules (wrapped via #[from])   │
//! │  └── kind() ──► ErrorKind  - flat tag for programmatic handling         │
//! │                                                                         │
//! │  ErrorReport        - serializable { kind, code, detail, message }      │
//! │                       handed to presentation collaborators              │
//! │                                                                         │
//! │  ListenerError      - returned by inventory listeners; the event bus    │
//! │                       logs it and never hands it to the publisher       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (currency, amounts, field names)
//! 3. Input errors and state errors carry different kinds
//! 4. Nothing here is fatal: every error is a rejected operation

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Flat classification of every [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Field-level input rule failed (negative amount, empty id, bad range).
    Validation,
    /// Two amounts in different currencies were combined.
    CurrencyMismatch,
    /// A subtraction would have produced negative money.
    InsufficientAmount,
    /// An argument is outside what the operation accepts.
    InvalidArgument,
    /// The object is not in a state that permits the operation.
    IllegalState,
    /// A required bill field was never set.
    MissingField,
    /// Cash tendered does not cover the bill.
    InsufficientCash,
    /// The same value was registered twice.
    DuplicateRegistration,
    /// Configuration text could not be parsed or is inconsistent.
    Configuration,
}

impl ErrorKind {
    /// Returns true for errors caused by caller input (as opposed to state).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::Validation
                | ErrorKind::CurrencyMismatch
                | ErrorKind::InsufficientAmount
                | ErrorKind::InvalidArgument
                | ErrorKind::DuplicateRegistration
                | ErrorKind::Configuration
        )
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Binary money operation on two different currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// Subtraction would go below zero.
    ///
    /// ## When This Occurs
    /// - Discount larger than the line or bill amount
    /// - Refund larger than what was paid
    #[error("Cannot subtract more than available amount: available {available}, requested {requested}")]
    InsufficientAmount { available: String, requested: String },

    /// Argument rejected by the operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Arithmetic left the representable range.
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Distribution selector used before a policy was chosen.
    #[error("No distribution policy selected")]
    NoPolicySelected,

    /// Bill accumulator was already turned into a snapshot.
    #[error("Bill {serial} is already finalized, cannot perform operation")]
    AlreadyFinalized { serial: String },

    /// Required bill field missing at build time.
    #[error("Cannot build bill: {field} is required")]
    MissingField { field: &'static str },

    /// Bill has no line items at build time.
    #[error("Cannot build bill: bill has no items")]
    EmptyBill,

    /// Cash tendered is less than the bill total.
    #[error("Cash tendered is less than the bill total: tendered {tendered}, total {total}")]
    InsufficientCash { tendered: String, total: String },

    /// Pricing policy registered twice.
    #[error("Pricing policy already registered: {0}")]
    DuplicatePolicy(String),

    /// Configuration could not be parsed or failed validation.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Returns the flat kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            CoreError::InsufficientAmount { .. } => ErrorKind::InsufficientAmount,
            CoreError::InvalidArgument(_) | CoreError::Overflow(_) => ErrorKind::InvalidArgument,
            CoreError::NoPolicySelected
            | CoreError::AlreadyFinalized { .. }
            | CoreError::EmptyBill => ErrorKind::IllegalState,
            CoreError::MissingField { .. } => ErrorKind::MissingField,
            CoreError::InsufficientCash { .. } => ErrorKind::InsufficientCash,
            CoreError::DuplicatePolicy(_) => ErrorKind::DuplicateRegistration,
            CoreError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            CoreError::InsufficientAmount { .. } => "INSUFFICIENT_AMOUNT",
            CoreError::InvalidArgument(_) => "INVALID_ARGUMENT",
            CoreError::Overflow(_) => "ARITHMETIC_OVERFLOW",
            CoreError::NoPolicySelected => "NO_POLICY_SELECTED",
            CoreError::AlreadyFinalized { .. } => "BILL_FINALIZED",
            CoreError::MissingField { .. } => "MISSING_FIELD",
            CoreError::EmptyBill => "EMPTY_BILL",
            CoreError::InsufficientCash { .. } => "INSUFFICIENT_CASH",
            CoreError::DuplicatePolicy(_) => "DUPLICATE_POLICY",
            CoreError::Configuration(_) => "INVALID_CONFIGURATION",
        }
    }

    /// Message suitable for showing to a cashier or operator.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Validation(err) => err.to_string(),
            CoreError::CurrencyMismatch { .. } => {
                "Amounts in different currencies cannot be combined".to_string()
            }
            CoreError::InsufficientAmount { .. } => {
                "Cannot subtract more than available amount".to_string()
            }
            CoreError::InvalidArgument(reason) => reason.clone(),
            CoreError::Overflow(_) => "Amount is too large".to_string(),
            CoreError::NoPolicySelected => "Choose a distribution option first".to_string(),
            CoreError::AlreadyFinalized { .. } => "This bill has already been completed".to_string(),
            CoreError::MissingField { field } => format!("The {} is required", field),
            CoreError::EmptyBill => "Add at least one item to the bill".to_string(),
            CoreError::InsufficientCash { total, .. } => {
                format!("Cash tendered is less than the bill total ({})", total)
            }
            CoreError::DuplicatePolicy(name) => format!("{} is already active", name),
            CoreError::Configuration(_) => "Configuration is invalid".to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Percentage outside 0-100.
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentageOutOfRange { field: String, value: Decimal },

    /// Invalid format (e.g., currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Listener Error
// =============================================================================

/// Failure reported by an inventory listener.
///
/// The event bus logs these and keeps delivering to the remaining listeners.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    /// Creates a listener error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        ListenerError(message.into())
    }
}

// =============================================================================
// Error Report
// =============================================================================

/// Structured, serializable error value for collaborators.
///
/// ```json
/// {
///   "kind": "INSUFFICIENT_CASH",
///   "code": "INSUFFICIENT_CASH",
///   "detail": "Cash tendered is less than the bill total: tendered LKR 100.00, total LKR 185.00",
///   "message": "Cash tendered is less than the bill total (LKR 185.00)"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub code: String,
    /// Technical detail for logs.
    pub detail: String,
    /// User-facing message.
    pub message: String,
}

impl From<&CoreError> for ErrorReport {
    fn from(err: &CoreError) -> Self {
        ErrorReport {
            kind: err.kind(),
            code: err.code().to_string(),
            detail: err.to_string(),
            message: err.user_message(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
