//! # Reference Types
//!
//! Identity snapshots the caller resolves from its own repositories
//! (products, batches, channels, employees, customers) before driving the
//! core. The core never looks these up itself.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product repository ──► ProductRef { id, code, name }   (frozen copy)   │
//! │  batch repository   ──► BatchRef   { id, batch_number, expiry_date }    │
//! │  channel lookup     ──► ChannelRef { id, kind }                         │
//! │  login/session      ──► EmployeeRef { id, name }                        │
//! │  customer lookup    ──► CustomerRef { id, name, class }                 │
//! │                                                                         │
//! │  Refs are copied into bills and events so later edits to the master    │
//! │  data never change what a receipt or alert says.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::validation::validate_identifier;

// =============================================================================
// Product / Batch
// =============================================================================

/// A product as seen at the time of sale or event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub id: String,
    /// Business code printed on shelves and receipts.
    pub code: String,
    pub name: String,
}

impl ProductRef {
    /// Creates a product reference, rejecting an empty id.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> CoreResult<Self> {
        let id = id.into();
        validate_identifier("product id", &id)?;
        Ok(ProductRef {
            id,
            code: code.into(),
            name: name.into(),
        })
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// A stock lot of a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BatchRef {
    pub id: String,
    pub batch_number: String,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
}

impl BatchRef {
    /// Creates a batch reference, rejecting an empty id.
    pub fn new(id: impl Into<String>, batch_number: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        validate_identifier("batch id", &id)?;
        Ok(BatchRef {
            id,
            batch_number: batch_number.into(),
            expiry_date: None,
        })
    }

    /// Sets the expiry date.
    pub fn with_expiry(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }
}

// =============================================================================
// Sales Channel
// =============================================================================

/// Where a bill was rung up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Counter terminal in a physical store.
    PointOfSale,
    /// Web store; bills usually carry a delivery address.
    Online,
}

/// A resolved sales channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRef {
    pub id: String,
    pub kind: ChannelKind,
}

impl ChannelRef {
    pub fn new(id: impl Into<String>, kind: ChannelKind) -> CoreResult<Self> {
        let id = id.into();
        validate_identifier("sales channel id", &id)?;
        Ok(ChannelRef { id, kind })
    }
}

// =============================================================================
// People
// =============================================================================

/// The employee ringing up the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRef {
    pub id: String,
    pub name: String,
}

impl EmployeeRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        validate_identifier("employee id", &id)?;
        Ok(EmployeeRef {
            id,
            name: name.into(),
        })
    }
}

/// Customer classification used by pricing (`"VIP"`, `"REGULAR"`, ...).
///
/// Stored uppercase and trimmed so `"vip "` and `"VIP"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(from = "String")]
pub struct CustomerClass(String);

impl CustomerClass {
    pub const VIP: &'static str = "VIP";
    pub const REGULAR: &'static str = "REGULAR";

    pub fn new(class: &str) -> Self {
        CustomerClass(class.trim().to_uppercase())
    }

    pub fn vip() -> Self {
        CustomerClass(Self::VIP.to_string())
    }

    pub fn regular() -> Self {
        CustomerClass(Self::REGULAR.to_string())
    }

    pub fn is_vip(&self) -> bool {
        self.0 == Self::VIP
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CustomerClass {
    fn default() -> Self {
        CustomerClass::regular()
    }
}

impl From<&str> for CustomerClass {
    fn from(class: &str) -> Self {
        CustomerClass::new(class)
    }
}

impl From<String> for CustomerClass {
    fn from(class: String) -> Self {
        CustomerClass::new(&class)
    }
}

/// A known customer attached to a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
    pub class: CustomerClass,
}

impl CustomerRef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        class: CustomerClass,
    ) -> CoreResult<Self> {
        let id = id.into();
        validate_identifier("customer id", &id)?;
        Ok(CustomerRef {
            id,
            name: name.into(),
            class,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
