//! # Events Module
//!
//! Inventory change notifications and their publish/subscribe plumbing.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Inventory Event Flow                               │
//! │                                                                         │
//! │  stock mutation (caller)                                               │
//! │       │  stock_change_events() / expiry_event() / InventoryEvent::new() │
//! │       ▼                                                                 │
//! │  ┌──────────┐   snapshot of listeners, registration order              │
//! │  │ EventBus │──────────────┬──────────────────┬──────────────────┐     │
//! │  └──────────┘              ▼                  ▼                  ▼     │
//! │                     AlertListener      LoggingListener     any closure │
//! │                     (bounded FIFO)     (tracing)           / listener  │
//! │                                                                         │
//! │  A failing or panicking listener is logged and skipped; the publisher  │
//! │  only gets a PublishOutcome back.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod alert;
mod bus;

pub use alert::{AlertListener, LoggingListener, DEFAULT_ALERT_CAPACITY};
pub use bus::{EventBus, InventoryListener, PublishOutcome};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{BatchRef, EmployeeRef, ProductRef};
use crate::validation::validate_stock_quantity;

// =============================================================================
// Event Kind
// =============================================================================

/// What happened to the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InventoryEventKind {
    StockLow,
    StockOut,
    StockRestocked,
    ProductSold,
    BatchExpired,
    BatchNearExpiry,
    PriceChanged,
    ProductCreated,
    ProductDeactivated,
}

/// How urgently an operator should look at an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl InventoryEventKind {
    pub fn severity(&self) -> Severity {
        match self {
            InventoryEventKind::StockOut | InventoryEventKind::BatchExpired => Severity::Critical,
            InventoryEventKind::StockLow | InventoryEventKind::BatchNearExpiry => {
                Severity::Warning
            }
            _ => Severity::Info,
        }
    }

    /// Low/out of stock and expiring/expired batches.
    pub fn is_alert_worthy(&self) -> bool {
        matches!(
            self,
            InventoryEventKind::StockLow
                | InventoryEventKind::StockOut
                | InventoryEventKind::BatchExpired
                | InventoryEventKind::BatchNearExpiry
        )
    }
}

// =============================================================================
// Inventory Event
// =============================================================================

/// A single inventory change notification.
///
/// `id` and `timestamp` are assigned at construction; everything optional is
/// set through the `with_*` builders.
///
/// ```rust
/// use meridian_core::events::{InventoryEvent, InventoryEventKind};
/// use meridian_core::types::ProductRef;
///
/// let milk = ProductRef::new("p-1", "MLK-1L", "Milk 1L").unwrap();
/// let event = InventoryEvent::new(InventoryEventKind::StockLow, milk, "Main Store")
///     .with_quantities(12, 4);
/// assert_eq!(
///     event.description(),
///     "Low stock alert for Milk 1L (MLK-1L) - Only 4 units remaining at Main Store"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEvent {
    #[ts(as = "String")]
    id: Uuid,
    pub kind: InventoryEventKind,
    pub product: ProductRef,
    pub batch: Option<BatchRef>,
    pub location_name: String,
    pub old_quantity: Option<i64>,
    pub new_quantity: Option<i64>,
    pub old_price: Option<Money>,
    pub new_price: Option<Money>,
    /// Overrides the generated description when set.
    pub message: Option<String>,
    #[ts(as = "String")]
    timestamp: DateTime<Utc>,
    pub actor: Option<EmployeeRef>,
}

impl InventoryEvent {
    pub fn new(
        kind: InventoryEventKind,
        product: ProductRef,
        location_name: impl Into<String>,
    ) -> Self {
        InventoryEvent {
            id: Uuid::new_v4(),
            kind,
            product,
            batch: None,
            location_name: location_name.into(),
            old_quantity: None,
            new_quantity: None,
            old_price: None,
            new_price: None,
            message: None,
            timestamp: Utc::now(),
            actor: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the event was constructed.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn with_batch(mut self, batch: BatchRef) -> Self {
        self.batch = Some(batch);
        self
    }

    pub fn with_quantities(mut self, old: i64, new: i64) -> Self {
        self.old_quantity = Some(old);
        self.new_quantity = Some(new);
        self
    }

    pub fn with_prices(mut self, old: Money, new: Money) -> Self {
        self.old_price = Some(old);
        self.new_price = Some(new);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_actor(mut self, actor: EmployeeRef) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Human-readable description: the explicit message if any, otherwise a
    /// kind-specific rendering of the event fields.
    pub fn description(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }

        let product = &self.product;
        let location = &self.location_name;
        let batch = self
            .batch
            .as_ref()
            .map(|b| b.batch_number.as_str())
            .unwrap_or("unknown");

        match self.kind {
            InventoryEventKind::StockLow => format!(
                "Low stock alert for {} - Only {} units remaining at {}",
                product,
                quantity(self.new_quantity),
                location
            ),
            InventoryEventKind::StockOut => {
                format!("{} is out of stock at {}", product, location)
            }
            InventoryEventKind::StockRestocked => format!(
                "{} restocked at {} - {} units, up from {}",
                product,
                location,
                quantity(self.new_quantity),
                quantity(self.old_quantity)
            ),
            InventoryEventKind::ProductSold => {
                let sold = match (self.old_quantity, self.new_quantity) {
                    (Some(old), Some(new)) => quantity(old.checked_sub(new)),
                    _ => "unknown".to_string(),
                };
                format!(
                    "{} units of {} sold at {} - {} units remaining",
                    sold,
                    product,
                    location,
                    quantity(self.new_quantity)
                )
            }
            InventoryEventKind::BatchExpired => format!(
                "Batch {} of {} has expired at {}",
                batch, product, location
            ),
            InventoryEventKind::BatchNearExpiry => {
                let expiry = self
                    .batch
                    .as_ref()
                    .and_then(|b| b.expiry_date)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "an unknown date".to_string());
                format!(
                    "Batch {} of {} expires on {} at {}",
                    batch, product, expiry, location
                )
            }
            InventoryEventKind::PriceChanged => format!(
                "Price of {} changed from {} to {}",
                product,
                price(self.old_price.as_ref()),
                price(self.new_price.as_ref())
            ),
            InventoryEventKind::ProductCreated => {
                format!("New product {} added at {}", product, location)
            }
            InventoryEventKind::ProductDeactivated => {
                format!("{} was deactivated at {}", product, location)
            }
        }
    }
}

fn quantity(value: Option<i64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |q| q.to_string())
}

fn price(value: Option<&Money>) -> String {
    value.map_or_else(|| "unknown".to_string(), |p| p.to_string())
}

// =============================================================================
// Event Helpers
// =============================================================================

/// Levels at which stock and expiry events are raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockThresholds {
    /// A positive quantity at or below this is "low".
    pub low_stock_threshold: i64,
    /// A batch expiring within this many days is "near expiry".
    pub near_expiry_days: i64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        StockThresholds {
            low_stock_threshold: 10,
            near_expiry_days: 7,
        }
    }
}

/// Derives the events a stock level change should raise.
///
/// ## Rules
/// - increase: `StockRestocked`, plus `StockLow` if the new level is still low
/// - decrease to zero: `StockOut`
/// - decrease to a low level: `StockLow`
/// - no change: nothing
pub fn stock_change_events(
    product: &ProductRef,
    batch: Option<&BatchRef>,
    location_name: &str,
    old_quantity: i64,
    new_quantity: i64,
    thresholds: &StockThresholds,
) -> CoreResult<Vec<InventoryEvent>> {
    validate_stock_quantity(old_quantity)?;
    validate_stock_quantity(new_quantity)?;

    let event = |kind| {
        let event = InventoryEvent::new(kind, product.clone(), location_name)
            .with_quantities(old_quantity, new_quantity);
        match batch {
            Some(b) => event.with_batch(b.clone()),
            None => event,
        }
    };
    let is_low = new_quantity > 0 && new_quantity <= thresholds.low_stock_threshold;

    let mut events = Vec::new();
    if new_quantity > old_quantity {
        events.push(event(InventoryEventKind::StockRestocked));
        if is_low {
            events.push(event(InventoryEventKind::StockLow));
        }
    } else if new_quantity < old_quantity {
        if new_quantity == 0 {
            events.push(event(InventoryEventKind::StockOut));
        } else if is_low {
            events.push(event(InventoryEventKind::StockLow));
        }
    }
    Ok(events)
}

/// `BatchExpired` once the expiry date is reached, `BatchNearExpiry` within
/// the threshold window, otherwise nothing. Batches without a date never expire.
pub fn expiry_event(
    product: &ProductRef,
    batch: &BatchRef,
    location_name: &str,
    today: NaiveDate,
    thresholds: &StockThresholds,
) -> Option<InventoryEvent> {
    let expiry = batch.expiry_date?;
    let days_left = (expiry - today).num_days();

    let kind = if days_left <= 0 {
        InventoryEventKind::BatchExpired
    } else if days_left <= thresholds.near_expiry_days {
        InventoryEventKind::BatchNearExpiry
    } else {
        return None;
    };

    Some(InventoryEvent::new(kind, product.clone(), location_name).with_batch(batch.clone()))
}

// =============================================================================
// Unit Tests
// =============================================================================
