//! # meridian-core: Pricing, Billing and Inventory Events for Meridian POS
//!
//! This crate holds the business rules of a retail point of sale: money,
//! price selection, stock placement, bill construction and inventory
//! notifications. It performs no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Meridian POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation (counter UI, web store)               │   │
//! │  │    product search ──► bill entry ──► tender ──► receipt         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ refs, quantities, prices               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ meridian-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────────┐ ┌──────┐ ┌────────┐  │   │
//! │  │  │  money  │ │ pricing │ │ distribution │ │ bill │ │ events │  │   │
//! │  │  │  Money  │ │Selector │ │   Selector   │ │Accum.│ │EventBus│  │   │
//! │  │  └─────────┘ └─────────┘ └──────────────┘ └──────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO GLOBALS                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ BillSnapshot, InventoryEvent           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  Persistence collaborator                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Non-negative, currency-tagged amounts in integer cents
//! - [`pricing`] - Regular / bulk / VIP pricing and best-price selection
//! - [`distribution`] - Warehouse / shelf / online split of new stock
//! - [`bill`] - `BillAccumulator` and the immutable `BillSnapshot`
//! - [`events`] - Inventory events, `EventBus`, alert and logging listeners
//! - [`config`] - `CoreConfig` and the factories built from it
//! - [`types`] - Reference snapshots (product, batch, channel, people)
//! - [`validation`] - Shared input checks
//! - [`error`] - `CoreError`, `ErrorKind` and `ErrorReport`
//!
//! ## Example Usage
//!
//! ```rust
//! use meridian_core::{BillAccumulator, CoreConfig, Money};
//! use meridian_core::types::*;
//! use rust_decimal::Decimal;
//!
//! let config = CoreConfig::default();
//! let lkr = config.currency_code().unwrap();
//! let pricing = config.pricing_selector().unwrap();
//!
//! // 12 units qualify for the bulk discount: 12 × 100.00 less 5%
//! let unit = Money::new(Decimal::new(10000, 2), lkr).unwrap();
//! let decision = pricing.select_best(&unit, 12, &CustomerClass::regular()).unwrap();
//! assert_eq!(decision.final_price.cents(), 114000);
//!
//! let mut bill = BillAccumulator::new(lkr);
//! bill.with_serial_number("BILL-20261016-0001").unwrap()
//!     .with_sales_channel(ChannelRef::new("pos-1", ChannelKind::PointOfSale).unwrap()).unwrap()
//!     .with_employee(EmployeeRef::new("emp-1", "Kamala").unwrap()).unwrap()
//!     .add_item_with_amount_discount(
//!         ProductRef::new("p-1", "RICE-5", "Rice 5kg").unwrap(),
//!         BatchRef::new("b-1", "R2026-10").unwrap(),
//!         12,
//!         unit,
//!         decision.savings,
//!     ).unwrap();
//!
//! let snapshot = bill.build().unwrap();
//! assert_eq!(snapshot.final_total(), decision.final_price);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod config;
pub mod distribution;
pub mod error;
pub mod events;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{BillAccumulator, BillLineItem, BillSerialGenerator, BillSnapshot};
pub use config::CoreConfig;
pub use distribution::{DistributionPolicy, DistributionSelector, InventoryDistribution};
pub use error::{CoreError, CoreResult, ErrorKind, ErrorReport, ValidationError};
pub use events::{AlertListener, EventBus, InventoryEvent, InventoryEventKind, InventoryListener};
pub use money::{CurrencyCode, Money};
pub use pricing::{PricingDecision, PricingPolicy, PricingSelector};
