//! # Distribution Module
//!
//! Decides where newly stocked units go: back-store warehouse, store shelf,
//! or the online inventory pool.
//!
//! ## Policies
//! ```text
//! ┌──────────────┬────────────────────────┬────────────┬──────────────────┐
//! │ Policy       │ Warehouse              │ Shelf      │ Online           │
//! ├──────────────┼────────────────────────┼────────────┼──────────────────┤
//! │ Physical     │ floor(total × 0.8)     │ remainder  │ 0                │
//! │ OnlineOnly   │ 0                      │ 0          │ total            │
//! │ Hybrid       │ phys − shelf           │ floor(phys │ total − phys     │
//! │              │ phys = floor(total×0.6)│   × 0.25)  │                  │
//! └──────────────┴────────────────────────┴────────────┴──────────────────┘
//! ```
//!
//! Splits use integer truncation and hand the remainder to the complementary
//! bucket, so the three quantities always sum to the input total.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_stock_quantity;

// =============================================================================
// Inventory Distribution
// =============================================================================

/// The computed split for a quantity of new stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDistribution {
    /// Units kept in the back-store warehouse.
    pub physical_quantity: i64,
    pub shelf_quantity: i64,
    pub online_quantity: i64,
    /// True when shelf stock must be placed (shelf quantity > 0).
    pub requires_shelf_configuration: bool,
    pub summary: String,
}

impl InventoryDistribution {
    /// Sum of all three buckets.
    pub fn total(&self) -> i64 {
        self.physical_quantity + self.shelf_quantity + self.online_quantity
    }
}

// =============================================================================
// Distribution Policy
// =============================================================================

/// A fixed-ratio stock placement rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DistributionPolicy {
    Physical,
    OnlineOnly,
    Hybrid,
}

impl DistributionPolicy {
    pub fn display_name(&self) -> &'static str {
        match self {
            DistributionPolicy::Physical => "Physical Store",
            DistributionPolicy::OnlineOnly => "Online Only",
            DistributionPolicy::Hybrid => "Hybrid (Store + Online)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DistributionPolicy::Physical => {
                "80% to the warehouse, the rest on the shelf; not sold online"
            }
            DistributionPolicy::OnlineOnly => "All stock reserved for online orders",
            DistributionPolicy::Hybrid => {
                "60% physical (a quarter of it on the shelf), 40% for online orders"
            }
        }
    }

    /// Whether the product needs warehouse or shelf space at all.
    pub fn requires_physical_storage(&self) -> bool {
        !matches!(self, DistributionPolicy::OnlineOnly)
    }

    /// Splits `total_quantity` across the three buckets.
    ///
    /// ```rust
    /// use meridian_core::distribution::DistributionPolicy;
    ///
    /// let d = DistributionPolicy::Hybrid.configure(100).unwrap();
    /// assert_eq!((d.physical_quantity, d.shelf_quantity, d.online_quantity), (45, 15, 40));
    /// ```
    pub fn configure(&self, total_quantity: i64) -> CoreResult<InventoryDistribution> {
        validate_stock_quantity(total_quantity)?;

        let (physical, shelf, online) = match self {
            DistributionPolicy::Physical => {
                // i128 keeps the ratio multiplication from overflowing
                let warehouse = (total_quantity as i128 * 8 / 10) as i64;
                (warehouse, total_quantity - warehouse, 0)
            }
            DistributionPolicy::OnlineOnly => (0, 0, total_quantity),
            DistributionPolicy::Hybrid => {
                let total_physical = (total_quantity as i128 * 6 / 10) as i64;
                let shelf = total_physical / 4;
                (
                    total_physical - shelf,
                    shelf,
                    total_quantity - total_physical,
                )
            }
        };

        Ok(InventoryDistribution {
            physical_quantity: physical,
            shelf_quantity: shelf,
            online_quantity: online,
            requires_shelf_configuration: shelf > 0,
            summary: format!(
                "{}: {} warehouse, {} shelf, {} online (total {})",
                self.display_name(),
                physical,
                shelf,
                online,
                total_quantity
            ),
        })
    }
}

// =============================================================================
// Distribution Selector
// =============================================================================

/// Fixed catalogue of policies, chosen by 1-based menu index.
#[derive(Debug, Clone, Default)]
pub struct DistributionSelector {
    selected: Option<DistributionPolicy>,
}

impl DistributionSelector {
    /// Catalogue order; index 1 is the first entry.
    pub const CATALOGUE: [DistributionPolicy; 3] = [
        DistributionPolicy::Physical,
        DistributionPolicy::OnlineOnly,
        DistributionPolicy::Hybrid,
    ];

    pub fn new() -> Self {
        DistributionSelector { selected: None }
    }

    /// Menu entries as `(index, display name, description)`.
    pub fn options(&self) -> impl Iterator<Item = (usize, &'static str, &'static str)> {
        Self::CATALOGUE
            .iter()
            .enumerate()
            .map(|(i, p)| (i + 1, p.display_name(), p.description()))
    }

    /// Selects the policy at 1-based `index`.
    pub fn select(&mut self, index: usize) -> CoreResult<DistributionPolicy> {
        let policy = index
            .checked_sub(1)
            .and_then(|i| Self::CATALOGUE.get(i))
            .copied()
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!(
                    "distribution option must be between 1 and {}, got {}",
                    Self::CATALOGUE.len(),
                    index
                ))
            })?;

        debug!(policy = policy.display_name(), "Selected distribution policy");
        self.selected = Some(policy);
        Ok(policy)
    }

    pub fn selected(&self) -> Option<DistributionPolicy> {
        self.selected
    }

    /// Applies the selected policy.
    pub fn configure(&self, total_quantity: i64) -> CoreResult<InventoryDistribution> {
        self.selected
            .ok_or(CoreError::NoPolicySelected)?
            .configure(total_quantity)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
