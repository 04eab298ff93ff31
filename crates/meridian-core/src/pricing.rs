//! # Pricing Module
//!
//! Discount policies and best-price selection for a sale line.
//!
//! ## Selection Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base price × quantity, customer class                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Regular ──► baseline (always applicable, current best)                │
//! │       │                                                                 │
//! │       ▼  for each registered policy, in registration order              │
//! │  applicable? ── no ──► skip                                             │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  price < best? ── no ──► keep earlier policy (ties stay first)          │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  adopt as best                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PricingDecision { policy, final, original = baseline, savings }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CustomerClass;
use crate::validation::{validate_percentage, validate_quantity};

// =============================================================================
// Pricing Policy
// =============================================================================

/// A pricing rule. The set is closed, so the selector can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PricingPolicy {
    /// List price, no discount. Always applicable.
    Regular,

    /// Percentage off when buying at least `min_quantity` units.
    BulkDiscount {
        min_quantity: i64,
        #[ts(as = "String")]
        discount_percentage: Decimal,
    },

    /// Percentage off for customers classed as VIP.
    Vip {
        #[ts(as = "String")]
        discount_percentage: Decimal,
    },
}

impl PricingPolicy {
    /// The regular (fallback) policy.
    pub const fn regular() -> Self {
        PricingPolicy::Regular
    }

    /// Bulk discount; `min_quantity` must be positive, percentage 0-100.
    pub fn bulk_discount(min_quantity: i64, discount_percentage: Decimal) -> CoreResult<Self> {
        if min_quantity <= 0 {
            return Err(CoreError::InvalidArgument(format!(
                "bulk minimum quantity must be positive, got {}",
                min_quantity
            )));
        }
        validate_percentage("bulk discount percentage", discount_percentage)?;
        Ok(PricingPolicy::BulkDiscount {
            min_quantity,
            discount_percentage,
        })
    }

    /// VIP discount; percentage 0-100.
    pub fn vip(discount_percentage: Decimal) -> CoreResult<Self> {
        validate_percentage("VIP discount percentage", discount_percentage)?;
        Ok(PricingPolicy::Vip {
            discount_percentage,
        })
    }

    /// Stable identifier for storage and analytics.
    pub fn identifier(&self) -> &'static str {
        match self {
            PricingPolicy::Regular => "REGULAR",
            PricingPolicy::BulkDiscount { .. } => "BULK_DISCOUNT",
            PricingPolicy::Vip { .. } => "VIP",
        }
    }

    /// Human-readable name for receipts and logs.
    pub fn name(&self) -> String {
        match self {
            PricingPolicy::Regular => "Regular Price".to_string(),
            PricingPolicy::BulkDiscount {
                min_quantity,
                discount_percentage,
            } => format!(
                "Bulk Discount ({}% off {}+ items)",
                discount_percentage.normalize(),
                min_quantity
            ),
            PricingPolicy::Vip {
                discount_percentage,
            } => format!("VIP Discount ({}% off)", discount_percentage.normalize()),
        }
    }

    /// Whether this policy may price the given purchase.
    pub fn is_applicable(&self, _base_price: &Money, quantity: i64, class: &CustomerClass) -> bool {
        match self {
            PricingPolicy::Regular => true,
            PricingPolicy::BulkDiscount { min_quantity, .. } => quantity >= *min_quantity,
            PricingPolicy::Vip { .. } => class.is_vip(),
        }
    }

    /// Price for `quantity` units at `base_price`.
    ///
    /// Discounted policies compute `base × qty × (1 − pct/100)`, rounded once.
    pub fn calculate(
        &self,
        base_price: &Money,
        quantity: i64,
        _class: &CustomerClass,
    ) -> CoreResult<Money> {
        let gross = base_price.multiply_by_quantity(quantity)?;
        match self {
            PricingPolicy::Regular => Ok(gross),
            PricingPolicy::BulkDiscount {
                discount_percentage,
                ..
            }
            | PricingPolicy::Vip {
                discount_percentage,
            } => {
                let factor = Decimal::ONE - *discount_percentage / Decimal::ONE_HUNDRED;
                gross.multiply_by_factor(factor)
            }
        }
    }
}

// =============================================================================
// Pricing Decision
// =============================================================================

/// Outcome of [`PricingSelector::select_best`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingDecision {
    pub policy: PricingPolicy,
    pub policy_name: String,
    pub final_price: Money,
    /// Base price × quantity before any discount.
    pub original_price: Money,
    pub savings: Money,
}

impl PricingDecision {
    /// True when the selected policy beats the regular price.
    pub fn has_savings(&self) -> bool {
        self.savings.is_positive()
    }
}

// =============================================================================
// Pricing Selector
// =============================================================================

/// Append-only registry of pricing policies.
///
/// ## Thread Safety
/// Register during setup; afterwards `select_best` only reads and the selector
/// can be shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PricingSelector {
    policies: Vec<PricingPolicy>,
}

impl PricingSelector {
    /// Creates a selector with only the regular policy registered.
    pub fn new() -> Self {
        PricingSelector {
            policies: vec![PricingPolicy::Regular],
        }
    }

    /// Registers a policy. Registering an equal policy twice is rejected.
    pub fn register(&mut self, policy: PricingPolicy) -> CoreResult<()> {
        if self.policies.contains(&policy) {
            return Err(CoreError::DuplicatePolicy(policy.name()));
        }
        debug!(policy = %policy.name(), "Registered pricing policy");
        self.policies.push(policy);
        Ok(())
    }

    /// Registered policies, in registration order.
    pub fn policies(&self) -> &[PricingPolicy] {
        &self.policies
    }

    /// Policies that may price the given purchase, in registration order.
    pub fn applicable(
        &self,
        base_price: &Money,
        quantity: i64,
        class: &CustomerClass,
    ) -> Vec<&PricingPolicy> {
        self.policies
            .iter()
            .filter(|p| p.is_applicable(base_price, quantity, class))
            .collect()
    }

    /// Picks the cheapest applicable policy.
    ///
    /// ## Example
    /// ```rust
    /// use meridian_core::money::Money;
    /// use meridian_core::pricing::{PricingPolicy, PricingSelector};
    /// use meridian_core::types::CustomerClass;
    /// use rust_decimal::Decimal;
    ///
    /// let mut selector = PricingSelector::new();
    /// selector.register(PricingPolicy::bulk_discount(10, Decimal::new(5, 0)).unwrap()).unwrap();
    ///
    /// let base = Money::parse(Decimal::new(10000, 2), "LKR").unwrap(); // 100.00
    /// let decision = selector.select_best(&base, 10, &CustomerClass::regular()).unwrap();
    /// assert_eq!(decision.final_price.cents(), 95000); // 950.00
    /// assert_eq!(decision.savings.cents(), 5000);      // 50.00
    /// ```
    pub fn select_best(
        &self,
        base_price: &Money,
        quantity: i64,
        class: &CustomerClass,
    ) -> CoreResult<PricingDecision> {
        validate_quantity(quantity)?;

        let baseline = PricingPolicy::Regular.calculate(base_price, quantity, class)?;
        let mut best_policy = &PricingPolicy::Regular;
        let mut best_price = baseline;

        for policy in &self.policies {
            if !policy.is_applicable(base_price, quantity, class) {
                continue;
            }
            let price = policy.calculate(base_price, quantity, class)?;
            if price.is_less_than(&best_price)? {
                best_policy = policy;
                best_price = price;
            }
        }

        let savings = baseline.subtract(&best_price)?;
        debug!(
            policy = best_policy.identifier(),
            quantity,
            final_price = %best_price,
            savings = %savings,
            "Selected pricing policy"
        );

        Ok(PricingDecision {
            policy: best_policy.clone(),
            policy_name: best_policy.name(),
            final_price: best_price,
            original_price: baseline,
            savings,
        })
    }
}

impl Default for PricingSelector {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::money::CurrencyCode;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn lkr(amount: Decimal) -> Money {
        Money::parse(amount, "LKR").unwrap()
    }

    #[test]
    fn test_bulk_discount_selected() {
        let mut selector = PricingSelector::new();
        selector
            .register(PricingPolicy::bulk_discount(10, dec!(5)).unwrap())
            .unwrap();

        let decision = selector
            .select_best(&lkr(dec!(100.00)), 10, &CustomerClass::regular())
            .unwrap();

        assert_eq!(decision.final_price, lkr(dec!(950.00)));
        assert_eq!(decision.original_price, lkr(dec!(1000.00)));
        assert_eq!(decision.savings, lkr(dec!(50.00)));
        assert_eq!(decision.policy.identifier(), "BULK_DISCOUNT");
        assert!(decision.has_savings());
    }

    #[test]
    fn test_bulk_discount_below_minimum_falls_back_to_regular() {
        let mut selector = PricingSelector::new();
        selector
            .register(PricingPolicy::bulk_discount(10, dec!(5)).unwrap())
            .unwrap();

        let decision = selector
            .select_best(&lkr(dec!(100.00)), 9, &CustomerClass::regular())
            .unwrap();

        assert_eq!(decision.policy, PricingPolicy::Regular);
        assert_eq!(decision.final_price, lkr(dec!(900.00)));
        assert!(!decision.has_savings());
    }

    #[test]
    fn test_vip_only_for_vip_customers() {
        let mut selector = PricingSelector::new();
        selector.register(PricingPolicy::vip(dec!(10)).unwrap()).unwrap();

        let base = lkr(dec!(20.00));
        let regular = selector.select_best(&base, 2, &CustomerClass::regular()).unwrap();
        assert_eq!(regular.policy, PricingPolicy::Regular);

        let vip = selector.select_best(&base, 2, &"vip".into()).unwrap();
        assert_eq!(vip.final_price, lkr(dec!(36.00)));
        assert_eq!(vip.policy_name, "VIP Discount (10% off)");
    }

    #[test]
    fn test_cheapest_policy_wins() {
        let mut selector = PricingSelector::new();
        selector
            .register(PricingPolicy::bulk_discount(5, dec!(5)).unwrap())
            .unwrap();
        selector.register(PricingPolicy::vip(dec!(12.5)).unwrap()).unwrap();

        let decision = selector
            .select_best(&lkr(dec!(10.00)), 5, &CustomerClass::vip())
            .unwrap();
        assert_eq!(decision.final_price, lkr(dec!(43.75)));
        assert_eq!(decision.policy.identifier(), "VIP");
    }

    #[test]
    fn test_ties_keep_first_registered() {
        let mut selector = PricingSelector::new();
        selector
            .register(PricingPolicy::bulk_discount(10, dec!(5)).unwrap())
            .unwrap();
        selector.register(PricingPolicy::vip(dec!(5)).unwrap()).unwrap();

        let decision = selector
            .select_best(&lkr(dec!(100.00)), 10, &CustomerClass::vip())
            .unwrap();
        assert_eq!(decision.policy.identifier(), "BULK_DISCOUNT");
    }

    #[test]
    fn test_zero_discount_keeps_regular() {
        let mut selector = PricingSelector::new();
        selector.register(PricingPolicy::vip(dec!(0)).unwrap()).unwrap();

        let decision = selector
            .select_best(&lkr(dec!(3.00)), 1, &CustomerClass::vip())
            .unwrap();
        assert_eq!(decision.policy, PricingPolicy::Regular);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut selector = PricingSelector::new();
        let err = selector.register(PricingPolicy::Regular).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateRegistration);

        selector.register(PricingPolicy::vip(dec!(10)).unwrap()).unwrap();
        assert!(selector.register(PricingPolicy::vip(dec!(10)).unwrap()).is_err());
        // Same kind, different parameters is a different policy.
        assert!(selector.register(PricingPolicy::vip(dec!(15)).unwrap()).is_ok());
        assert_eq!(selector.policies().len(), 3);
    }

    #[test]
    fn test_policy_constructors_validate() {
        assert!(PricingPolicy::bulk_discount(0, dec!(5)).is_err());
        assert!(PricingPolicy::bulk_discount(10, dec!(101)).is_err());
        assert!(PricingPolicy::vip(dec!(-1)).is_err());
    }

    #[test]
    fn test_applicable_lists_in_order() {
        let mut selector = PricingSelector::new();
        selector
            .register(PricingPolicy::bulk_discount(3, dec!(5)).unwrap())
            .unwrap();
        selector.register(PricingPolicy::vip(dec!(10)).unwrap()).unwrap();

        let base = lkr(dec!(1.00));
        let names: Vec<_> = selector
            .applicable(&base, 3, &CustomerClass::regular())
            .iter()
            .map(|p| p.identifier())
            .collect();
        assert_eq!(names, vec!["REGULAR", "BULK_DISCOUNT"]);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let selector = PricingSelector::new();
        let err = selector
            .select_best(&lkr(dec!(1.00)), 0, &CustomerClass::regular())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_policy_serialization() {
        let policy = PricingPolicy::bulk_discount(10, dec!(5)).unwrap();
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["type"], "bulk_discount");
        assert_eq!(json["min_quantity"], 10);
    }

    proptest! {
        #[test]
        fn selected_price_never_exceeds_baseline(
            base_cents in 0i64..1_000_000,
            quantity in 1i64..500,
            bulk_min in 1i64..100,
            bulk_pct in 0u32..=100,
            vip_pct in 0u32..=100,
            is_vip in any::<bool>(),
        ) {
            let currency = CurrencyCode::new("LKR").unwrap();
            let base = Money::from_cents(base_cents, currency).unwrap();
            let mut selector = PricingSelector::new();
            selector
                .register(PricingPolicy::bulk_discount(bulk_min, Decimal::from(bulk_pct)).unwrap())
                .unwrap();
            selector.register(PricingPolicy::vip(Decimal::from(vip_pct)).unwrap()).unwrap();

            let class = if is_vip { CustomerClass::vip() } else { CustomerClass::regular() };
            let decision = selector.select_best(&base, quantity, &class).unwrap();

            prop_assert!(decision.final_price.cents() <= decision.original_price.cents());
            prop_assert_eq!(
                decision.savings.cents(),
                decision.original_price.cents() - decision.final_price.cents()
            );
        }
    }
}
