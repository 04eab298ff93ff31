//! # Bill Module
//!
//! Incremental, validated construction of a sale transaction.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     BillAccumulator Lifecycle                           │
//! │                                                                         │
//! │   new(currency)                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────┐  with_*()  add_item*()  remove_last_item()  clear_items() │
//! │  │ Building │◄──────────────────────────────────────────────────┐      │
//! │  └────┬─────┘                                                    │      │
//! │       │ build()  ── missing field / no items / short cash ──► Err ┘     │
//! │       ▼                                                                 │
//! │  ┌───────────┐                                                          │
//! │  │ Finalized │  every further mutation ──► Err(AlreadyFinalized)        │
//! │  └───────────┘                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BillSnapshot (immutable, owns its own copy of the items)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! After every item mutation the totals are recomputed from scratch over all
//! items:
//! - `subtotal = Σ unit_price × quantity`
//! - `total_discount = Σ line discount`
//! - `final_total = subtotal − total_discount`
//!
//! Global discounts are added on top when their setters are called. They are
//! cumulative (calling a setter twice applies the discount twice) and an item
//! mutation afterwards resets `total_discount` to the line discounts, so apply
//! global discounts once the item list is final.
//!
//! ## Thread Safety
//! None. One accumulator per in-flight sale, driven by one flow at a time.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{CurrencyCode, Money};
use crate::types::{BatchRef, ChannelRef, CustomerRef, EmployeeRef, ProductRef};
use crate::validation::{validate_identifier, validate_percentage, validate_quantity};

// =============================================================================
// Bill Line Item
// =============================================================================

/// One product/batch/quantity/price/discount entry within a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillLineItem {
    pub product: ProductRef,
    pub batch: BatchRef,
    pub quantity: i64,
    pub unit_price: Money,
    /// 0-100.
    #[ts(as = "String")]
    pub discount_percentage: Decimal,
    pub discount_amount: Money,
    /// `quantity × unit_price − discount_amount`, never negative.
    pub line_total: Money,
}

impl BillLineItem {
    /// `unit_price × quantity` before the line discount.
    pub fn gross_amount(&self) -> CoreResult<Money> {
        self.unit_price.multiply_by_quantity(self.quantity)
    }
}

// =============================================================================
// Bill Snapshot
// =============================================================================

/// Immutable result of [`BillAccumulator::build`].
///
/// Handed to the persistence collaborator for storage and to the receipt
/// renderer. There is no way to mutate it after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillSnapshot {
    serial_number: String,
    #[ts(as = "String")]
    bill_date: DateTime<Utc>,
    sales_channel: ChannelRef,
    employee: EmployeeRef,
    customer: Option<CustomerRef>,
    delivery_address: Option<String>,
    items: Vec<BillLineItem>,
    subtotal: Money,
    total_discount: Money,
    final_total: Money,
    cash_tendered: Option<Money>,
    change_amount: Option<Money>,
}

impl BillSnapshot {
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn bill_date(&self) -> DateTime<Utc> {
        self.bill_date
    }

    pub fn sales_channel(&self) -> &ChannelRef {
        &self.sales_channel
    }

    pub fn employee(&self) -> &EmployeeRef {
        &self.employee
    }

    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }

    pub fn delivery_address(&self) -> Option<&str> {
        self.delivery_address.as_deref()
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[BillLineItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.quantity))
    }

    pub fn currency(&self) -> CurrencyCode {
        self.final_total.currency()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn total_discount(&self) -> Money {
        self.total_discount
    }

    pub fn final_total(&self) -> Money {
        self.final_total
    }

    pub fn cash_tendered(&self) -> Option<Money> {
        self.cash_tendered
    }

    pub fn change_amount(&self) -> Option<Money> {
        self.change_amount
    }
}

// =============================================================================
// Bill Accumulator
// =============================================================================

/// Accumulator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillState {
    Building,
    Finalized,
}

/// Stateful builder for one sale.
///
/// ## Example
/// ```rust
/// use meridian_core::bill::BillAccumulator;
/// use meridian_core::money::{CurrencyCode, Money};
/// use meridian_core::types::*;
/// use rust_decimal::Decimal;
///
/// let lkr = CurrencyCode::new("LKR").unwrap();
/// let mut bill = BillAccumulator::new(lkr);
/// bill.with_serial_number("BILL-20261016-0001").unwrap()
///     .with_sales_channel(ChannelRef::new("pos-1", ChannelKind::PointOfSale).unwrap()).unwrap()
///     .with_employee(EmployeeRef::new("emp-7", "Nimal").unwrap()).unwrap();
///
/// let milk = ProductRef::new("p-1", "MLK-1L", "Milk 1L").unwrap();
/// let batch = BatchRef::new("b-1", "B001").unwrap();
/// bill.add_item(milk, batch, 3, Money::new(Decimal::new(5000, 2), lkr).unwrap()).unwrap();
///
/// let snapshot = bill.build().unwrap();
/// assert_eq!(snapshot.final_total().cents(), 15000);
/// ```
#[derive(Debug, Clone)]
pub struct BillAccumulator {
    state: BillState,
    currency: CurrencyCode,
    serial_number: Option<String>,
    bill_date: DateTime<Utc>,
    sales_channel: Option<ChannelRef>,
    employee: Option<EmployeeRef>,
    customer: Option<CustomerRef>,
    delivery_address: Option<String>,
    items: Vec<BillLineItem>,
    subtotal: Money,
    total_discount: Money,
    final_total: Money,
    /// Global discount folded into `total_discount` since the last recompute.
    global_discount: Money,
    cash_tendered: Option<Money>,
}

impl BillAccumulator {
    /// Starts an empty bill dated now.
    pub fn new(currency: CurrencyCode) -> Self {
        BillAccumulator {
            state: BillState::Building,
            currency,
            serial_number: None,
            bill_date: Utc::now(),
            sales_channel: None,
            employee: None,
            customer: None,
            delivery_address: None,
            items: Vec::new(),
            subtotal: Money::zero(currency),
            total_discount: Money::zero(currency),
            final_total: Money::zero(currency),
            global_discount: Money::zero(currency),
            cash_tendered: None,
        }
    }

    fn ensure_building(&self) -> CoreResult<()> {
        match self.state {
            BillState::Building => Ok(()),
            BillState::Finalized => Err(CoreError::AlreadyFinalized {
                serial: self.serial_number.clone().unwrap_or_default(),
            }),
        }
    }

    fn ensure_currency(&self, amount: &Money) -> CoreResult<()> {
        if amount.currency() != self.currency {
            return Err(CoreError::CurrencyMismatch {
                expected: self.currency.to_string(),
                actual: amount.currency().to_string(),
            });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Header setters
    // -------------------------------------------------------------------------

    pub fn with_serial_number(&mut self, serial: impl Into<String>) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        self.serial_number = Some(serial.into());
        Ok(self)
    }

    pub fn with_bill_date(&mut self, date: DateTime<Utc>) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        self.bill_date = date;
        Ok(self)
    }

    pub fn with_sales_channel(&mut self, channel: ChannelRef) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        self.sales_channel = Some(channel);
        Ok(self)
    }

    pub fn with_employee(&mut self, employee: EmployeeRef) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        self.employee = Some(employee);
        Ok(self)
    }

    pub fn with_customer(&mut self, customer: CustomerRef) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        self.customer = Some(customer);
        Ok(self)
    }

    pub fn with_delivery_address(&mut self, address: impl Into<String>) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        self.delivery_address = Some(address.into());
        Ok(self)
    }

    /// Cash handed over by the customer; change is computed at build time.
    pub fn with_cash_tendered(&mut self, cash: Money) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        self.ensure_currency(&cash)?;
        self.cash_tendered = Some(cash);
        Ok(self)
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Adds a line with no discount.
    pub fn add_item(
        &mut self,
        product: ProductRef,
        batch: BatchRef,
        quantity: i64,
        unit_price: Money,
    ) -> CoreResult<&mut Self> {
        let no_discount = Money::zero(self.currency);
        self.add_item_with_discount(product, batch, quantity, unit_price, Decimal::ZERO, no_discount)
    }

    /// Adds a line with an explicit percentage and amount.
    ///
    /// The amount is what gets subtracted; the percentage is recorded as given.
    pub fn add_item_with_discount(
        &mut self,
        product: ProductRef,
        batch: BatchRef,
        quantity: i64,
        unit_price: Money,
        discount_percentage: Decimal,
        discount_amount: Money,
    ) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        validate_identifier("product id", &product.id)?;
        validate_identifier("batch id", &batch.id)?;
        validate_quantity(quantity)?;
        self.ensure_currency(&unit_price)?;
        self.ensure_currency(&discount_amount)?;

        // Free lines skip the money overflow check, so the unit count needs its own.
        self.items
            .iter()
            .try_fold(quantity, |total, item| total.checked_add(item.quantity))
            .ok_or(CoreError::Overflow("bill quantity"))?;

        let gross = unit_price.multiply_by_quantity(quantity)?;
        let line_total = gross.subtract(&discount_amount).map_err(|_| {
            CoreError::InvalidArgument(format!(
                "discount {} exceeds line amount {} for {}",
                discount_amount, gross, product
            ))
        })?;
        validate_percentage("discount percentage", discount_percentage)?;

        debug!(
            product = %product.code,
            quantity,
            unit_price = %unit_price,
            discount = %discount_amount,
            "Adding bill line"
        );

        self.items.push(BillLineItem {
            product,
            batch,
            quantity,
            unit_price,
            discount_percentage,
            discount_amount,
            line_total,
        });

        if let Err(err) = self.recalculate_totals() {
            self.items.pop();
            return Err(err);
        }
        Ok(self)
    }

    /// Adds a line discounted by a percentage; the amount is derived.
    pub fn add_item_with_percentage_discount(
        &mut self,
        product: ProductRef,
        batch: BatchRef,
        quantity: i64,
        unit_price: Money,
        discount_percentage: Decimal,
    ) -> CoreResult<&mut Self> {
        validate_percentage("discount percentage", discount_percentage)?;
        let gross = unit_price.multiply_by_quantity(quantity.max(0))?;
        let amount = gross.percentage(discount_percentage)?;
        self.add_item_with_discount(product, batch, quantity, unit_price, discount_percentage, amount)
    }

    /// Adds a line discounted by a fixed amount; the percentage is derived.
    pub fn add_item_with_amount_discount(
        &mut self,
        product: ProductRef,
        batch: BatchRef,
        quantity: i64,
        unit_price: Money,
        discount_amount: Money,
    ) -> CoreResult<&mut Self> {
        let gross = unit_price.multiply_by_quantity(quantity.max(0))?;
        let percentage = if gross.is_zero() {
            Decimal::ZERO
        } else {
            (discount_amount.amount() / gross.amount() * Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .normalize()
        };
        self.add_item_with_discount(product, batch, quantity, unit_price, percentage, discount_amount)
    }

    /// Drops the most recent line. No-op on an empty bill.
    pub fn remove_last_item(&mut self) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        if self.items.pop().is_some() {
            self.recalculate_totals()?;
        }
        Ok(self)
    }

    /// Drops every line. No-op on an empty bill.
    pub fn clear_items(&mut self) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        if !self.items.is_empty() {
            self.items.clear();
            self.recalculate_totals()?;
        }
        Ok(self)
    }

    // -------------------------------------------------------------------------
    // Global discounts
    // -------------------------------------------------------------------------

    /// Adds `pct` percent of the current subtotal to the total discount.
    ///
    /// Cumulative: two calls with 10 apply 10% of the subtotal twice.
    pub fn with_global_discount_percentage(&mut self, pct: Decimal) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        validate_percentage("global discount percentage", pct)?;
        let discount = self.subtotal.percentage(pct)?;
        self.apply_global_discount(discount)?;
        Ok(self)
    }

    /// Adds a fixed amount to the total discount. Cumulative.
    pub fn with_global_discount_amount(&mut self, amount: Money) -> CoreResult<&mut Self> {
        self.ensure_building()?;
        self.ensure_currency(&amount)?;
        self.apply_global_discount(amount)?;
        Ok(self)
    }

    fn apply_global_discount(&mut self, discount: Money) -> CoreResult<()> {
        let total_discount = self.total_discount.add(&discount)?;
        let final_total = self.subtotal.subtract(&total_discount)?;

        self.global_discount = self.global_discount.add(&discount)?;
        self.total_discount = total_discount;
        self.final_total = final_total;
        debug!(discount = %discount, final_total = %final_total, "Applied global discount");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Totals
    // -------------------------------------------------------------------------

    fn recalculate_totals(&mut self) -> CoreResult<()> {
        let mut subtotal = Money::zero(self.currency);
        let mut total_discount = Money::zero(self.currency);

        for item in &self.items {
            subtotal = subtotal.add(&item.gross_amount()?)?;
            total_discount = total_discount.add(&item.discount_amount)?;
        }
        let final_total = subtotal.subtract(&total_discount)?;

        if self.global_discount.is_positive() {
            debug!(
                discarded = %self.global_discount,
                "Item change reset global discount"
            );
        }

        self.subtotal = subtotal;
        self.total_discount = total_discount;
        self.final_total = final_total;
        self.global_discount = Money::zero(self.currency);
        Ok(())
    }

    pub fn state(&self) -> BillState {
        self.state
    }

    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub fn items(&self) -> &[BillLineItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn total_discount(&self) -> Money {
        self.total_discount
    }

    pub fn final_total(&self) -> Money {
        self.final_total
    }

    // -------------------------------------------------------------------------
    // Build
    // -------------------------------------------------------------------------

    /// Validates the bill and produces its immutable snapshot.
    ///
    /// ## Preconditions (checked in this order)
    /// 1. serial number set and non-blank
    /// 2. sales channel set
    /// 3. employee set
    /// 4. at least one item
    /// 5. cash tendered, if set, covers the final total
    ///
    /// On success the accumulator becomes `Finalized`. On failure nothing
    /// changes and the caller can fix the bill and retry.
    pub fn build(&mut self) -> CoreResult<BillSnapshot> {
        self.ensure_building()?;

        let serial_number = self
            .serial_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CoreError::MissingField {
                field: "bill serial number",
            })?
            .to_string();
        let sales_channel = self.sales_channel.clone().ok_or(CoreError::MissingField {
            field: "sales channel",
        })?;
        let employee = self
            .employee
            .clone()
            .ok_or(CoreError::MissingField { field: "employee" })?;
        if self.items.is_empty() {
            return Err(CoreError::EmptyBill);
        }

        let change_amount = match &self.cash_tendered {
            Some(cash) => Some(cash.subtract(&self.final_total).map_err(|_| {
                CoreError::InsufficientCash {
                    tendered: cash.to_string(),
                    total: self.final_total.to_string(),
                }
            })?),
            None => None,
        };

        let snapshot = BillSnapshot {
            serial_number,
            bill_date: self.bill_date,
            sales_channel,
            employee,
            customer: self.customer.clone(),
            delivery_address: self.delivery_address.clone(),
            items: self.items.clone(),
            subtotal: self.subtotal,
            total_discount: self.total_discount,
            final_total: self.final_total,
            cash_tendered: self.cash_tendered,
            change_amount,
        };

        self.state = BillState::Finalized;
        info!(
            serial = %snapshot.serial_number,
            items = snapshot.items.len(),
            subtotal = %snapshot.subtotal,
            discount = %snapshot.total_discount,
            total = %snapshot.final_total,
            "Bill finalized"
        );
        Ok(snapshot)
    }
}

// =============================================================================
// Serial Numbers
// =============================================================================

/// Generates `"{prefix}-{yyyymmdd}-{seq:04}"` bill serials.
///
/// The counter is shared, so one generator can serve several registers.
/// Resume after a restart with [`BillSerialGenerator::starting_after`], passing
/// the last sequence the persistence collaborator stored.
#[derive(Debug)]
pub struct BillSerialGenerator {
    prefix: String,
    sequence: AtomicU64,
}

impl BillSerialGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_after(prefix, 0)
    }

    pub fn starting_after(prefix: impl Into<String>, last_sequence: u64) -> Self {
        BillSerialGenerator {
            prefix: prefix.into(),
            sequence: AtomicU64::new(last_sequence),
        }
    }

    /// Next serial for a bill dated `date`.
    pub fn next_serial(&self, date: NaiveDate) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}-{:04}", self.prefix, date.format("%Y%m%d"), seq)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::ChannelKind;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn lkr() -> CurrencyCode {
        CurrencyCode::new("LKR").unwrap()
    }

    fn money(amount: Decimal) -> Money {
        Money::new(amount, lkr()).unwrap()
    }

    fn product(n: u32) -> ProductRef {
        ProductRef::new(format!("p-{}", n), format!("SKU-{}", n), format!("Product {}", n)).unwrap()
    }

    fn batch(n: u32) -> BatchRef {
        BatchRef::new(format!("b-{}", n), format!("B{:03}", n)).unwrap()
    }

    fn ready_bill() -> BillAccumulator {
        let mut bill = BillAccumulator::new(lkr());
        bill.with_serial_number("BILL-20261016-0001")
            .unwrap()
            .with_sales_channel(ChannelRef::new("pos-1", ChannelKind::PointOfSale).unwrap())
            .unwrap()
            .with_employee(EmployeeRef::new("emp-1", "Kamala").unwrap())
            .unwrap();
        bill
    }

    /// 50.00 × 3, then 20.00 × 2 with 5.00 off.
    fn sample_bill() -> BillAccumulator {
        let mut bill = ready_bill();
        bill.add_item(product(1), batch(1), 3, money(dec!(50.00)))
            .unwrap()
            .add_item_with_amount_discount(product(2), batch(2), 2, money(dec!(20.00)), money(dec!(5.00)))
            .unwrap();
        bill
    }

    #[test]
    fn test_totals_after_adding_items() {
        let bill = sample_bill();
        assert_eq!(bill.subtotal(), money(dec!(190.00)));
        assert_eq!(bill.total_discount(), money(dec!(5.00)));
        assert_eq!(bill.final_total(), money(dec!(185.00)));

        let second = &bill.items()[1];
        assert_eq!(second.line_total, money(dec!(35.00)));
        assert_eq!(second.discount_percentage, dec!(12.5));
    }

    #[test]
    fn test_build_computes_change() {
        let mut bill = sample_bill();
        bill.with_cash_tendered(money(dec!(200.00))).unwrap();
        let snapshot = bill.build().unwrap();

        assert_eq!(snapshot.change_amount(), Some(money(dec!(15.00))));
        assert_eq!(snapshot.cash_tendered(), Some(money(dec!(200.00))));
        assert_eq!(snapshot.item_count(), 2);
        assert_eq!(snapshot.total_quantity(), 5);
        assert_eq!(snapshot.serial_number(), "BILL-20261016-0001");
        assert_eq!(bill.state(), BillState::Finalized);
    }

    #[test]
    fn test_build_fails_on_insufficient_cash() {
        let mut bill = sample_bill();
        bill.with_cash_tendered(money(dec!(100.00))).unwrap();
        let err = bill.build().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InsufficientCash);
        assert!(err.to_string().contains("less than the bill total"));
        // Still building; the cashier can take more cash and retry.
        assert_eq!(bill.state(), BillState::Building);
        bill.with_cash_tendered(money(dec!(185.00))).unwrap();
        assert!(bill.build().unwrap().change_amount().unwrap().is_zero());
    }

    #[test]
    fn test_build_without_cash_has_no_change() {
        let snapshot = sample_bill().build().unwrap();
        assert!(snapshot.cash_tendered().is_none());
        assert!(snapshot.change_amount().is_none());
    }

    #[test]
    fn test_build_reports_each_missing_field() {
        let mut bill = BillAccumulator::new(lkr());
        bill.add_item(product(1), batch(1), 1, money(dec!(1.00))).unwrap();

        let err = bill.build().unwrap_err();
        assert!(matches!(err, CoreError::MissingField { field: "bill serial number" }));

        bill.with_serial_number("   ").unwrap();
        assert!(matches!(
            bill.build().unwrap_err(),
            CoreError::MissingField { field: "bill serial number" }
        ));

        bill.with_serial_number("S-1").unwrap();
        assert!(matches!(
            bill.build().unwrap_err(),
            CoreError::MissingField { field: "sales channel" }
        ));

        bill.with_sales_channel(ChannelRef::new("web", ChannelKind::Online).unwrap())
            .unwrap();
        assert!(matches!(
            bill.build().unwrap_err(),
            CoreError::MissingField { field: "employee" }
        ));

        bill.with_employee(EmployeeRef::new("e", "E").unwrap()).unwrap();
        assert!(bill.build().is_ok());
    }

    #[test]
    fn test_build_rejects_empty_bill() {
        let mut bill = ready_bill();
        let err = bill.build().unwrap_err();
        assert!(matches!(err, CoreError::EmptyBill));
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }

    #[test]
    fn test_finalized_bill_rejects_mutation() {
        let mut bill = sample_bill();
        bill.build().unwrap();

        let err = bill
            .add_item(product(3), batch(3), 1, money(dec!(1.00)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalState);
        assert!(bill.remove_last_item().is_err());
        assert!(bill.clear_items().is_err());
        assert!(bill.with_global_discount_amount(money(dec!(1.00))).is_err());
        assert!(bill.with_customer(CustomerRef::new("c", "C", "VIP".into()).unwrap()).is_err());
        assert!(bill.build().is_err());
    }

    #[test]
    fn test_snapshot_is_independent_of_accumulator() {
        let mut bill = sample_bill();
        let snapshot = bill.build().unwrap();
        let items_before = snapshot.items().to_vec();
        drop(bill);
        assert_eq!(snapshot.items(), items_before.as_slice());
    }

    #[test]
    fn test_add_item_validation() {
        let mut bill = ready_bill();

        let err = bill.add_item(product(1), batch(1), 0, money(dec!(1.00))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut blank = product(1);
        blank.id = String::new();
        assert!(bill.add_item(blank, batch(1), 1, money(dec!(1.00))).is_err());

        let usd = Money::parse(dec!(1.00), "USD").unwrap();
        let err = bill.add_item(product(1), batch(1), 1, usd).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CurrencyMismatch);

        let err = bill
            .add_item_with_amount_discount(product(1), batch(1), 1, money(dec!(1.00)), money(dec!(2.00)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert!(bill
            .add_item_with_percentage_discount(product(1), batch(1), 1, money(dec!(1.00)), dec!(120))
            .is_err());
        assert!(bill.is_empty());
    }

    #[test]
    fn test_unit_count_overflow_rejected() {
        let mut bill = ready_bill();
        bill.add_item(product(1), batch(1), i64::MAX, money(dec!(0))).unwrap();

        let err = bill.add_item(product(2), batch(2), 1, money(dec!(0))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(bill.item_count(), 1);

        let snapshot = bill.build().unwrap();
        assert_eq!(snapshot.total_quantity(), i64::MAX);
    }

    #[test]
    fn test_free_item_allowed() {
        let mut bill = ready_bill();
        bill.add_item_with_amount_discount(product(1), batch(1), 2, money(dec!(0)), money(dec!(0)))
            .unwrap();
        assert!(bill.final_total().is_zero());
        assert_eq!(bill.items()[0].discount_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_percentage_discount_derives_amount() {
        let mut bill = ready_bill();
        bill.add_item_with_percentage_discount(product(1), batch(1), 3, money(dec!(3.33)), dec!(10))
            .unwrap();
        // 9.99 × 10% = 0.999 → 1.00
        assert_eq!(bill.items()[0].discount_amount, money(dec!(1.00)));
        assert_eq!(bill.final_total(), money(dec!(8.99)));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut bill = sample_bill();
        bill.remove_last_item().unwrap();
        assert_eq!(bill.subtotal(), money(dec!(150.00)));
        assert!(bill.total_discount().is_zero());
        assert_eq!(bill.final_total(), money(dec!(150.00)));

        bill.clear_items().unwrap();
        assert!(bill.is_empty());
        assert!(bill.final_total().is_zero());

        // No-ops on an empty bill
        bill.remove_last_item().unwrap().clear_items().unwrap();
        assert!(bill.subtotal().is_zero());
    }

    #[test]
    fn test_global_discount_percentage_uses_current_subtotal() {
        let mut bill = sample_bill();
        bill.with_global_discount_percentage(dec!(10)).unwrap();
        // 5.00 line discount + 10% of 190.00
        assert_eq!(bill.total_discount(), money(dec!(24.00)));
        assert_eq!(bill.final_total(), money(dec!(166.00)));
    }

    /// Global discount setters are cumulative, not idempotent. Calling one
    /// twice applies the discount twice.
    #[test]
    fn test_global_discount_compounds_when_called_twice() {
        let mut bill = sample_bill();
        bill.with_global_discount_percentage(dec!(10))
            .unwrap()
            .with_global_discount_percentage(dec!(10))
            .unwrap();
        assert_eq!(bill.total_discount(), money(dec!(43.00)));

        bill.with_global_discount_amount(money(dec!(2.00)))
            .unwrap()
            .with_global_discount_amount(money(dec!(2.00)))
            .unwrap();
        assert_eq!(bill.total_discount(), money(dec!(47.00)));
        assert_eq!(bill.final_total(), money(dec!(143.00)));
    }

    #[test]
    fn test_global_discount_cannot_exceed_subtotal() {
        let mut bill = sample_bill();
        let err = bill
            .with_global_discount_amount(money(dec!(186.00)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientAmount);
        assert_eq!(bill.final_total(), money(dec!(185.00)));
    }

    #[test]
    fn test_item_change_resets_global_discount() {
        let mut bill = sample_bill();
        bill.with_global_discount_amount(money(dec!(10.00))).unwrap();
        assert_eq!(bill.final_total(), money(dec!(175.00)));

        bill.add_item(product(3), batch(3), 1, money(dec!(10.00))).unwrap();
        assert_eq!(bill.total_discount(), money(dec!(5.00)));
        assert_eq!(bill.final_total(), money(dec!(195.00)));
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut bill = sample_bill();
        bill.with_customer(CustomerRef::new("c-1", "Ayesha", "vip".into()).unwrap())
            .unwrap()
            .with_delivery_address("12 Galle Road, Colombo")
            .unwrap();
        let snapshot = bill.build().unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["serialNumber"], "BILL-20261016-0001");
        assert_eq!(json["finalTotal"]["cents"], 18500);
        assert_eq!(json["items"][1]["discountPercentage"], "12.5");
        assert_eq!(json["customer"]["class"], "VIP");
        assert_eq!(json["deliveryAddress"], "12 Galle Road, Colombo");
    }

    #[test]
    fn test_serial_generator() {
        let generator = BillSerialGenerator::starting_after("BILL", 41);
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(generator.next_serial(date), "BILL-20261016-0042");
        assert_eq!(generator.next_serial(date), "BILL-20261016-0043");
        assert_eq!(BillSerialGenerator::new("WEB").next_serial(date), "WEB-20261016-0001");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { price_cents: i64, qty: i64, discount_pct: u32 },
        RemoveLast,
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0i64..100_000, 1i64..50, 0u32..=100).prop_map(|(price_cents, qty, discount_pct)| {
                Op::Add { price_cents, qty, discount_pct }
            }),
            1 => Just(Op::RemoveLast),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn totals_invariant_holds_after_every_mutation(ops in prop::collection::vec(op_strategy(), 1..30)) {
            let mut bill = ready_bill();
            for (n, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Add { price_cents, qty, discount_pct } => {
                        let price = Money::from_cents(price_cents, lkr()).unwrap();
                        bill.add_item_with_percentage_discount(
                            product(n as u32),
                            batch(n as u32),
                            qty,
                            price,
                            Decimal::from(discount_pct),
                        )
                        .unwrap();
                    }
                    Op::RemoveLast => {
                        bill.remove_last_item().unwrap();
                    }
                    Op::Clear => {
                        bill.clear_items().unwrap();
                    }
                }

                let expected = bill.subtotal().subtract(&bill.total_discount()).unwrap();
                prop_assert_eq!(bill.final_total(), expected);

                let gross: i64 = bill.items().iter().map(|i| i.unit_price.cents() * i.quantity).sum();
                prop_assert_eq!(bill.subtotal().cents(), gross);
            }
        }
    }
}
