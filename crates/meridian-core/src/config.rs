//! # Core Configuration
//!
//! Tunables for pricing, stock alerts and billing, passed in by the
//! composition root.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  composition root (app)                                                 │
//! │    reads file / env ──► CoreConfig::from_toml_str() ──► validate()      │
//! │                                  │                                      │
//! │        ┌──────────────┬──────────┴──────┬─────────────────┐             │
//! │        ▼              ▼                 ▼                 ▼             │
//! │  pricing_selector  alert_listener  serial_generator  stock_thresholds   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! This crate never reads files or environment variables; there is no global
//! instance.
//!
//! ## File Format
//! ```toml
//! currency = "LKR"
//!
//! [alerts]
//! capacity = 50
//!
//! [stock]
//! low_stock_threshold = 10
//! near_expiry_days = 7
//!
//! [pricing]
//! bulk_min_quantity = 10
//! bulk_discount_percentage = 5
//! vip_discount_percentage = 10
//!
//! [billing]
//! serial_prefix = "BILL"
//! ```
//! Every key is optional.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bill::BillSerialGenerator;
use crate::error::{CoreError, CoreResult};
use crate::events::{AlertListener, StockThresholds, DEFAULT_ALERT_CAPACITY};
use crate::money::CurrencyCode;
use crate::pricing::{PricingPolicy, PricingSelector};
use crate::validation::validate_percentage;

// =============================================================================
// Core Config
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// ISO 4217 code for every bill.
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub alerts: AlertConfig,

    #[serde(default)]
    pub stock: StockConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub billing: BillingConfig,
}

fn default_currency() -> String {
    "LKR".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            currency: default_currency(),
            alerts: AlertConfig::default(),
            stock: StockConfig::default(),
            pricing: PricingConfig::default(),
            billing: BillingConfig::default(),
        }
    }
}

/// Alert buffer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_alert_capacity")]
    pub capacity: usize,
}

fn default_alert_capacity() -> usize {
    DEFAULT_ALERT_CAPACITY
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            capacity: default_alert_capacity(),
        }
    }
}

/// Stock alert thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConfig {
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,

    #[serde(default = "default_near_expiry_days")]
    pub near_expiry_days: i64,
}

fn default_low_stock_threshold() -> i64 {
    10
}

fn default_near_expiry_days() -> i64 {
    7
}

impl Default for StockConfig {
    fn default() -> Self {
        StockConfig {
            low_stock_threshold: default_low_stock_threshold(),
            near_expiry_days: default_near_expiry_days(),
        }
    }
}

/// Discount policy parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_bulk_min_quantity")]
    pub bulk_min_quantity: i64,

    /// Accepts `5` or `"5.5"`.
    #[serde(default = "default_bulk_discount_percentage")]
    pub bulk_discount_percentage: Decimal,

    #[serde(default = "default_vip_discount_percentage")]
    pub vip_discount_percentage: Decimal,
}

fn default_bulk_min_quantity() -> i64 {
    10
}

fn default_bulk_discount_percentage() -> Decimal {
    Decimal::new(5, 0)
}

fn default_vip_discount_percentage() -> Decimal {
    Decimal::TEN
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            bulk_min_quantity: default_bulk_min_quantity(),
            bulk_discount_percentage: default_bulk_discount_percentage(),
            vip_discount_percentage: default_vip_discount_percentage(),
        }
    }
}

/// Bill serial settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_serial_prefix")]
    pub serial_prefix: String,
}

fn default_serial_prefix() -> String {
    "BILL".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        BillingConfig {
            serial_prefix: default_serial_prefix(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> CoreResult<Self> {
        let config: CoreConfig = toml::from_str(source)
            .map_err(|e| CoreError::Configuration(format!("invalid config: {}", e)))?;
        config.validate()?;
        debug!(currency = %config.currency, "Loaded core configuration");
        Ok(config)
    }

    /// Checks every value, reporting the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        self.currency_code()
            .map_err(|e| CoreError::Configuration(format!("currency: {}", e)))?;

        if self.alerts.capacity == 0 {
            return Err(CoreError::Configuration(
                "alerts.capacity must be at least 1".to_string(),
            ));
        }
        if self.stock.low_stock_threshold < 0 {
            return Err(CoreError::Configuration(
                "stock.low_stock_threshold cannot be negative".to_string(),
            ));
        }
        if self.stock.near_expiry_days < 0 {
            return Err(CoreError::Configuration(
                "stock.near_expiry_days cannot be negative".to_string(),
            ));
        }
        if self.pricing.bulk_min_quantity <= 0 {
            return Err(CoreError::Configuration(
                "pricing.bulk_min_quantity must be positive".to_string(),
            ));
        }
        for (field, pct) in [
            ("pricing.bulk_discount_percentage", self.pricing.bulk_discount_percentage),
            ("pricing.vip_discount_percentage", self.pricing.vip_discount_percentage),
        ] {
            validate_percentage(field, pct).map_err(|e| CoreError::Configuration(e.to_string()))?;
        }
        if self.billing.serial_prefix.trim().is_empty() {
            return Err(CoreError::Configuration(
                "billing.serial_prefix is required".to_string(),
            ));
        }

        Ok(())
    }

    pub fn currency_code(&self) -> CoreResult<CurrencyCode> {
        CurrencyCode::new(&self.currency)
    }

    /// Regular, bulk and VIP policies, registered in that order.
    pub fn pricing_selector(&self) -> CoreResult<PricingSelector> {
        let mut selector = PricingSelector::new();
        selector.register(PricingPolicy::bulk_discount(
            self.pricing.bulk_min_quantity,
            self.pricing.bulk_discount_percentage,
        )?)?;
        selector.register(PricingPolicy::vip(self.pricing.vip_discount_percentage)?)?;
        Ok(selector)
    }

    pub fn alert_listener(&self) -> CoreResult<AlertListener> {
        AlertListener::with_capacity(self.alerts.capacity)
    }

    pub fn serial_generator(&self) -> BillSerialGenerator {
        BillSerialGenerator::new(self.billing.serial_prefix.trim())
    }

    pub fn stock_thresholds(&self) -> StockThresholds {
        StockThresholds {
            low_stock_threshold: self.stock.low_stock_threshold,
            near_expiry_days: self.stock.near_expiry_days,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.alerts.capacity, 50);
        assert_eq!(config.pricing.vip_discount_percentage, dec!(10));
        assert_eq!(config.stock_thresholds(), StockThresholds::default());
    }

    #[test]
    fn test_partial_document() {
        let config = CoreConfig::from_toml_str(
            r#"
            currency = "usd"

            [pricing]
            bulk_discount_percentage = "7.5"

            [alerts]
            capacity = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.currency_code().unwrap().as_str(), "USD");
        assert_eq!(config.pricing.bulk_discount_percentage, dec!(7.5));
        assert_eq!(config.pricing.bulk_min_quantity, 10);
        assert_eq!(config.alert_listener().unwrap().capacity(), 3);
        assert_eq!(config.billing.serial_prefix, "BILL");
    }

    #[test]
    fn test_pricing_selector_order() {
        let selector = CoreConfig::default().pricing_selector().unwrap();
        let ids: Vec<_> = selector.policies().iter().map(|p| p.identifier()).collect();
        assert_eq!(ids, vec!["REGULAR", "BULK_DISCOUNT", "VIP"]);
    }

    #[test]
    fn test_serial_generator_uses_prefix() {
        let config = CoreConfig::from_toml_str("[billing]\nserial_prefix = \"WEB\"").unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(config.serial_generator().next_serial(date), "WEB-20260102-0001");
    }

    #[test]
    fn test_invalid_values_rejected() {
        for source in [
            "currency = \"RUPEES\"",
            "[alerts]\ncapacity = 0",
            "[pricing]\nbulk_min_quantity = 0",
            "[pricing]\nvip_discount_percentage = 150",
            "[billing]\nserial_prefix = \"  \"",
            "[stock]\nlow_stock_threshold = -1",
        ] {
            let err = CoreConfig::from_toml_str(source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{}", source);
        }
    }

    #[test]
    fn test_malformed_toml() {
        let err = CoreConfig::from_toml_str("currency = ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
