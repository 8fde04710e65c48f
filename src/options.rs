//! Connector options
//!
//! Mappings and defaults that tie storefront concepts to back-office ids.
//! Loaded once and passed to whoever needs them; read-only during a build.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Sku, TaxId};
use crate::{ConnectorError, Result};

pub const DEFAULT_ORDER_TYPE_ID: i32 = 5;
pub const DEFAULT_PAYMENT_TERMS_ID: i32 = 1;
pub const DEFAULT_ORDER_STATUS_ID: i32 = 11;
pub const DEFAULT_ORDER_COMMENT: &str = "Internet Order";
pub const DEFAULT_CUSTOMER_TYPE_ID: i32 = 1;
pub const DEFAULT_CUSTOMER_RELATIONSHIP_ID: i32 = 3;
pub const DEFAULT_TAX_ID: TaxId = TaxId::new(2);
pub const DEFAULT_TAX_RATE: Decimal = dec!(20);
/// Payment mapping used when a payment method has no mapping of its own.
pub const DEFAULT_PAYMENT_METHOD: &str = "default";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorOptions {
    pub order_status_id: i32,
    pub order_type_id: i32,
    pub payment_terms_id: i32,
    pub order_comment: String,
    pub customer_type_id: i32,
    pub customer_relationship_id: i32,
    pub default_tax_id: TaxId,
    pub default_tax_rate: Decimal,
    /// Storefront tax class → back-office tax code. The standard class is "".
    pub tax_mappings: HashMap<String, TaxMapping>,
    pub discount_sku: String,
    /// Storefront shipping method → back-office SKU.
    pub shipping_mappings: HashMap<String, String>,
    /// Storefront payment method → back-office payment account and method.
    pub payment_mappings: HashMap<String, PaymentMapping>,
    pub ignore_product_updates: bool,
    pub ignore_price_updates: bool,
    pub ignore_stock_updates: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaxMapping {
    pub tax_id: TaxId,
    pub rate: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentMapping {
    pub account_id: i32,
    pub method_id: i32,
    pub enabled: bool,
    pub comment: String,
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        Self {
            order_status_id: DEFAULT_ORDER_STATUS_ID,
            order_type_id: DEFAULT_ORDER_TYPE_ID,
            payment_terms_id: DEFAULT_PAYMENT_TERMS_ID,
            order_comment: DEFAULT_ORDER_COMMENT.to_string(),
            customer_type_id: DEFAULT_CUSTOMER_TYPE_ID,
            customer_relationship_id: DEFAULT_CUSTOMER_RELATIONSHIP_ID,
            default_tax_id: DEFAULT_TAX_ID,
            default_tax_rate: DEFAULT_TAX_RATE,
            tax_mappings: HashMap::new(),
            discount_sku: String::new(),
            shipping_mappings: HashMap::new(),
            payment_mappings: HashMap::new(),
            ignore_product_updates: false,
            ignore_price_updates: false,
            ignore_stock_updates: false,
        }
    }
}

impl ConnectorOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConnectorError::Options(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConnectorError::Options(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Tax code for a storefront tax class, falling back to the default.
    pub fn tax_by_class(&self, tax_class: &str) -> TaxMapping {
        self.tax_mappings.get(tax_class).copied().unwrap_or(TaxMapping {
            tax_id: self.default_tax_id,
            rate: self.default_tax_rate,
        })
    }

    pub fn default_tax(&self) -> TaxMapping {
        TaxMapping { tax_id: self.default_tax_id, rate: self.default_tax_rate }
    }

    pub fn discount_sku(&self) -> Result<Sku> {
        Sku::new(self.discount_sku.as_str())
            .map_err(|e| ConnectorError::Options(format!("discount SKU: {e}")))
    }

    /// `None` when the method is unmapped or mapped to a negative number.
    pub fn shipping_sku(&self, method: &str) -> Option<Sku> {
        self.shipping_mappings
            .get(method)
            .filter(|sku| !sku.trim().parse::<i64>().is_ok_and(|n| n < 0))
            .and_then(|sku| Sku::new(sku.as_str()).ok())
    }

    pub fn payment_mapping(&self, method: &str) -> Option<&PaymentMapping> {
        self.payment_mappings.get(method)
    }

    pub fn is_payment_method_enabled(&self, method: &str) -> bool {
        self.payment_mapping(method).is_some_and(|m| m.enabled)
    }

    pub fn payment_comment(&self, method: &str) -> &str {
        self.payment_mapping(method).map(|m| m.comment.as_str()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: &str = r#"{
        "discount_sku": "900",
        "tax_mappings": { "reduced-rate": { "tax_id": 4, "rate": "5" } },
        "shipping_mappings": { "flat_rate": "801", "local_pickup": "-1", "collect": "-2", "courier": "A-100" },
        "payment_mappings": {
            "paypal": { "account_id": 3, "method_id": 7, "enabled": true, "comment": "PayPal" },
            "cod": { "account_id": 1, "method_id": 1, "enabled": false }
        }
    }"#;

    #[test]
    fn test_missing_fields_take_defaults() {
        let opts = ConnectorOptions::from_json(OPTIONS).unwrap();
        assert_eq!(opts.order_status_id, DEFAULT_ORDER_STATUS_ID);
        assert_eq!(opts.order_comment, "Internet Order");
        assert_eq!(opts.default_tax(), TaxMapping { tax_id: TaxId::new(2), rate: dec!(20) });
    }

    #[test]
    fn test_tax_lookup_falls_back_to_default() {
        let opts = ConnectorOptions::from_json(OPTIONS).unwrap();
        assert_eq!(opts.tax_by_class("reduced-rate").tax_id, TaxId::new(4));
        assert_eq!(opts.tax_by_class("zero-rate"), opts.default_tax());
    }

    #[test]
    fn test_shipping_sentinel_means_unmapped() {
        let opts = ConnectorOptions::from_json(OPTIONS).unwrap();
        assert_eq!(opts.shipping_sku("flat_rate").unwrap().as_str(), "801");
        assert!(opts.shipping_sku("local_pickup").is_none());
        assert!(opts.shipping_sku("collect").is_none());
        assert!(opts.shipping_sku("free_shipping").is_none());
        assert_eq!(opts.shipping_sku("courier").unwrap().as_str(), "A-100");
    }

    #[test]
    fn test_payment_lookups() {
        let opts = ConnectorOptions::from_json(OPTIONS).unwrap();
        assert!(opts.is_payment_method_enabled("paypal"));
        assert!(!opts.is_payment_method_enabled("cod"));
        assert!(!opts.is_payment_method_enabled("stripe"));
        assert_eq!(opts.payment_comment("paypal"), "PayPal");
        assert_eq!(opts.payment_comment("stripe"), "");
    }

    #[test]
    fn test_invalid_json_is_options_error() {
        assert!(matches!(ConnectorOptions::from_json("{ nope"), Err(ConnectorError::Options(_))));
    }

    #[test]
    fn test_empty_discount_sku_is_error() {
        assert!(ConnectorOptions::default().discount_sku().is_err());
    }
}
