//! Back-office catalog records
//!
//! Product and tax payloads arrive loosely typed from the back-office
//! server. They are deserialized once, here, into fixed records: unknown
//! fields are ignored, missing fields take their default.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use crate::domain::value_objects::{round_unit_price, Sku, TaxId};
use crate::{ConnectorError, Result};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProductDetails {
    #[serde(rename = "SKU", deserialize_with = "lenient_string")]
    pub sku: String,
    pub description: String,
    pub category_id: i32,
    pub subcategory_id: i32,
    pub our_stock_code: String,
    #[serde(rename = "EANCode")]
    pub ean_code: String,
    pub manufacturer_stock_code: String,
    pub supplier_stock_code: String,
    pub manufacturer_id: i32,
    pub cost_price: Decimal,
    pub markup: Decimal,
    pub comments: String,
    pub stock_level: i32,
    pub discontinued: bool,
    pub price_change_date: Option<NaiveDateTime>,
    pub min_stock_level: i32,
    pub reorder_qty: i32,
    pub reorder_when_low: bool,
    pub supplier_id: i32,
    pub retail_margin: Decimal,
    pub trade_margin: Decimal,
    pub tax_id: i32,
    pub last_stock_check_date: Option<NaiveDateTime>,
    pub published: bool,
    pub allocatable: bool,
    pub loyalty_points: i32,
    #[serde(deserialize_with = "sanitized_weight")]
    pub weight: f64,
    pub item_type_id: i32,
    pub location_id: i32,
    pub discontinue_when_depleted: bool,
    pub web_info_present: bool,
    pub tags: String,
    pub condition_id: i32,
    pub condition_description: String,
    pub use_second_hand_vat: bool,
}

impl ProductDetails {
    /// Parses a raw product payload. The SKU is the only required field.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self> {
        let details: Self = serde_json::from_value(payload.clone())?;
        details.sku()?;
        Ok(details)
    }

    pub fn sku(&self) -> Result<Sku> {
        Sku::new(self.sku.as_str()).map_err(|e| ConnectorError::MalformedInput(format!("product SKU: {e}")))
    }

    /// Retail price from cost price and retail margin (a percentage of the
    /// selling price), rounded to 4 decimal places.
    pub fn retail_price(&self) -> Decimal {
        let divisor = Decimal::ONE_HUNDRED - self.retail_margin;
        if divisor <= Decimal::ZERO {
            return self.cost_price;
        }
        round_unit_price(self.cost_price / divisor * Decimal::ONE_HUNDRED)
    }
}

/// Web description for a product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProductInfo {
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxRateDetails {
    pub tax_id: TaxId,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub is_default_tax_code: bool,
    pub rate: Decimal,
    #[serde(default)]
    pub tax_description: String,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Non-numeric weights become 0.
fn sanitized_weight<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
