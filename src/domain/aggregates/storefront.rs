//! Storefront Order (read-only input)
//!
//! What the storefront hands over for one order: header, addresses, line
//! items, shipping methods and coupons. Validated once at the boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct StorefrontOrder {
    #[validate(range(min = 1))]
    pub order_no: u64,
    #[serde(default)]
    pub customer_id: u64,
    pub total: Decimal,
    #[serde(default)]
    pub total_tax: Decimal,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub customer_note: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[validate]
    pub billing: BillingAddress,
    #[serde(default)]
    pub shipping: ShippingAddress,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingLine>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_customer_name"))]
pub struct BillingAddress {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub phone: String,
    pub email: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
}

/// A purchased product. `variation_id` is 0 for simple products.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: u64,
    #[serde(default)]
    pub variation_id: u64,
    #[serde(default)]
    pub product_sku: Option<String>,
    #[serde(default)]
    pub variation_sku: Option<String>,
    pub quantity: u32,
    pub line_subtotal: Decimal,
    #[serde(default)]
    pub tax_class: String,
}

impl LineItem {
    pub fn is_variation(&self) -> bool { self.variation_id != 0 }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShippingLine {
    /// Method id, optionally suffixed with `:<instance>`.
    pub method_id: String,
    #[serde(default)]
    pub name: String,
    pub cost: Decimal,
}

impl ShippingLine {
    /// Method id without any `:`-delimited instance qualifier.
    pub fn method_name(&self) -> &str {
        self.method_id.split(':').next().unwrap_or_default()
    }
}

/// A storefront coupon applied to the whole order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub amount: Decimal,
}

impl Coupon {
    pub fn new(code: impl Into<String>, amount: Decimal) -> Self { Self { code: code.into(), amount } }
}

fn validate_customer_name(billing: &BillingAddress) -> Result<(), ValidationError> {
    let named = [&billing.company, &billing.first_name, &billing.last_name]
        .iter()
        .any(|part| !part.trim().is_empty());
    if named { Ok(()) } else { Err(ValidationError::new("customer_name")) }
}
