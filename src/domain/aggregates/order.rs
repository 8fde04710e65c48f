//! Normalized Order Aggregate
//!
//! The back-office representation of a storefront order. Field names are
//! serialized in the back-office schema's PascalCase so the model can be
//! handed to the transport as-is.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Sku, TaxId};
use crate::{ConnectorError, Result};

/// Payment type id the back office uses for a sale.
pub const SALE_PAYMENT_TYPE_ID: i32 = 1;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NormalizedOrder {
    pub ext_order_no: u64,
    pub ext_customer_id: u64,
    pub date_placed: String,
    pub status_id: i32,
    pub paid: bool,
    pub date_paid: Option<String>,
    pub customer_ref: String,
    pub invoiced: bool,
    pub date_invoiced: String,
    pub comments: String,
    pub notes: String,
    pub date_ordered: String,
    pub due_date: String,
    pub due_time: String,
    pub scheduled: bool,
    pub duration: i32,
    pub priority: i32,
    pub recurring: bool,
    pub recur_time_period: i32,
    pub due_date2: String,
    pub due_time2: String,
    pub due_duration2: i32,
    pub order_type: i32,
    pub payment_terms_id: i32,
    pub net_total: Decimal,
    pub gross_total: Decimal,
    pub tax_total: Decimal,
    pub customer: OrderCustomer,
    pub order_details: Vec<OrderDetail>,
    pub payments: Vec<OrderPayment>,
}

/// Customer sub-record. The `Option` fields stay `None` so the back office
/// keeps whatever it already holds for them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderCustomer {
    pub ext_customer_id: u64,
    pub company_name: String,
    pub title: String,
    pub first_name: String,
    pub surname: String,
    pub job_title: String,
    pub address1: String,
    pub address2: String,
    pub address3: String,
    pub town: String,
    pub county: String,
    pub postcode: String,
    pub country: String,
    pub home_tel: String,
    pub email: String,
    pub delivery_first_name: String,
    pub delivery_surname: String,
    pub delivery_company_name: String,
    pub delivery_address1: String,
    pub delivery_address2: String,
    pub delivery_address3: String,
    pub delivery_town: String,
    pub delivery_county: String,
    pub delivery_postcode: String,
    pub delivery_country: String,
    pub delivery_tel: String,
    pub delivery_email: String,
    pub subscribe_to_newsletter: String,
    pub customer_type_id: i32,
    pub relationship_id: i32,
    pub trade_account: Option<bool>,
    pub credit_limit: Option<Decimal>,
    pub payment_terms_id: Option<i32>,
}

/// One order line: a product, a split discount or a shipping charge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderDetail {
    pub sku: Sku,
    pub qty: u32,
    pub price: Decimal,
    pub comments: String,
    pub tax_rate: Decimal,
    pub tax_id: TaxId,
    pub spare: String,
    pub ext_parent_id: u64,
    pub ext_order_details_id: u64,
    pub ext_order_no: u64,
    pub auto_allocate_stock: bool,
}

impl OrderDetail {
    pub fn line_total(&self) -> Result<Decimal> {
        self.price
            .checked_mul(Decimal::from(self.qty))
            .ok_or_else(|| ConnectorError::AmountOverflow(format!("line total for {}", self.sku)))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderPayment {
    pub payment_date: String,
    pub payment_account_id: i32,
    pub transaction_ref: String,
    pub payment_method_id: i32,
    pub payment_type_id: i32,
    pub ext_order_no: u64,
    pub comments: String,
    pub amount: Decimal,
}

impl NormalizedOrder {
    pub fn new(ext_order_no: u64) -> Self {
        Self { ext_order_no, ..Self::default() }
    }

    pub fn details(&self) -> &[OrderDetail] { &self.order_details }
    pub fn add_detail(&mut self, detail: OrderDetail) { self.order_details.push(detail); }
    pub fn add_payment(&mut self, payment: OrderPayment) { self.payments.push(payment); }

    /// Sum of every order line, discounts included.
    pub fn details_total(&self) -> Result<Decimal> {
        self.order_details.iter().try_fold(Decimal::ZERO, |sum, detail| {
            sum.checked_add(detail.line_total()?)
                .ok_or_else(|| ConnectorError::AmountOverflow("order details total".into()))
        })
    }
}
