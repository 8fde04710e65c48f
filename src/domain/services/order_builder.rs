//! Storefront order → normalized back-office order
//!
//! The build runs a fixed sequence of steps: header, customer, product
//! lines, coupons, shipping, payment. Coupons are split against the product
//! lines only, so they must run before shipping is added.

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::domain::aggregates::{NormalizedOrder, OrderCustomer, OrderDetail, OrderPayment, StorefrontOrder, LineItem, SALE_PAYMENT_TYPE_ID};
use crate::domain::services::coupon_splitter;
use crate::domain::value_objects::{round_unit_price, Sku};
use crate::options::{ConnectorOptions, DEFAULT_PAYMENT_METHOD};
use crate::{ConnectorError, Result};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const FOOTER_DATE_FORMAT: &str = "%d %b %Y at %H:%M";
const NOTES_FOOTER_RULE: &str = "______________________________";

pub struct OrderBuilder<'a> {
    options: &'a ConnectorOptions,
    now: NaiveDateTime,
}

impl<'a> OrderBuilder<'a> {
    pub fn new(options: &'a ConnectorOptions) -> Self {
        Self { options, now: Local::now().naive_local() }
    }

    /// Uses a fixed build time instead of the local clock.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn build(&self, source: &StorefrontOrder) -> Result<NormalizedOrder> {
        source.validate()?;

        let mut order = NormalizedOrder::new(source.order_no);
        self.map_header(source, &mut order);
        self.map_customer(source, &mut order);
        self.map_lines(source, &mut order)?;
        self.map_coupons(source, &mut order)?;
        self.map_shipping(source, &mut order);
        self.map_payment(source, &mut order);

        debug!(order_no = source.order_no, lines = order.order_details.len(), payments = order.payments.len(), "order built");
        Ok(order)
    }

    fn timestamp(&self) -> String {
        self.now.format(DATE_FORMAT).to_string()
    }

    fn map_header(&self, source: &StorefrontOrder, order: &mut NormalizedOrder) {
        let opts = self.options;
        let now = self.timestamp();

        order.ext_order_no = source.order_no;
        order.ext_customer_id = source.customer_id;
        order.date_placed = now.clone();
        order.status_id = opts.order_status_id;
        order.gross_total = source.total;
        order.tax_total = source.total_tax;
        order.net_total = source.total - source.total_tax;

        if opts.is_payment_method_enabled(&source.payment_method) {
            info!(order_no = source.order_no, method = %source.payment_method, "payment method enabled, marking order as paid");
            order.paid = true;
            order.date_paid = Some(now.clone());
        } else {
            info!(order_no = source.order_no, method = %source.payment_method, "payment method not enabled, payment to follow");
            order.paid = false;
            order.date_paid = None;
            order.notes = format!("Payment to follow - Payment method: {}. ", source.payment_method);
        }

        order.customer_ref = String::new();
        order.invoiced = true;
        order.date_invoiced = now.clone();
        order.comments = format!("{} {}", opts.order_comment, source.order_no);

        if let Some(note) = source.customer_note.as_deref().filter(|n| !n.is_empty()) {
            order.notes.push_str("\r\n\r\nCustomer Notes: ");
            order.notes.push_str(note);
        }

        order.date_ordered = now.clone();
        order.due_date = now.clone();
        order.due_time = now.clone();
        order.scheduled = false;
        order.duration = 0;
        order.priority = 0;
        order.recurring = false;
        order.recur_time_period = 0;
        order.due_date2 = now.clone();
        order.due_time2 = now;
        order.due_duration2 = 0;
        order.order_type = opts.order_type_id;
        order.payment_terms_id = opts.payment_terms_id;

        if !order.notes.is_empty() {
            order.notes.push_str(&format!(
                "\r\n\r\n - Comment auto generated by connector - {}\r\n{NOTES_FOOTER_RULE}",
                self.now.format(FOOTER_DATE_FORMAT)
            ));
        }
    }

    fn map_customer(&self, source: &StorefrontOrder, order: &mut NormalizedOrder) {
        let billing = &source.billing;
        let shipping = &source.shipping;

        order.customer = OrderCustomer {
            ext_customer_id: source.customer_id,
            company_name: billing.company.clone(),
            first_name: billing.first_name.clone(),
            surname: billing.last_name.clone(),
            address1: billing.address_1.clone(),
            address2: billing.address_2.clone(),
            town: billing.city.clone(),
            county: billing.state.clone(),
            postcode: billing.postcode.clone(),
            country: billing.country.clone(),
            home_tel: billing.phone.clone(),
            email: billing.email.clone(),
            delivery_first_name: shipping.first_name.clone(),
            delivery_surname: shipping.last_name.clone(),
            delivery_company_name: shipping.company.clone(),
            delivery_address1: shipping.address_1.clone(),
            delivery_address2: shipping.address_2.clone(),
            delivery_town: shipping.city.clone(),
            delivery_county: shipping.state.clone(),
            delivery_postcode: shipping.postcode.clone(),
            delivery_country: shipping.country.clone(),
            customer_type_id: self.options.customer_type_id,
            relationship_id: self.options.customer_relationship_id,
            // Left unset so existing back-office values are kept.
            trade_account: None,
            credit_limit: None,
            payment_terms_id: None,
            ..OrderCustomer::default()
        };
    }

    fn map_lines(&self, source: &StorefrontOrder, order: &mut NormalizedOrder) -> Result<()> {
        for item in &source.line_items {
            let sku = resolve_sku(item)?;
            let divisor = Decimal::from(item.quantity.max(1));
            let tax = self.options.tax_by_class(&item.tax_class);

            debug!(order_no = source.order_no, product_id = item.product_id, variation_id = item.variation_id, sku = %sku, "mapping line item");

            order.add_detail(OrderDetail {
                sku,
                qty: item.quantity,
                price: round_unit_price(item.line_subtotal / divisor),
                comments: String::new(),
                tax_rate: tax.rate,
                tax_id: tax.tax_id,
                spare: String::new(),
                ext_parent_id: 0,
                ext_order_details_id: item.product_id,
                ext_order_no: source.order_no,
                auto_allocate_stock: true,
            });
        }
        Ok(())
    }

    fn map_coupons(&self, source: &StorefrontOrder, order: &mut NormalizedOrder) -> Result<()> {
        let split_lines = coupon_splitter::split(order.details(), &source.coupons)?;
        if split_lines.is_empty() {
            return Ok(());
        }
        if source.coupons.len() > 1 {
            warn!(order_no = source.order_no, coupons = source.coupons.len(), "only the first coupon is sent");
        }

        let discount_sku = self.options.discount_sku()?;
        let several = split_lines.len() > 1;
        for split_line in split_lines {
            let comments = if several {
                format!("Coupon code: {} (@{}% Tax Rate)", split_line.code, split_line.tax_rate.normalize())
            } else {
                format!("Coupon code: {}", split_line.code)
            };

            order.add_detail(OrderDetail {
                sku: discount_sku.clone(),
                qty: 1,
                price: -split_line.amount,
                comments,
                tax_rate: split_line.tax_rate,
                tax_id: split_line.tax_id,
                spare: String::new(),
                ext_parent_id: 0,
                ext_order_details_id: 0,
                ext_order_no: source.order_no,
                auto_allocate_stock: false,
            });
        }
        Ok(())
    }

    fn map_shipping(&self, source: &StorefrontOrder, order: &mut NormalizedOrder) {
        for shipping in &source.shipping_methods {
            let method = shipping.method_name();
            let Some(sku) = self.options.shipping_sku(method) else {
                debug!(order_no = source.order_no, method, "shipping method not mapped, skipping");
                continue;
            };

            let tax = self.options.default_tax();
            order.add_detail(OrderDetail {
                sku,
                qty: 1,
                price: shipping.cost,
                comments: shipping.name.clone(),
                tax_rate: tax.rate,
                tax_id: tax.tax_id,
                spare: String::new(),
                ext_parent_id: 0,
                ext_order_details_id: 0,
                ext_order_no: source.order_no,
                auto_allocate_stock: true,
            });
        }
    }

    fn map_payment(&self, source: &StorefrontOrder, order: &mut NormalizedOrder) {
        let method = source.payment_method.as_str();
        let mapping = match self.options.payment_mapping(method) {
            Some(mapping) if mapping.enabled => mapping,
            Some(_) => {
                info!(order_no = source.order_no, method, "payment method not enabled, no payment record");
                return;
            }
            None => {
                info!(order_no = source.order_no, method, "unknown payment method, using default mapping");
                match self.options.payment_mapping(DEFAULT_PAYMENT_METHOD) {
                    Some(mapping) if mapping.enabled => mapping,
                    _ => {
                        info!(order_no = source.order_no, "default payment method not enabled, no payment record");
                        return;
                    }
                }
            }
        };

        order.add_payment(OrderPayment {
            payment_date: self.timestamp(),
            payment_account_id: mapping.account_id,
            transaction_ref: source.transaction_id.clone().unwrap_or_default(),
            payment_method_id: mapping.method_id,
            payment_type_id: SALE_PAYMENT_TYPE_ID,
            ext_order_no: source.order_no,
            comments: self.options.payment_comment(method).to_string(),
            amount: source.total,
        });
    }
}

/// A variation's own SKU wins; the default variation carries none, so the
/// parent product's SKU is used in its place.
fn resolve_sku(item: &LineItem) -> Result<Sku> {
    let non_empty = |sku: &Option<String>| sku.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    let raw = if item.is_variation() {
        non_empty(&item.variation_sku).or_else(|| {
            debug!(product_id = item.product_id, variation_id = item.variation_id, "variation has no SKU, using parent product SKU");
            non_empty(&item.product_sku)
        })
    } else {
        non_empty(&item.product_sku)
    };

    let raw = raw.ok_or_else(|| ConnectorError::MalformedInput(format!("no SKU for product {}", item.product_id)))?;
    Sku::new(raw).map_err(|e| ConnectorError::MalformedInput(format!("product {}: {e}", item.product_id)))
}
