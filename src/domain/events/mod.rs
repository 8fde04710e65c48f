//! Domain events
use crate::domain::value_objects::{Sku, TaxId};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Catalog(CatalogEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Built { sync_id: Uuid, order_no: u64, lines: usize, gross_total: Decimal },
    Delivered { sync_id: Uuid, order_no: u64 },
    DeliveryFailed { sync_id: Uuid, order_no: u64, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CatalogEvent {
    ProductInserted { sku: Sku },
    ProductUpdated { sku: Sku },
    ProductDeleted { sku: Sku },
    ProductInfoUpdated { sku: Sku },
    UpdateIgnored { sku: Sku },
    TaxRateUpdated { tax_id: TaxId, rate: Decimal },
    TaxRateDeleted { tax_id: TaxId },
}
