//! Storefront catalog capability
//!
//! The back office notifies the connector when products or tax rates
//! change; a [`Shop`] applies those changes to one storefront backend.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::aggregates::{ProductDetails, ProductInfo, TaxRateDetails};
use crate::domain::events::{CatalogEvent, DomainEvent};
use crate::domain::value_objects::{Sku, TaxId};
use crate::options::ConnectorOptions;
use crate::Result;

pub trait Shop {
    fn is_existing_product(&self, sku: &Sku) -> bool;
    fn insert_product(&mut self, product: ProductDetails) -> Result<()>;
    fn update_product(&mut self, product: ProductDetails) -> Result<()>;
    fn delete_product(&mut self, sku: &Sku) -> Result<()>;
    fn update_product_info(&mut self, sku: &Sku, info: ProductInfo) -> Result<()>;
    fn update_tax_rate(&mut self, tax: TaxRateDetails) -> Result<()>;
    fn delete_tax_rate(&mut self, tax_id: TaxId) -> Result<()>;
}

/// A change reported by the back office.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CatalogNotification {
    ProductAdded { product: serde_json::Value },
    ProductModified { product: serde_json::Value },
    ProductDeleted { sku: Sku },
    ProductInfoModified { sku: Sku, info: ProductInfo },
    TaxRateModified { tax: TaxRateDetails },
    TaxRateDeleted { tax_id: TaxId },
}

impl CatalogNotification {
    pub fn apply(self, shop: &mut impl Shop) -> Result<()> {
        match self {
            Self::ProductAdded { product } => {
                let product = ProductDetails::from_payload(&product)?;
                if shop.is_existing_product(&product.sku()?) {
                    shop.update_product(product)
                } else {
                    shop.insert_product(product)
                }
            }
            Self::ProductModified { product } => shop.update_product(ProductDetails::from_payload(&product)?),
            Self::ProductDeleted { sku } => shop.delete_product(&sku),
            Self::ProductInfoModified { sku, info } => shop.update_product_info(&sku, info),
            Self::TaxRateModified { tax } => shop.update_tax_rate(tax),
            Self::TaxRateDeleted { tax_id } => shop.delete_tax_rate(tax_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogProduct {
    pub sku: Sku,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_level: i32,
    pub in_stock: bool,
    pub weight: f64,
    pub tax_id: TaxId,
    pub published: bool,
}

/// Catalog held in memory, keyed by back-office SKU.
#[derive(Debug)]
pub struct InMemoryShop {
    options: Arc<ConnectorOptions>,
    products: HashMap<Sku, CatalogProduct>,
    tax_rates: HashMap<TaxId, TaxRateDetails>,
    delivery_prices: HashMap<String, Decimal>,
    events: Vec<DomainEvent>,
}

impl InMemoryShop {
    pub fn new(options: Arc<ConnectorOptions>) -> Self {
        Self { options, products: HashMap::new(), tax_rates: HashMap::new(), delivery_prices: HashMap::new(), events: vec![] }
    }

    pub fn product(&self, sku: &Sku) -> Option<&CatalogProduct> { self.products.get(sku) }
    pub fn tax_rate(&self, tax_id: TaxId) -> Option<&TaxRateDetails> { self.tax_rates.get(&tax_id) }
    pub fn delivery_price(&self, method: &str) -> Option<Decimal> { self.delivery_prices.get(method).copied() }
    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn raise_event(&mut self, e: CatalogEvent) { self.events.push(DomainEvent::Catalog(e)); }

    /// Products mapped to shipping methods only carry the delivery price.
    fn update_delivery_price(&mut self, sku: &Sku, price: Decimal) -> bool {
        let methods: Vec<String> = self.options.shipping_mappings.iter()
            .filter(|(_, mapped)| mapped.trim() == sku.as_str())
            .map(|(method, _)| method.clone())
            .collect();
        for method in &methods {
            info!(%sku, method = %method, %price, "delivery SKU, updating shipping price");
            self.delivery_prices.insert(method.clone(), price);
        }
        !methods.is_empty()
    }

    fn to_catalog_product(product: &ProductDetails, sku: Sku) -> CatalogProduct {
        CatalogProduct {
            sku,
            name: product.description.clone(),
            description: String::new(),
            price: product.retail_price(),
            stock_level: product.stock_level,
            in_stock: product.stock_level > 0,
            weight: product.weight,
            tax_id: TaxId::new(product.tax_id),
            published: product.published,
        }
    }
}

/// Unpublished and discontinued products are kept out of the shop.
fn is_withdrawn(product: &ProductDetails) -> bool {
    !product.published || product.discontinued
}

impl Shop for InMemoryShop {
    fn is_existing_product(&self, sku: &Sku) -> bool {
        self.products.contains_key(sku)
    }

    fn insert_product(&mut self, product: ProductDetails) -> Result<()> {
        let sku = product.sku()?;
        if is_withdrawn(&product) {
            info!(%sku, published = product.published, discontinued = product.discontinued, "product withdrawn, removing instead of inserting");
            return self.delete_product(&sku);
        }
        if self.update_delivery_price(&sku, product.retail_price()) {
            return Ok(());
        }
        debug!(%sku, "inserting product");
        self.products.insert(sku.clone(), Self::to_catalog_product(&product, sku.clone()));
        self.raise_event(CatalogEvent::ProductInserted { sku });
        Ok(())
    }

    fn update_product(&mut self, product: ProductDetails) -> Result<()> {
        let sku = product.sku()?;
        if self.options.ignore_product_updates {
            info!(%sku, "product updates ignored by options");
            self.raise_event(CatalogEvent::UpdateIgnored { sku });
            return Ok(());
        }
        if is_withdrawn(&product) {
            info!(%sku, published = product.published, discontinued = product.discontinued, "product withdrawn, removing instead of updating");
            return self.delete_product(&sku);
        }
        if self.update_delivery_price(&sku, product.retail_price()) {
            return Ok(());
        }

        if !self.is_existing_product(&sku) {
            return self.insert_product(product);
        }

        let (ignore_price, ignore_stock) = (self.options.ignore_price_updates, self.options.ignore_stock_updates);
        let Some(existing) = self.products.get_mut(&sku) else { return Ok(()) };
        let mut updated = Self::to_catalog_product(&product, sku.clone());
        updated.description = std::mem::take(&mut existing.description);
        if ignore_price { updated.price = existing.price; }
        if ignore_stock {
            updated.stock_level = existing.stock_level;
            updated.in_stock = existing.in_stock;
        }
        *existing = updated;
        self.raise_event(CatalogEvent::ProductUpdated { sku });
        Ok(())
    }

    fn delete_product(&mut self, sku: &Sku) -> Result<()> {
        if self.products.remove(sku).is_some() {
            self.raise_event(CatalogEvent::ProductDeleted { sku: sku.clone() });
        } else {
            debug!(%sku, "delete for unknown product ignored");
        }
        Ok(())
    }

    fn update_product_info(&mut self, sku: &Sku, info: ProductInfo) -> Result<()> {
        if self.options.ignore_product_updates {
            info!(%sku, "product updates ignored by options");
            self.raise_event(CatalogEvent::UpdateIgnored { sku: sku.clone() });
            return Ok(());
        }
        match self.products.get_mut(sku) {
            Some(product) => {
                product.description = info.description;
                self.raise_event(CatalogEvent::ProductInfoUpdated { sku: sku.clone() });
            }
            None => debug!(%sku, "info for unknown product ignored"),
        }
        Ok(())
    }

    fn update_tax_rate(&mut self, tax: TaxRateDetails) -> Result<()> {
        let (tax_id, rate) = (tax.tax_id, tax.rate);
        self.tax_rates.insert(tax_id, tax);
        self.raise_event(CatalogEvent::TaxRateUpdated { tax_id, rate });
        Ok(())
    }

    fn delete_tax_rate(&mut self, tax_id: TaxId) -> Result<()> {
        if self.tax_rates.remove(&tax_id).is_some() {
            self.raise_event(CatalogEvent::TaxRateDeleted { tax_id });
        }
        Ok(())
    }
}
