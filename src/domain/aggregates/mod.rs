//! Aggregates module
pub mod order;
pub mod product;
pub mod storefront;

pub use order::{NormalizedOrder, OrderCustomer, OrderDetail, OrderPayment, SALE_PAYMENT_TYPE_ID};
pub use product::{ProductDetails, ProductInfo, TaxRateDetails};
pub use storefront::{BillingAddress, Coupon, LineItem, ShippingAddress, ShippingLine, StorefrontOrder};
