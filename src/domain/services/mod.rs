//! Order transformation services
pub mod coupon_splitter;
pub mod order_builder;
pub mod totals;

pub use coupon_splitter::{split, SplitDiscountLine};
pub use order_builder::OrderBuilder;
pub use totals::{aggregate, TaxCodeTotal};
