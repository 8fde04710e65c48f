//! OpenSASE Order Connector
//!
//! Turns storefront orders into back-office sales orders and keeps the
//! storefront catalog in step with back-office product notifications.
//!
//! ## Features
//! - Order normalization with per-tax-code coupon splitting
//! - Shipping and payment mapping from connector options
//! - Order delivery over NATS with operator alerts on failure
//! - Catalog updates (products, descriptions, tax rates)

use thiserror::Error;

pub mod api;
pub mod config;
pub mod domain;
pub mod options;
pub mod shop;
pub mod sync;
pub mod transport;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    #[error("Invalid connector options: {0}")]
    Options(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConnectorError {
    /// Errors caused by the request content rather than the connector.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MalformedInput(_) | Self::Validation(_) | Self::AmountOverflow(_) | Self::Serialization(_))
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
