//! Process settings from the environment

use std::path::PathBuf;

use crate::{ConnectorError, Result};

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_ORDER_SUBJECT: &str = "backoffice.orders";
pub const DEFAULT_ALERT_SUBJECT: &str = "connector.alerts";

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub nats_url: Option<String>,
    pub order_subject: String,
    pub alert_subject: String,
    pub options_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| ConnectorError::Options(format!("PORT is not a port number: {p}")))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            port,
            nats_url: var("NATS_URL"),
            order_subject: var("ORDER_SUBJECT").unwrap_or_else(|| DEFAULT_ORDER_SUBJECT.to_string()),
            alert_subject: var("ALERT_SUBJECT").unwrap_or_else(|| DEFAULT_ALERT_SUBJECT.to_string()),
            options_path: var("OPTIONS_PATH").map(PathBuf::from),
        })
    }
}
