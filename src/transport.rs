//! Delivery of built orders and operator alerts
//!
//! Orders are published as JSON to a NATS subject where the back-office
//! bridge picks them up. Without a NATS connection the connector only logs
//! what it would have sent.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::aggregates::NormalizedOrder;
use crate::domain::events::{DomainEvent, OrderEvent};

/// What goes on the wire for one order.
#[derive(Debug, Serialize)]
pub struct OrderEnvelope<'a> {
    pub sync_id: Uuid,
    pub order: &'a NormalizedOrder,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Could not encode order: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Publish failed: {0}")]
    Publish(String),
}

pub trait OrderTransport: Send + Sync {
    fn deliver(&self, envelope: &OrderEnvelope<'_>) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Operator notification channel. Notifying never fails the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &OrderEvent) -> impl Future<Output = ()> + Send;
}

#[derive(Clone, Debug)]
pub struct NatsTransport {
    client: async_nats::Client,
    subject: String,
}

impl NatsTransport {
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
        Self { client, subject: subject.into() }
    }
}

impl OrderTransport for NatsTransport {
    async fn deliver(&self, envelope: &OrderEnvelope<'_>) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(envelope)?;
        self.client
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))?;
        self.client.flush().await.map_err(|e| TransportError::Publish(e.to_string()))?;
        info!(sync_id = %envelope.sync_id, order_no = envelope.order.ext_order_no, subject = %self.subject, "order published");
        Ok(())
    }
}

/// Stand-in transport used when no broker is configured.
#[derive(Clone, Debug, Default)]
pub struct LogTransport;

impl OrderTransport for LogTransport {
    async fn deliver(&self, envelope: &OrderEnvelope<'_>) -> Result<(), TransportError> {
        let payload = serde_json::to_string(envelope)?;
        info!(sync_id = %envelope.sync_id, order_no = envelope.order.ext_order_no, %payload, "no broker configured, order logged only");
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, event: &OrderEvent) {
        if let OrderEvent::DeliveryFailed { order_no, reason, .. } = event {
            error!(order_no, %reason, "Order ({order_no}) failed to submit.");
        }
    }
}

/// Publishes alerts to a NATS subject and logs them as well.
#[derive(Clone, Debug)]
pub struct NatsNotifier {
    client: async_nats::Client,
    subject: String,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
        Self { client, subject: subject.into() }
    }
}

impl Notifier for NatsNotifier {
    async fn notify(&self, event: &OrderEvent) {
        LogNotifier.notify(event).await;
        let payload = match serde_json::to_vec(&DomainEvent::Order(event.clone())) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "could not encode alert");
                return;
            }
        };
        if let Err(e) = self.client.publish(self.subject.clone(), payload.into()).await {
            error!(error = %e, subject = %self.subject, "could not publish alert");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_transport_accepts_order() {
        let order = NormalizedOrder::new(1001);
        let envelope = OrderEnvelope { sync_id: Uuid::now_v7(), order: &order };
        assert!(LogTransport.deliver(&envelope).await.is_ok());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let order = NormalizedOrder::new(7);
        let sync_id = Uuid::now_v7();
        let json = serde_json::to_value(OrderEnvelope { sync_id, order: &order }).unwrap();
        assert_eq!(json["sync_id"], sync_id.to_string());
        assert_eq!(json["order"]["ExtOrderNo"], 7);
    }

    #[test]
    fn test_alert_wire_shape() {
        let event = DomainEvent::Order(OrderEvent::DeliveryFailed { sync_id: Uuid::nil(), order_no: 5, reason: "down".into() });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "order");
        assert_eq!(json["event"], "delivery_failed");
        assert_eq!(json["order_no"], 5);
    }
}
