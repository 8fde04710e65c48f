//! Order synchronization: build, hand off, report

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::domain::aggregates::StorefrontOrder;
use crate::domain::events::OrderEvent;
use crate::domain::services::OrderBuilder;
use crate::options::ConnectorOptions;
use crate::transport::{Notifier, OrderEnvelope, OrderTransport};
use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Delivered { sync_id: Uuid, order_no: u64 },
    /// Handed to the operator; not retried.
    DeliveryFailed { sync_id: Uuid, order_no: u64 },
}

pub struct OrderSync<T, N> {
    options: Arc<ConnectorOptions>,
    transport: T,
    notifier: N,
}

impl<T: OrderTransport, N: Notifier> OrderSync<T, N> {
    pub fn new(options: Arc<ConnectorOptions>, transport: T, notifier: N) -> Self {
        Self { options, transport, notifier }
    }

    pub fn options(&self) -> &ConnectorOptions { &self.options }

    /// Build errors are returned to the caller; a failed delivery is reported
    /// to the operator and counts as processed.
    pub async fn process(&self, source: &StorefrontOrder) -> Result<SyncOutcome> {
        let sync_id = Uuid::now_v7();
        let span = info_span!("order_sync", %sync_id, order_no = source.order_no);
        self.run(sync_id, source).instrument(span).await
    }

    async fn run(&self, sync_id: Uuid, source: &StorefrontOrder) -> Result<SyncOutcome> {
        let order_no = source.order_no;
        info!("sending order to back office");
        let order = OrderBuilder::new(&self.options).build(source).inspect_err(|e| {
            error!(error = %e, "order build failed");
        })?;

        let built = OrderEvent::Built { sync_id, order_no, lines: order.order_details.len(), gross_total: order.gross_total };
        info!(event = ?built, "order built");

        let envelope = OrderEnvelope { sync_id, order: &order };
        match self.transport.deliver(&envelope).await {
            Ok(()) => {
                let delivered = OrderEvent::Delivered { sync_id, order_no };
                info!(event = ?delivered, "order delivered");
                Ok(SyncOutcome::Delivered { sync_id, order_no })
            }
            Err(e) => {
                error!(error = %e, "order delivery failed");
                self.notifier
                    .notify(&OrderEvent::DeliveryFailed { sync_id, order_no, reason: e.to_string() })
                    .await;
                Ok(SyncOutcome::DeliveryFailed { sync_id, order_no })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::aggregates::{BillingAddress, Coupon, LineItem};
    use crate::domain::aggregates::NormalizedOrder;
    use crate::transport::TransportError;
    use crate::ConnectorError;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub(crate) fail: bool,
        pub(crate) sent: Mutex<Vec<NormalizedOrder>>,
    }

    impl OrderTransport for RecordingTransport {
        async fn deliver(&self, envelope: &OrderEnvelope<'_>) -> std::result::Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Publish("connection refused".into()));
            }
            self.sent.lock().unwrap().push(envelope.order.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) events: Mutex<Vec<OrderEvent>>,
    }

    impl Notifier for RecordingNotifier {
        async fn notify(&self, event: &OrderEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    pub(crate) fn sample_order() -> StorefrontOrder {
        StorefrontOrder {
            order_no: 2002,
            total: dec!(21),
            payment_method: "bacs".into(),
            billing: BillingAddress { company: "Acme Ltd".into(), ..Default::default() },
            line_items: vec![
                LineItem { product_id: 1, product_sku: Some("100".into()), quantity: 3, line_subtotal: dec!(15), tax_class: "reduced-rate".into(), ..Default::default() },
                LineItem { product_id: 2, product_sku: Some("200".into()), quantity: 2, line_subtotal: dec!(6), ..Default::default() },
            ],
            coupons: vec![Coupon::new("TENPC", dec!(2.1))],
            ..Default::default()
        }
    }

    pub(crate) fn options() -> Arc<ConnectorOptions> {
        Arc::new(ConnectorOptions::from_json(r#"{
            "discount_sku": "900",
            "tax_mappings": { "reduced-rate": { "tax_id": 4, "rate": "5" } }
        }"#).unwrap())
    }

    #[tokio::test]
    async fn test_delivers_built_order() {
        let sync = OrderSync::new(options(), RecordingTransport::default(), RecordingNotifier::default());
        let outcome = sync.process(&sample_order()).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Delivered { order_no: 2002, .. }));

        let sent = sync.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let discounts: Vec<_> = sent[0].order_details.iter().filter(|d| d.sku.as_str() == "900").map(|d| d.price).collect();
        assert_eq!(discounts, vec![dec!(-1.5), dec!(-0.6)]);
        assert!(sync.notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_notifies_and_does_not_raise() {
        let transport = RecordingTransport { fail: true, ..Default::default() };
        let sync = OrderSync::new(options(), transport, RecordingNotifier::default());
        let outcome = sync.process(&sample_order()).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::DeliveryFailed { order_no: 2002, .. }));

        let events = sync.notifier.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], OrderEvent::DeliveryFailed { order_no: 2002, reason, .. } if reason.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_build_failure_propagates_without_sending() {
        let mut order = sample_order();
        order.line_items[0].product_sku = None;
        let sync = OrderSync::new(options(), RecordingTransport::default(), RecordingNotifier::default());
        let err = sync.process(&order).await.unwrap_err();
        assert!(matches!(err, ConnectorError::MalformedInput(_)));
        assert!(sync.transport.sent.lock().unwrap().is_empty());
        assert!(sync.notifier.events.lock().unwrap().is_empty());
    }
}
