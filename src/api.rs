//! HTTP surface

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::domain::aggregates::StorefrontOrder;
use crate::domain::events::DomainEvent;
use crate::shop::{CatalogNotification, InMemoryShop};
use crate::sync::{OrderSync, SyncOutcome};
use crate::transport::{Notifier, OrderTransport};
use crate::ConnectorError;

pub struct AppState<T, N> {
    pub sync: Arc<OrderSync<T, N>>,
    pub shop: Arc<Mutex<InMemoryShop>>,
}

impl<T, N> Clone for AppState<T, N> {
    fn clone(&self) -> Self {
        Self { sync: Arc::clone(&self.sync), shop: Arc::clone(&self.shop) }
    }
}

pub struct ApiError(ConnectorError);

impl From<ConnectorError> for ApiError {
    fn from(e: ConnectorError) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() { StatusCode::UNPROCESSABLE_ENTITY } else { StatusCode::INTERNAL_SERVER_ERROR };
        warn!(error = %self.0, %status, "request rejected");
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub events: Vec<DomainEvent>,
}

pub fn router<T, N>(state: AppState<T, N>) -> Router
where
    T: OrderTransport + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-order-connector"})) }))
        .route("/api/v1/orders/sync", post(sync_order::<T, N>))
        .route("/api/v1/catalog/notifications", post(catalog_notification::<T, N>))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

async fn sync_order<T: OrderTransport + 'static, N: Notifier + 'static>(
    State(s): State<AppState<T, N>>,
    Json(order): Json<StorefrontOrder>,
) -> Result<(StatusCode, Json<SyncOutcome>), ApiError> {
    let outcome = s.sync.process(&order).await?;
    let status = match outcome {
        SyncOutcome::Delivered { .. } => StatusCode::OK,
        SyncOutcome::DeliveryFailed { .. } => StatusCode::ACCEPTED,
    };
    Ok((status, Json(outcome)))
}

async fn catalog_notification<T: OrderTransport + 'static, N: Notifier + 'static>(
    State(s): State<AppState<T, N>>,
    Json(notification): Json<CatalogNotification>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let mut shop = s.shop.lock().await;
    notification.apply(&mut *shop)?;
    Ok(Json(CatalogResponse { events: shop.take_events() }))
}
