//! OpenSASE Order Connector - storefront to back-office order bridge

use std::sync::Arc;

use anyhow::{Context, Result};
use opensase_order_connector::api::{router, AppState};
use opensase_order_connector::config::Settings;
use opensase_order_connector::options::ConnectorOptions;
use opensase_order_connector::shop::InMemoryShop;
use opensase_order_connector::sync::OrderSync;
use opensase_order_connector::transport::{LogNotifier, LogTransport, NatsNotifier, NatsTransport, Notifier, OrderTransport};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let settings = Settings::from_env()?;
    let options = Arc::new(match &settings.options_path {
        Some(path) => ConnectorOptions::load(path)?,
        None => {
            tracing::warn!("OPTIONS_PATH not set, using built-in connector defaults");
            ConnectorOptions::default()
        }
    });

    match &settings.nats_url {
        Some(url) => {
            let client = async_nats::connect(url.as_str()).await.with_context(|| format!("connecting to NATS at {url}"))?;
            tracing::info!(%url, subject = %settings.order_subject, "orders will be published to NATS");
            let transport = NatsTransport::new(client.clone(), settings.order_subject.clone());
            let notifier = NatsNotifier::new(client, settings.alert_subject.clone());
            serve(&settings, options, transport, notifier).await
        }
        None => {
            tracing::warn!("NATS_URL not set, orders will only be logged");
            serve(&settings, options, LogTransport, LogNotifier).await
        }
    }
}

async fn serve<T, N>(settings: &Settings, options: Arc<ConnectorOptions>, transport: T, notifier: N) -> Result<()>
where
    T: OrderTransport + 'static,
    N: Notifier + 'static,
{
    let shop = Arc::new(Mutex::new(InMemoryShop::new(Arc::clone(&options))));
    let sync = Arc::new(OrderSync::new(options, transport, notifier));
    let app = router(AppState { sync, shop });

    let port = settings.port;
    tracing::info!("🚀 OpenSASE Order Connector listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
