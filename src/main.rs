//! Cubo Casa bridge
//!
//! Polls Cubo Casa cloud locks and exposes them to a home-automation host
//! as lock entities over a small HTTP API.

mod api;
mod config;
mod cubo;
mod error;
mod lock;

use std::net::SocketAddr;
use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::ApiState;
use crate::config::IntegrationInfo;
use crate::cubo::{Credentials, CuboClient, RetryPolicy};
use crate::lock::LockPoller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cubocasa_bridge=info,tower_http=debug".into()),
        )
        .init();

    let info = IntegrationInfo::default();
    tracing::info!("{}", info.startup_message());

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!(
        "Configuration loaded (platforms: {:?})",
        config.platforms.enabled()
    );

    let credentials = Credentials::new(&config.cubo.token, &config.cubo.base_url)?;
    let client = Arc::new(CuboClient::new(credentials).with_retry_policy(RetryPolicy {
        max_retries: config.cubo.max_retries,
        backoff_factor: config.cubo.backoff_factor,
    }));

    if !lock::test_credentials(client.as_ref()).await {
        anyhow::bail!("Authentication with {} failed", client.base_url());
    }
    tracing::info!("Logged in to {}", client.base_url());

    let registry = lock::setup_entry(
        client.clone(),
        &config.cubo,
        &config.platforms,
        &info,
    )
    .await;
    tracing::info!("{} lock entities registered", registry.len());

    // Background polling
    LockPoller::new(registry.all(), config.cubo.scan_interval()).start();

    let state = ApiState {
        registry: Arc::new(registry),
        info,
    };

    let app = api::routes().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
