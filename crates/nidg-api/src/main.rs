//! NID Gateway service binary.

use std::net::SocketAddr;

use nidg_api::config::ServiceConfig;
use nidg_api::state::AppState;
use nidg_api::{app, db};
use nidg_registry_client::RegistryClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;

    let mut state = AppState::new().with_allowlist(config.allowlist);
    if let Some(pool) = db::init_pool().await? {
        state = state.with_db_pool(pool);
    }
    if let Some(registry_config) = config.registry {
        state = state.with_registry(RegistryClient::new(registry_config)?);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "NID Gateway listening");

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
