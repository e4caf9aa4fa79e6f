use std::{env, net::SocketAddr};

use anyhow::{Context, Result};
use ultrametric::TraversalController;
use ultrametric::api::{AppState, router};
use ultrametric::logging::init_tracing;
use ultrametric::settings::SettingsStore;

fn resolve_api_addr<F>(mut get_env: F) -> SocketAddr
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(addr) = get_env("ULTRAMETRIC_API_ADDR").and_then(|v| v.parse().ok()) {
        return addr;
    }

    if let Some(port) = get_env("ULTRAMETRIC_API_PORT").and_then(|v| v.parse::<u16>().ok()) {
        return SocketAddr::from(([127, 0, 0, 1], port));
    }

    SocketAddr::from(([127, 0, 0, 1], 4000))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = SettingsStore::from_env().load();
    let state = AppState::new(TraversalController::from_settings(&settings));
    let app = router(state);

    let addr = resolve_api_addr(|k| env::var(k).ok());
    tracing::info!(%addr, "session api listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("session api server failed")
}
