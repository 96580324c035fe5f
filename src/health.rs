//! Liveness endpoints for the hosting platform.

use anyhow::Result;
use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn index() -> &'static str {
    "Bot is running OK"
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}

/// Serves the health router on `0.0.0.0:port` until the process exits.
pub async fn serve(port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Health server listening");
    axum::serve(listener, router()).await?;
    Ok(())
}
