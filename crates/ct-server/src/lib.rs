//! HTTP surface and command-line tooling for content-trust sealing.

pub mod commands;
pub mod config;
pub mod identity;
pub mod routes;
pub mod state;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full router. Used by `ct serve` and the integration tests.
pub fn build_router(state: Arc<state::AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::sign::router())
        .merge(routes::verify::router())
        .with_state(state)
}
