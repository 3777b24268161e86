//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::StorageBackend;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = match state.config.database.backend {
        StorageBackend::Postgres => "postgres",
        StorageBackend::Memory => "memory",
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: storage.to_string(),
    })
}
