//! Health check handlers
//!
//! Provides health and readiness endpoints for monitoring and orchestration.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status: always "healthy" once the store has loaded
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Number of annotations currently in the store
    pub annotations: usize,
    /// Whether GPS proximity filtering is active
    pub gps_filter_enabled: bool,
    /// Service name
    pub service: &'static str,
}

/// GET /health - Health check endpoint
///
/// Returns JSON with service status, version, and store size.
/// Used for monitoring and load balancer health checks.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        annotations: state.context.store().len(),
        gps_filter_enabled: state.context.gps_filter_enabled(),
        service: "aperture-server",
    })
}
