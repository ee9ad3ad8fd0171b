//! Administrative endpoints
//!
//! Runtime toggles that operators flip without restarting the server.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Request body for the GPS-filter toggle
#[derive(Debug, Deserialize)]
pub struct GpsFilterRequest {
    pub enabled: bool,
}

/// Current state of the GPS-filter flag
#[derive(Debug, Serialize)]
pub struct GpsFilterResponse {
    pub enabled: bool,
}

/// POST /admin/gps-filter - Enable or disable GPS proximity filtering
///
/// Takes effect for all subsequent match requests.
pub async fn set_gps_filter(
    State(state): State<AppState>,
    Json(request): Json<GpsFilterRequest>,
) -> Json<GpsFilterResponse> {
    state.context.set_gps_filter_enabled(request.enabled);
    Json(GpsFilterResponse {
        enabled: state.context.gps_filter_enabled(),
    })
}

/// GET /admin/gps-filter - Read the current GPS-filter state
pub async fn get_gps_filter(State(state): State<AppState>) -> Json<GpsFilterResponse> {
    Json(GpsFilterResponse {
        enabled: state.context.gps_filter_enabled(),
    })
}
