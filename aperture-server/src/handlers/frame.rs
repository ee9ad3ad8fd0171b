//! Match-overlay frame endpoint
//!
//! Serves the most recently rendered match visualization as a JPEG.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use aperture_core::codec;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /frame - Latest match-overlay frame
///
/// Returns the overlay of the most recent successful match as
/// image/jpeg, or 404 when no match has been visualized yet.
pub async fn frame_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let frame = state
        .frames
        .latest()
        .ok_or_else(|| ApiError::not_found("No match frame available yet"))?;

    let bytes = codec::encode_jpeg(&frame)?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}
