//! Match endpoint handler
//!
//! Accepts a query frame (plus optional extras) and responds with the
//! annotation text of the best-matching stored reference image.

use axum::{
    extract::{Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use aperture_core::{
    Extras, Location, NewAnnotation, RequestPayload, ResponsePayload, ResultPayload,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Side-channel payload as received on the wire.
#[derive(Debug, Deserialize)]
pub struct ExtrasDto {
    /// Client's current coordinates
    #[serde(default)]
    pub current_location: Option<Location>,
    /// New reference image to ingest before matching
    #[serde(default)]
    pub annotation: Option<NewAnnotationDto>,
}

/// A new annotated reference image, with the image base64-encoded.
#[derive(Debug, Deserialize)]
pub struct NewAnnotationDto {
    /// Base64-encoded image bytes (JPEG or PNG)
    pub image: String,
    /// Annotation text to return on future matches
    pub text: String,
    /// Capture location; falls back to current_location
    #[serde(default)]
    pub location: Option<Location>,
}

/// One match result on the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultDto {
    /// Annotation text of the best match
    Text { value: String },
    /// Base64-encoded overlay image
    ImageOverlay { value: String },
}

/// Response for a match request
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub status: &'static str,
    pub results: Vec<ResultDto>,
    /// Candidates that survived the GPS filter for this request
    pub candidates_considered: usize,
    /// Winning store key, when a match was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_key: Option<String>,
}

impl From<ResponsePayload> for MatchResponse {
    fn from(payload: ResponsePayload) -> Self {
        let results = payload
            .results
            .into_iter()
            .map(|r| match r {
                ResultPayload::Text(value) => ResultDto::Text { value },
                ResultPayload::ImageOverlay(bytes) => ResultDto::ImageOverlay {
                    value: BASE64.encode(bytes),
                },
            })
            .collect();
        Self {
            status: "success",
            results,
            candidates_considered: payload.candidates_considered,
            best_key: payload.best_key,
        }
    }
}

/// POST /match - Match a query frame against stored annotations
///
/// Accepts multipart/form-data with:
/// - frame: The query image (JPEG or PNG)
/// - extras (optional): JSON with current_location and/or a new annotation
pub async fn match_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchResponse>, ApiError> {
    let mut frame: Option<Vec<u8>> = None;
    let mut extras: Option<ExtrasDto> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "frame" => {
                frame = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ApiError::bad_request(format!("Failed to read frame: {}", e))
                        })?
                        .to_vec(),
                );
            }
            "extras" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read extras: {}", e))
                })?;
                extras = Some(serde_json::from_str(&text).map_err(|e| {
                    ApiError::bad_request(format!("Invalid extras JSON: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let frame = frame.ok_or_else(|| {
        ApiError::bad_request("No frame provided. Use 'frame' field in multipart form.")
    })?;

    let payload = RequestPayload {
        frame,
        extras: extras.map(Extras::try_from).transpose()?,
    };

    // Matching is CPU-bound; keep it off the async worker threads.
    let context = state.context.clone();
    let response = tokio::task::spawn_blocking(move || context.handle_request(&payload))
        .await
        .map_err(|e| ApiError::internal(format!("Match task failed: {}", e)))??;

    Ok(Json(response.into()))
}

impl TryFrom<ExtrasDto> for Extras {
    type Error = ApiError;

    fn try_from(dto: ExtrasDto) -> Result<Self, ApiError> {
        let annotation = dto
            .annotation
            .map(|a| {
                let frame = BASE64.decode(&a.image).map_err(|e| {
                    ApiError::bad_request(format!("Invalid base64 in annotation image: {}", e))
                })?;
                Ok::<_, ApiError>(NewAnnotation {
                    frame,
                    text: a.text,
                    location: a.location,
                })
            })
            .transpose()?;

        Ok(Extras {
            current_location: dto.current_location,
            annotation,
        })
    }
}
