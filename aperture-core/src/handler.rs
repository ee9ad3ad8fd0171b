//! Per-request orchestration and the shared engine context.
//!
//! The hosting transport delivers one decoded [`RequestPayload`] per
//! request and takes back one [`ResponsePayload`]. Everything the
//! request path shares (store, engine, ingestion, GPS-filter flag)
//! lives in one explicit [`EngineContext`] constructed at startup;
//! there are no module-level singletons.

use std::sync::{Arc, Mutex};

use crate::codec;
use crate::engine::{MatchEngine, MatchResult};
use crate::error::Result;
use crate::geo::Location;
use crate::ingest::AnnotationIngestion;
use crate::store::AnnotationStore;

/// One inbound request: an encoded query frame plus the optional
/// side-channel payload.
#[derive(Debug, Clone)]
pub struct RequestPayload {
    /// Encoded image bytes (JPEG or PNG).
    pub frame: Vec<u8>,
    pub extras: Option<Extras>,
}

/// Side-channel payload accompanying a frame.
#[derive(Debug, Clone)]
pub struct Extras {
    /// Where the client currently is; matching defaults to the
    /// origin when absent.
    pub current_location: Option<Location>,
    /// A new reference image to add before matching.
    pub annotation: Option<NewAnnotation>,
}

/// A new annotated reference image submitted by a client.
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    /// Encoded image bytes of the reference image.
    pub frame: Vec<u8>,
    pub text: String,
    /// Capture location; falls back to the request's current
    /// location, then the origin.
    pub location: Option<Location>,
}

/// Response status. Request-level failures surface as errors before a
/// response is built, so a built response is always successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
}

/// One result attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPayload {
    /// UTF-8 annotation text.
    Text(String),
    /// Encoded overlay image; an accepted output kind alongside text.
    ImageOverlay(Vec<u8>),
}

/// Outbound response: a status and zero-or-one result payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePayload {
    pub status: ResponseStatus,
    pub results: Vec<ResultPayload>,
    /// How many candidates survived the GPS filter for this request.
    pub candidates_considered: usize,
    /// Winning store key, when a match was found.
    pub best_key: Option<String>,
}

/// Shared state for the request path: the store, the engine, the
/// ingestion pipeline, and the administrative GPS-filter flag.
pub struct EngineContext {
    store: Arc<AnnotationStore>,
    engine: MatchEngine,
    ingestion: AnnotationIngestion,
    /// Dedicated lock per the shared-state policy: held only for the
    /// read or write itself, never across a match.
    gps_filter_enabled: Mutex<bool>,
}

impl EngineContext {
    pub fn new(
        store: Arc<AnnotationStore>,
        engine: MatchEngine,
        ingestion: AnnotationIngestion,
        gps_filter_enabled: bool,
    ) -> Self {
        Self {
            store,
            engine,
            ingestion,
            gps_filter_enabled: Mutex::new(gps_filter_enabled),
        }
    }

    pub fn store(&self) -> &Arc<AnnotationStore> {
        &self.store
    }

    /// Administrative toggle, decoupled from any input mechanism.
    pub fn set_gps_filter_enabled(&self, enabled: bool) {
        *self
            .gps_filter_enabled
            .lock()
            .expect("gps filter lock poisoned") = enabled;
        tracing::info!(enabled, "GPS matching filter toggled");
    }

    pub fn gps_filter_enabled(&self) -> bool {
        *self
            .gps_filter_enabled
            .lock()
            .expect("gps filter lock poisoned")
    }

    /// Handle one request end to end: optional ingestion, then a
    /// match against the current store snapshot, then the response.
    ///
    /// Failures are isolated to this request; the store and shared
    /// flags are unaffected by an error return.
    pub fn handle_request(&self, payload: &RequestPayload) -> Result<ResponsePayload> {
        let image = codec::decode_grayscale(&payload.frame)?;

        let current_location = payload.extras.as_ref().and_then(|e| e.current_location);
        let coords = current_location.unwrap_or_else(|| {
            tracing::debug!("request carries no coordinates, defaulting to origin");
            Location::ORIGIN
        });

        if let Some(annotation) = payload.extras.as_ref().and_then(|e| e.annotation.as_ref()) {
            let location = annotation.location.or(current_location).unwrap_or(Location::ORIGIN);
            self.ingestion
                .ingest(&annotation.frame, &annotation.text, location)?;
        }

        // Read the flag under its lock immediately before matching;
        // the match itself runs without it.
        let gps_filtering = self.gps_filter_enabled();
        let result = self.engine.match_query(&image, coords, gps_filtering)?;

        Ok(Self::build_response(result))
    }

    fn build_response(result: MatchResult) -> ResponsePayload {
        let results = match &result.annotated_text {
            Some(text) => vec![ResultPayload::Text(text.clone())],
            None => Vec::new(),
        };
        ResponsePayload {
            status: ResponseStatus::Success,
            results,
            candidates_considered: result.candidates_considered,
            best_key: result.best_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_response_with_text() {
        let response = EngineContext::build_response(MatchResult {
            best_key: Some("a".into()),
            candidates_considered: 3,
            annotated_text: Some("Cafeteria".into()),
        });
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.results, vec![ResultPayload::Text("Cafeteria".into())]);
        assert_eq!(response.best_key.as_deref(), Some("a"));
    }

    #[test]
    fn test_build_response_empty() {
        let response = EngineContext::build_response(MatchResult {
            best_key: None,
            candidates_considered: 0,
            annotated_text: None,
        });
        assert_eq!(response.status, ResponseStatus::Success);
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_image_overlay_is_a_supported_result_kind() {
        let overlay = ResultPayload::ImageOverlay(vec![0xFF, 0xD8, 0xFF]);
        assert_ne!(overlay, ResultPayload::Text("x".into()));
    }
}
