//! Aperture Core - image-annotation matching engine and store
//!
//! This crate implements the heart of the Aperture service: a client
//! submits a query image (optionally with geocoordinates) and
//! receives the annotation text of the best-matching reference image
//! in a continuously growing database; new annotated reference
//! images can be submitted at any time.
//!
//! # Design
//!
//! - A multi-signal scorer fuses keypoint-match counts, histogram
//!   correlation, a Mann-Whitney U test, and DCT correlation into an
//!   accept/reject decision and ranking score per candidate.
//! - A GPS proximity filter excludes candidates far from the query
//!   coordinates before any scoring runs.
//! - The annotation store is a concurrent keyed map with disk
//!   persistence; the database stays small, so candidate
//!   selection is a flat per-query linear scan.
//! - Keypoint detection, descriptor search, and geodesic distance
//!   are capability traits with deterministic default
//!   implementations.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aperture_core::{
//!     AnnotationIngestion, AnnotationStore, BruteForceMatcher, EngineContext,
//!     GridFeatureExtractor, Haversine, IdAllocator, MatchConfig, MatchEngine,
//!     RequestPayload,
//! };
//!
//! # fn example() -> aperture_core::Result<()> {
//! let config = MatchConfig::default();
//! let store = Arc::new(AnnotationStore::new("db"));
//! let extractor = Arc::new(GridFeatureExtractor::default());
//!
//! let engine = MatchEngine::new(
//!     store.clone(),
//!     extractor.clone(),
//!     Arc::new(BruteForceMatcher),
//!     Arc::new(Haversine),
//!     config.clone(),
//! );
//! let ingestion = AnnotationIngestion::new(
//!     store.clone(),
//!     extractor,
//!     IdAllocator::load("db/counter.json")?,
//!     config,
//! );
//! let context = EngineContext::new(store, engine, ingestion, true);
//!
//! let frame = std::fs::read("query.jpg")?;
//! let response = context.handle_request(&RequestPayload { frame, extras: None })?;
//! println!("{:?}", response.results);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod dct;
pub mod engine;
pub mod error;
pub mod features;
pub mod geo;
pub mod handler;
pub mod histogram;
pub mod ingest;
pub mod stats;
pub mod store;
pub mod viz;

// Re-export main types for convenience
pub use config::MatchConfig;
pub use engine::{MatchEngine, MatchResult};
pub use error::{ApertureError, Result};
pub use features::{
    BruteForceMatcher, DescriptorMatcher, FeatureExtractor, FeatureSet, GridFeatureExtractor,
    KeyPoint, KnnPair, MatchPair,
};
pub use geo::{GeoDistance, Haversine, Location};
pub use handler::{
    EngineContext, Extras, NewAnnotation, RequestPayload, ResponsePayload, ResponseStatus,
    ResultPayload,
};
pub use histogram::Histogram;
pub use ingest::AnnotationIngestion;
pub use store::{load_directory, AnnotationEntry, AnnotationStore, IdAllocator};
pub use viz::{FrameSlot, MatchObserver, NullObserver};
