//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use aperture_core::{
    load_directory, AnnotationIngestion, AnnotationStore, BruteForceMatcher, EngineContext,
    FrameSlot, GridFeatureExtractor, Haversine, IdAllocator, MatchConfig, MatchEngine,
};

use crate::config::Config;
use crate::error::ApiError;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Engine context: store, match engine, ingestion and the GPS-filter flag
    pub context: Arc<EngineContext>,
    /// Latest match-overlay frame published by the engine
    pub frames: Arc<FrameSlot>,
}

impl AppState {
    /// Wire the full matching stack from server configuration.
    ///
    /// Loads any annotations already persisted under the data
    /// directory, then builds the engine with the frame slot attached
    /// as its match observer.
    pub fn build(config: &Config) -> Result<Self, ApiError> {
        Self::build_with(config, MatchConfig::default())
    }

    /// Same as [`build`](Self::build) with an explicit match
    /// configuration. Integration tests use a smaller canonical frame
    /// size to keep feature extraction fast.
    pub fn build_with(config: &Config, match_config: MatchConfig) -> Result<Self, ApiError> {
        let store = Arc::new(AnnotationStore::new(&config.data_dir));
        let extractor = Arc::new(GridFeatureExtractor::default());

        let loaded = load_directory(&store, extractor.as_ref(), &match_config)?;
        tracing::info!(
            count = loaded,
            data_dir = %config.data_dir.display(),
            "loaded persisted annotations"
        );

        let allocator = IdAllocator::load(config.counter_path())?;
        let frames = Arc::new(FrameSlot::new());

        let engine = MatchEngine::new(
            Arc::clone(&store),
            extractor.clone(),
            Arc::new(BruteForceMatcher),
            Arc::new(Haversine),
            match_config.clone(),
        )
        .with_observer(frames.clone());

        let ingestion = AnnotationIngestion::new(
            Arc::clone(&store),
            extractor,
            allocator,
            match_config,
        );

        let context = Arc::new(EngineContext::new(
            store,
            engine,
            ingestion,
            config.gps_filter_enabled,
        ));

        Ok(Self { context, frames })
    }
}
