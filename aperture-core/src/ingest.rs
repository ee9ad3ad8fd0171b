//! Ingestion of newly submitted reference images.

use std::sync::Arc;

use crate::codec;
use crate::config::MatchConfig;
use crate::error::Result;
use crate::features::FeatureExtractor;
use crate::geo::Location;
use crate::histogram::Histogram;
use crate::store::{AnnotationEntry, AnnotationStore, IdAllocator};

/// Validates and stores new annotations.
///
/// The submitted image goes through the same pipeline as a query
/// (decode, resize to canonical, extract features, histogram), gets a
/// persistent sequential key of the form `annotation<N>`, and is
/// written to the store with disk persistence. A corrupt id counter
/// fails the ingestion attempt without touching the store.
pub struct AnnotationIngestion {
    store: Arc<AnnotationStore>,
    extractor: Arc<dyn FeatureExtractor>,
    allocator: IdAllocator,
    config: MatchConfig,
}

impl AnnotationIngestion {
    pub fn new(
        store: Arc<AnnotationStore>,
        extractor: Arc<dyn FeatureExtractor>,
        allocator: IdAllocator,
        config: MatchConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            allocator,
            config,
        }
    }

    /// Ingest one annotation; returns the generated key.
    pub fn ingest(
        &self,
        image_bytes: &[u8],
        annotation_text: &str,
        location: Location,
    ) -> Result<String> {
        let image =
            codec::resize_canonical(codec::decode_grayscale(image_bytes)?, &self.config);
        let features = self.extractor.detect_and_compute(&image)?;
        let histogram = Histogram::of_image(&image);

        let id = self.allocator.allocate()?;
        let key = format!("annotation{id}");
        tracing::info!(key = %key, text = annotation_text, ?location, "ingesting new annotation");

        self.store.add(
            AnnotationEntry {
                key: key.clone(),
                features,
                histogram,
                image,
                annotation_text: Some(annotation_text.to_string()),
                location,
            },
            true,
        )?;

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_jpeg;
    use crate::error::ApertureError;
    use crate::features::GridFeatureExtractor;
    use image::{GrayImage, Luma};

    fn small_config() -> MatchConfig {
        MatchConfig {
            canonical_width: 64,
            canonical_height: 48,
            ..MatchConfig::default()
        }
    }

    fn setup(dir: &std::path::Path) -> AnnotationIngestion {
        let store = Arc::new(AnnotationStore::new(dir));
        let allocator = IdAllocator::load(dir.join("counter.json")).unwrap();
        AnnotationIngestion::new(
            store,
            Arc::new(GridFeatureExtractor::default()),
            allocator,
            small_config(),
        )
    }

    fn jpeg_frame() -> Vec<u8> {
        let img = GrayImage::from_fn(64, 48, |x, y| {
            if ((x / 8) + (y / 8)) % 2 == 0 {
                Luma([210])
            } else {
                Luma([40])
            }
        });
        encode_jpeg(&img).unwrap()
    }

    #[test]
    fn test_ingest_assigns_sequential_keys() {
        let dir = tempfile::tempdir().unwrap();
        let ingestion = setup(dir.path());
        let frame = jpeg_frame();

        assert_eq!(
            ingestion.ingest(&frame, "Library", Location::ORIGIN).unwrap(),
            "annotation1"
        );
        assert_eq!(
            ingestion.ingest(&frame, "Atrium", Location::ORIGIN).unwrap(),
            "annotation2"
        );
    }

    #[test]
    fn test_ingest_persists_pair() {
        let dir = tempfile::tempdir().unwrap();
        let ingestion = setup(dir.path());
        let key = ingestion
            .ingest(&jpeg_frame(), "Library", Location::new(40.44, -79.94))
            .unwrap();
        assert!(dir.path().join(format!("{key}.jpg")).exists());
        let sidecar = std::fs::read_to_string(dir.path().join(format!("{key}.txt"))).unwrap();
        let lines: Vec<&str> = sidecar.lines().collect();
        assert_eq!(lines[0], "Library");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_ingest_rejects_undecodable_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let ingestion = setup(dir.path());
        let err = ingestion
            .ingest(b"not an image", "Library", Location::ORIGIN)
            .unwrap_err();
        assert!(matches!(err, ApertureError::ImageDecode(_)));
        assert!(ingestion.store.is_empty());
    }

    #[test]
    fn test_corrupt_counter_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("counter.json"), "garbage").unwrap();
        let store = Arc::new(AnnotationStore::new(dir.path()));
        let err = IdAllocator::load(dir.path().join("counter.json")).unwrap_err();
        assert!(matches!(err, ApertureError::CounterCorrupt(_)));
        assert!(store.is_empty());
    }
}
