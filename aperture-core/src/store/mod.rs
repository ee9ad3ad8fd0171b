//! The annotation store: keyed reference entries shared between
//! ingestion and matching.
//!
//! Entries live in memory behind a reader-writer lock; `keys()` hands
//! out a copy-on-read snapshot so an in-progress scan is never
//! invalidated by a concurrent `add`. Persistence is a directory of
//! `<key>.jpg` + `<key>.txt` pairs reloaded at startup (features are
//! recomputed, never restored from disk).

mod counter;
mod disk;

pub use counter::IdAllocator;
pub use disk::load_directory;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use image::GrayImage;

use crate::error::{ApertureError, Result};
use crate::features::FeatureSet;
use crate::geo::Location;
use crate::histogram::Histogram;

/// One reference record: a canonical grayscale image with its
/// precomputed features and annotation metadata.
#[derive(Debug, Clone)]
pub struct AnnotationEntry {
    /// Unique, immutable identifier.
    pub key: String,
    /// Keypoints + descriptors recomputed at ingest/reload time.
    pub features: FeatureSet,
    /// 256-bin intensity histogram of the canonical image.
    pub histogram: Histogram,
    /// Canonical-size grayscale pixel buffer.
    pub image: GrayImage,
    /// Human-readable annotation, if any.
    pub annotation_text: Option<String>,
    /// Where the reference image was captured; origin when unknown.
    pub location: Location,
}

/// Concurrent key → entry map with optional disk persistence.
pub struct AnnotationStore {
    entries: RwLock<HashMap<String, Arc<AnnotationEntry>>>,
    data_dir: PathBuf,
}

impl AnnotationStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Fetch one entry.
    pub fn get(&self, key: &str) -> Result<Arc<AnnotationEntry>> {
        self.entries
            .read()
            .expect("annotation store lock poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| ApertureError::NotFound(key.to_string()))
    }

    /// Snapshot of all keys, sorted for reproducible scan order.
    ///
    /// The snapshot is safe to iterate while `add` runs concurrently;
    /// a scan sees the store as it was when the snapshot was taken.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .expect("annotation store lock poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Insert or overwrite an entry. With `persist`, writes the
    /// canonical image and the three-line sidecar (annotation text,
    /// latitude, longitude) under the data directory before the entry
    /// becomes visible.
    pub fn add(&self, entry: AnnotationEntry, persist: bool) -> Result<()> {
        if !entry.features.is_consistent() {
            return Err(ApertureError::InvalidEntry {
                key: entry.key.clone(),
                reason: format!(
                    "descriptor count {} does not match keypoint count {}",
                    entry.features.descriptors.len(),
                    entry.features.keypoints.len()
                ),
            });
        }

        if persist {
            disk::persist_entry(&self.data_dir, &entry)?;
        }

        tracing::info!(key = %entry.key, persist, "adding annotation to store");
        self.entries
            .write()
            .expect("annotation store lock poisoned")
            .insert(entry.key.clone(), Arc::new(entry));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("annotation store lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
