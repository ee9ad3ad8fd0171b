//! Disk persistence for annotation entries.
//!
//! Layout: one `<key>.jpg` (canonical grayscale image) plus one
//! `<key>.txt` sidecar per entry. The sidecar has exactly three
//! lines: annotation text, latitude, longitude. Features and
//! histograms are always recomputed at reload, never persisted.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::codec;
use crate::config::MatchConfig;
use crate::error::{ApertureError, Result};
use crate::features::FeatureExtractor;
use crate::geo::Location;
use crate::histogram::Histogram;
use crate::store::{AnnotationEntry, AnnotationStore};

/// Write an entry's image and sidecar under `data_dir`, each via
/// temp-file-then-rename so a crash never leaves a torn pair member.
pub(crate) fn persist_entry(data_dir: &Path, entry: &AnnotationEntry) -> Result<()> {
    fs::create_dir_all(data_dir)?;

    let image_bytes = codec::encode_jpeg(&entry.image)?;
    write_atomic(data_dir, &format!("{}.jpg", entry.key), &image_bytes)?;

    let sidecar = format!(
        "{}\n{}\n{}\n",
        entry.annotation_text.as_deref().unwrap_or(""),
        entry.location.latitude,
        entry.location.longitude
    );
    write_atomic(data_dir, &format!("{}.txt", entry.key), sidecar.as_bytes())?;
    Ok(())
}

fn write_atomic(dir: &Path, filename: &str, bytes: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(dir.join(filename))
        .map_err(|e| ApertureError::Storage(format!("rename failed for {filename}: {e}")))?;
    Ok(())
}

/// Reload every persisted `<key>.jpg`/`<key>.txt` pair into the
/// store, recomputing features via the extractor. Malformed pairs are
/// logged and skipped so one corrupt file cannot block startup.
/// Returns the number of entries loaded.
///
/// Directory enumeration order varies across platforms; the store's
/// sorted key snapshot makes scan order independent of it.
pub fn load_directory(
    store: &AnnotationStore,
    extractor: &dyn FeatureExtractor,
    config: &MatchConfig,
) -> Result<usize> {
    let data_dir = store.data_dir();
    if !data_dir.exists() {
        tracing::info!(dir = %data_dir.display(), "data directory missing, starting empty");
        return Ok(0);
    }

    let mut loaded = 0;
    for dir_entry in fs::read_dir(data_dir)? {
        let path = dir_entry?.path();
        let is_jpg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg"));
        if !is_jpg {
            continue;
        }

        let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
            continue;
        };

        match load_entry(&path, &key, extractor, config) {
            Ok(entry) => {
                store.add(entry, false)?;
                loaded += 1;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "skipping unreadable annotation pair");
            }
        }
    }

    tracing::info!(count = loaded, dir = %data_dir.display(), "annotation store loaded");
    Ok(loaded)
}

fn load_entry(
    image_path: &Path,
    key: &str,
    extractor: &dyn FeatureExtractor,
    config: &MatchConfig,
) -> Result<AnnotationEntry> {
    let sidecar_path = image_path.with_extension("txt");
    let sidecar = fs::read_to_string(&sidecar_path)?;
    let lines: Vec<&str> = sidecar.lines().collect();
    if lines.len() != 3 {
        return Err(ApertureError::Storage(format!(
            "expected 3 lines in {}, found {}",
            sidecar_path.display(),
            lines.len()
        )));
    }

    let annotation_text = if lines[0].is_empty() {
        None
    } else {
        Some(lines[0].to_string())
    };
    let latitude: f64 = lines[1]
        .trim()
        .parse()
        .map_err(|e| ApertureError::Storage(format!("bad latitude in {key}.txt: {e}")))?;
    let longitude: f64 = lines[2]
        .trim()
        .parse()
        .map_err(|e| ApertureError::Storage(format!("bad longitude in {key}.txt: {e}")))?;

    let image = codec::resize_canonical(codec::decode_grayscale(&fs::read(image_path)?)?, config);
    let features = extractor.detect_and_compute(&image)?;
    let histogram = Histogram::of_image(&image);

    Ok(AnnotationEntry {
        key: key.to_string(),
        features,
        histogram,
        image,
        annotation_text,
        location: Location::new(latitude, longitude),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::GridFeatureExtractor;
    use image::{GrayImage, Luma};

    fn small_config() -> MatchConfig {
        MatchConfig {
            canonical_width: 64,
            canonical_height: 48,
            ..MatchConfig::default()
        }
    }

    fn textured_image(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if ((x / 8) + (y / 8)) % 2 == 0 {
                Luma([220])
            } else {
                Luma([30])
            }
        })
    }

    fn sample_entry(key: &str, config: &MatchConfig) -> AnnotationEntry {
        let image = textured_image(config.canonical_width, config.canonical_height);
        let features = GridFeatureExtractor::default()
            .detect_and_compute(&image)
            .unwrap();
        AnnotationEntry {
            key: key.to_string(),
            histogram: Histogram::of_image(&image),
            features,
            image,
            annotation_text: Some("Cafeteria".into()),
            location: Location::new(40.0, -79.0),
        }
    }

    #[test]
    fn test_persist_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config();

        let store = AnnotationStore::new(dir.path());
        store.add(sample_entry("a1", &config), true).unwrap();
        assert!(dir.path().join("a1.jpg").exists());
        assert!(dir.path().join("a1.txt").exists());

        let reloaded = AnnotationStore::new(dir.path());
        let count = load_directory(&reloaded, &GridFeatureExtractor::default(), &config).unwrap();
        assert_eq!(count, 1);

        let entry = reloaded.get("a1").unwrap();
        assert_eq!(entry.annotation_text.as_deref(), Some("Cafeteria"));
        assert!((entry.location.latitude - 40.0).abs() < 1e-9);
        assert!((entry.location.longitude + 79.0).abs() < 1e-9);
        // Features are recomputed from the decoded image, not
        // restored, so the invariant holds after reload too.
        assert!(entry.features.is_consistent());
        assert!(!entry.features.is_empty());
    }

    #[test]
    fn test_malformed_sidecar_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config();

        let store = AnnotationStore::new(dir.path());
        store.add(sample_entry("good", &config), true).unwrap();
        store.add(sample_entry("bad", &config), true).unwrap();
        fs::write(dir.path().join("bad.txt"), "only one line\n").unwrap();

        let reloaded = AnnotationStore::new(dir.path());
        let count = load_directory(&reloaded, &GridFeatureExtractor::default(), &config).unwrap();
        assert_eq!(count, 1);
        assert!(reloaded.get("good").is_ok());
        assert!(reloaded.get("bad").is_err());
    }

    #[test]
    fn test_missing_directory_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path().join("does-not-exist"));
        let count =
            load_directory(&store, &GridFeatureExtractor::default(), &small_config()).unwrap();
        assert_eq!(count, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_annotation_text_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config();

        let store = AnnotationStore::new(dir.path());
        let mut entry = sample_entry("anon", &config);
        entry.annotation_text = None;
        store.add(entry, true).unwrap();

        let reloaded = AnnotationStore::new(dir.path());
        load_directory(&reloaded, &GridFeatureExtractor::default(), &config).unwrap();
        assert_eq!(reloaded.get("anon").unwrap().annotation_text, None);
    }
}
