//! The matching engine: scans the annotation store for the best
//! match to a query image.
//!
//! Each candidate surviving the GPS proximity filter is scored by
//! fusing four signals: the count of ratio-test-surviving keypoint
//! matches, the Pearson correlation of brightness-aligned intensity
//! histograms, the two-sided Mann-Whitney U p-value over the same
//! histograms, and the Pearson correlation of 2-D DCT coefficients.
//! A candidate must clear the keypoint-count floor and at least
//! `min_signal_passes` of the three statistical thresholds; eligible
//! candidates are ranked by the sum of all four signals, and the
//! first candidate in snapshot order keeps the lead on a tie.

use std::sync::Arc;

use image::GrayImage;

use crate::codec;
use crate::config::MatchConfig;
use crate::dct;
use crate::error::Result;
use crate::features::{DescriptorMatcher, FeatureExtractor, FeatureSet, MatchPair};
use crate::geo::{GeoDistance, Location};
use crate::histogram::{align_medians, Histogram};
use crate::stats;
use crate::store::{AnnotationEntry, AnnotationStore};
use crate::viz::{self, MatchObserver, NullObserver};

/// Outcome of one match call.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Key of the best-scoring candidate, if any cleared the filters.
    pub best_key: Option<String>,
    /// Candidates that survived the GPS filter and were scored.
    pub candidates_considered: usize,
    /// Stored annotation text of the winner; present iff `best_key`.
    pub annotated_text: Option<String>,
}

impl MatchResult {
    fn empty() -> Self {
        Self {
            best_key: None,
            candidates_considered: 0,
            annotated_text: None,
        }
    }
}

/// Everything derived once per query and reused across candidates.
struct QuerySignals {
    features: FeatureSet,
    histogram: Histogram,
    dct: Vec<f64>,
    image: GrayImage,
}

pub struct MatchEngine {
    store: Arc<AnnotationStore>,
    extractor: Arc<dyn FeatureExtractor>,
    matcher: Arc<dyn DescriptorMatcher>,
    geo: Arc<dyn GeoDistance>,
    observer: Arc<dyn MatchObserver>,
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(
        store: Arc<AnnotationStore>,
        extractor: Arc<dyn FeatureExtractor>,
        matcher: Arc<dyn DescriptorMatcher>,
        geo: Arc<dyn GeoDistance>,
        config: MatchConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            matcher,
            geo,
            observer: Arc::new(NullObserver),
            config,
        }
    }

    /// Attach an observer that receives the rendered overlay of every
    /// successful match.
    pub fn with_observer(mut self, observer: Arc<dyn MatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Find the best-matching stored annotation for a query image.
    ///
    /// Zero query keypoints is valid input and yields an empty result
    /// immediately. With `gps_filtering`, candidates at or beyond the
    /// configured proximity threshold from `coords` are skipped
    /// before scoring.
    pub fn match_query(
        &self,
        query_image: &GrayImage,
        coords: Location,
        gps_filtering: bool,
    ) -> Result<MatchResult> {
        let image = codec::resize_canonical(query_image.clone(), &self.config);
        let histogram = Histogram::of_image(&image);
        let features = self.extractor.detect_and_compute(&image)?;

        if features.is_empty() {
            tracing::debug!("no keypoints in query image, returning empty result");
            return Ok(MatchResult::empty());
        }

        let query = QuerySignals {
            dct: dct::dct_2d(&image),
            features,
            histogram,
            image,
        };

        let keys = self.store.keys();
        tracing::debug!(
            candidates = keys.len(),
            ?coords,
            gps_filtering,
            "scanning annotation store"
        );

        let mut considered = 0;
        let mut best_score = 0.0;
        let mut best: Option<(Arc<AnnotationEntry>, Vec<MatchPair>)> = None;

        for key in keys {
            // Entries are only ever overwritten, never removed, so a
            // snapshot key always resolves.
            let Ok(entry) = self.store.get(&key) else {
                continue;
            };

            if gps_filtering {
                let distance = self.geo.distance_meters(coords, entry.location);
                if distance >= self.config.gps_threshold_meters {
                    tracing::trace!(key = %key, distance, "skipping candidate outside GPS proximity");
                    continue;
                }
            }
            considered += 1;

            if let Some((score, matches)) = self.compute_match_score(&query, &entry) {
                // Strictly greater: on a tie the earlier candidate in
                // snapshot order keeps the win.
                if score > best_score {
                    best_score = score;
                    best = Some((entry, matches));
                }
            }
        }

        let result = match best {
            Some((entry, matches)) => {
                tracing::info!(key = %entry.key, score = best_score, considered, "best match found");
                self.publish_overlay(&query, &entry, &matches);
                MatchResult {
                    best_key: Some(entry.key.clone()),
                    candidates_considered: considered,
                    annotated_text: entry.annotation_text.clone(),
                }
            }
            None => {
                tracing::debug!(considered, "no candidate matched");
                MatchResult {
                    best_key: None,
                    candidates_considered: considered,
                    annotated_text: None,
                }
            }
        };

        Ok(result)
    }

    /// Score one candidate, or `None` when it fails the acceptance
    /// rules. Returns the score together with the accepted keypoint
    /// correspondences for overlay rendering.
    fn compute_match_score(
        &self,
        query: &QuerySignals,
        candidate: &AnnotationEntry,
    ) -> Option<(f64, Vec<MatchPair>)> {
        // The ingestion and reload paths always store canonical-sized
        // images; an entry inserted directly may not be. Its DCT
        // vector would not line up with the query's, so reject it
        // here rather than feed mismatched samples to the scorer.
        let canonical = (self.config.canonical_width, self.config.canonical_height);
        if candidate.image.dimensions() != canonical {
            tracing::warn!(
                key = %candidate.key,
                dimensions = ?candidate.image.dimensions(),
                "skipping candidate with non-canonical image size"
            );
            return None;
        }

        let pairs = self
            .matcher
            .knn2(&query.features.descriptors, &candidate.features.descriptors);

        // Lowe's ratio test rejects ambiguous correspondences.
        let good: Vec<MatchPair> = pairs
            .iter()
            .filter(|p| p.best_distance < self.config.ratio_threshold * p.second_distance)
            .map(|p| MatchPair {
                query_idx: p.query_idx,
                train_idx: p.best_train_idx,
            })
            .collect();

        let mut query_hist = query.histogram.clone();
        let mut cand_hist = candidate.histogram.clone();
        query_hist.clip_tails();
        cand_hist.clip_tails();
        let (query_hist, cand_hist) = align_medians(&query_hist, &cand_hist);

        let hist_correlation =
            stats::pearson_correlation(query_hist.bins(), cand_hist.bins()) * 100.0;
        let mwn_p = stats::mann_whitney_u(query_hist.bins(), cand_hist.bins()) * 100.0;
        let dct_correlation =
            stats::pearson_correlation(&query.dct, &dct::dct_2d(&candidate.image)) * 100.0;

        let required = self.config.required_match_fraction
            * candidate.features.len().max(query.features.len()) as f64;

        tracing::trace!(
            key = %candidate.key,
            good_matches = good.len(),
            required,
            hist_correlation,
            dct_correlation,
            mwn_p,
            "candidate signals"
        );

        if (good.len() as f64) < required {
            tracing::trace!(key = %candidate.key, "rejected: too few good matches");
            return None;
        }

        let passes = [
            hist_correlation > self.config.correlation_threshold,
            dct_correlation > self.config.dct_threshold,
            mwn_p > self.config.mwn_threshold,
        ]
        .iter()
        .filter(|&&p| p)
        .count();

        if passes < self.config.min_signal_passes {
            tracing::trace!(key = %candidate.key, passes, "rejected: too few signal passes");
            return None;
        }

        let score = good.len() as f64 + hist_correlation + dct_correlation + mwn_p;
        Some((score, good))
    }

    fn publish_overlay(
        &self,
        query: &QuerySignals,
        winner: &AnnotationEntry,
        matches: &[MatchPair],
    ) {
        let frame = viz::render_match_overlay(
            &query.image,
            &query.features.keypoints,
            &winner.image,
            &winner.features.keypoints,
            matches,
        );
        self.observer.on_match_visualized(frame);
    }
}
