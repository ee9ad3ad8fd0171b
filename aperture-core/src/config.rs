//! Matching engine configuration.
//!
//! All scoring thresholds are hand-tuned constants surfaced as plain
//! fields so deployments can recalibrate without a code change.

use serde::{Deserialize, Serialize};

/// Configuration for the matching engine and ingestion pipeline.
///
/// The three signal thresholds (`correlation_threshold`,
/// `dct_threshold`, `mwn_threshold`) are compared against
/// percent-scale signals (raw value × 100).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Canonical image width; every stored and query image is resized
    /// to canonical dimensions before any comparison.
    pub canonical_width: u32,
    /// Canonical image height.
    pub canonical_height: u32,
    /// Lowe's ratio test threshold: a nearest-neighbour match is kept
    /// only if `best.distance < ratio_threshold * second.distance`.
    pub ratio_threshold: f32,
    /// Minimum histogram Pearson correlation × 100 to count the
    /// histogram signal as passing.
    pub correlation_threshold: f64,
    /// Minimum DCT Pearson correlation × 100 to count the
    /// frequency-domain signal as passing.
    pub dct_threshold: f64,
    /// Minimum Mann-Whitney U p-value × 100 to count the
    /// distribution-similarity signal as passing.
    pub mwn_threshold: f64,
    /// How many of the three signal tests must pass for a candidate
    /// to stay eligible.
    ///
    /// NOTE: commentary in the system this was bred from implies two
    /// of three should be required, but the enforced condition has
    /// always been "at least one". We reproduce the enforced
    /// behaviour; raising this to 2 is an open product question.
    pub min_signal_passes: usize,
    /// A candidate needs at least `required_match_fraction *
    /// max(candidate keypoints, query keypoints)` good matches to be
    /// eligible at all.
    pub required_match_fraction: f64,
    /// Candidates farther than this many meters from the query
    /// coordinates are skipped when GPS filtering is enabled.
    pub gps_threshold_meters: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            canonical_width: 640,
            canonical_height: 480,
            ratio_threshold: 0.7,
            correlation_threshold: 75.0,
            dct_threshold: 60.0,
            mwn_threshold: 50.0,
            min_signal_passes: 1,
            required_match_fraction: 0.07,
            gps_threshold_meters: 50.0,
        }
    }
}
