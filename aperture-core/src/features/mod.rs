//! Keypoint detection and descriptor matching capability boundary.
//!
//! The matching engine consumes detection and nearest-neighbour
//! search through the [`FeatureExtractor`] and [`DescriptorMatcher`]
//! traits; it never looks inside keypoints or descriptors beyond
//! counting them. The default implementations
//! ([`GridFeatureExtractor`], [`BruteForceMatcher`]) are
//! deterministic and dependency-free so the service runs and tests
//! end-to-end without an external vision library; deployments with a
//! stronger detector plug it in at this seam.

mod grid;
mod matcher;

pub use grid::GridFeatureExtractor;
pub use matcher::BruteForceMatcher;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A detected keypoint in canonical image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub x: f32,
    pub y: f32,
}

/// Keypoints with their descriptors.
///
/// Invariant: `descriptors.len() == keypoints.len()`. Zero keypoints
/// is a valid feature set (featureless images exist).
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Vec<Vec<f32>>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Whether the descriptor count matches the keypoint count.
    pub fn is_consistent(&self) -> bool {
        self.descriptors.len() == self.keypoints.len()
    }
}

/// The two nearest train descriptors for one query descriptor.
#[derive(Debug, Clone, Copy)]
pub struct KnnPair {
    pub query_idx: usize,
    pub best_train_idx: usize,
    pub best_distance: f32,
    pub second_distance: f32,
}

/// An accepted query/candidate keypoint correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPair {
    pub query_idx: usize,
    pub train_idx: usize,
}

/// Capability interface: image to keypoints + descriptors.
pub trait FeatureExtractor: Send + Sync {
    /// Detect keypoints and compute their descriptors. May yield zero
    /// keypoints; that is valid output, not an error.
    fn detect_and_compute(&self, img: &GrayImage) -> Result<FeatureSet>;
}

/// Capability interface: 2-nearest-neighbour descriptor search.
pub trait DescriptorMatcher: Send + Sync {
    /// For each query descriptor, the two nearest train descriptors
    /// with distances. When fewer than two train descriptors exist no
    /// pairs are produced.
    fn knn2(&self, query: &[Vec<f32>], train: &[Vec<f32>]) -> Vec<KnnPair>;
}
