//! Default descriptor matcher: exhaustive L2 2-nearest-neighbour
//! search.

use super::{DescriptorMatcher, KnnPair};

/// Brute-force Euclidean matcher.
///
/// Exhaustive search is deliberate: candidate descriptor sets are a
/// few hundred entries at most and the database is scanned linearly
/// anyway, so an index structure would buy nothing here.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher;

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

impl DescriptorMatcher for BruteForceMatcher {
    fn knn2(&self, query: &[Vec<f32>], train: &[Vec<f32>]) -> Vec<KnnPair> {
        if train.len() < 2 {
            return Vec::new();
        }

        query
            .iter()
            .enumerate()
            .map(|(query_idx, q)| {
                let mut best_idx = 0;
                let mut best = f32::INFINITY;
                let mut second = f32::INFINITY;
                for (train_idx, t) in train.iter().enumerate() {
                    let d = l2_distance(q, t);
                    if d < best {
                        second = best;
                        best = d;
                        best_idx = train_idx;
                    } else if d < second {
                        second = d;
                    }
                }
                KnnPair {
                    query_idx,
                    best_train_idx: best_idx,
                    best_distance: best,
                    second_distance: second,
                }
            })
            .collect()
    }
}
