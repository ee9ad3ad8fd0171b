//! Default feature extractor: one gradient corner per grid cell with
//! normalized patch descriptors.

use image::GrayImage;

use super::{FeatureExtractor, FeatureSet, KeyPoint};
use crate::error::Result;

/// Grid-based corner detector with patch descriptors.
///
/// The image is divided into `cell_size` square cells; each cell
/// contributes its strongest corner-response pixel (product of the
/// absolute central-difference gradients) when the response clears
/// `response_threshold`. The descriptor is the mean-subtracted,
/// L2-normalized square patch of side `2 * patch_radius + 1` around
/// the keypoint. Fully deterministic: identical images produce
/// identical feature sets.
#[derive(Debug, Clone)]
pub struct GridFeatureExtractor {
    pub cell_size: u32,
    pub response_threshold: f32,
    pub patch_radius: u32,
}

impl Default for GridFeatureExtractor {
    fn default() -> Self {
        Self {
            cell_size: 16,
            response_threshold: 100.0,
            patch_radius: 4,
        }
    }
}

impl GridFeatureExtractor {
    fn corner_response(img: &GrayImage, x: u32, y: u32) -> f32 {
        let p = |x: u32, y: u32| img.get_pixel(x, y).0[0] as f32;
        let dx = p(x + 1, y) - p(x - 1, y);
        let dy = p(x, y + 1) - p(x, y - 1);
        // High only where both gradient directions are strong, which
        // rejects plain edges.
        dx.abs() * dy.abs()
    }

    fn patch_descriptor(img: &GrayImage, x: u32, y: u32, radius: u32) -> Option<Vec<f32>> {
        let side = 2 * radius + 1;
        let mut patch = Vec::with_capacity((side * side) as usize);
        for py in (y - radius)..=(y + radius) {
            for px in (x - radius)..=(x + radius) {
                patch.push(img.get_pixel(px, py).0[0] as f32);
            }
        }

        let mean = patch.iter().sum::<f32>() / patch.len() as f32;
        for v in &mut patch {
            *v -= mean;
        }
        let norm = patch.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm < 1e-6 {
            // Flat patch carries no texture to match against.
            return None;
        }
        for v in &mut patch {
            *v /= norm;
        }
        Some(patch)
    }
}

impl FeatureExtractor for GridFeatureExtractor {
    fn detect_and_compute(&self, img: &GrayImage) -> Result<FeatureSet> {
        let mut features = FeatureSet::default();
        let margin = self.patch_radius.max(1);
        if img.width() <= 2 * margin || img.height() <= 2 * margin {
            return Ok(features);
        }

        let mut cy = 0;
        while cy < img.height() {
            let mut cx = 0;
            while cx < img.width() {
                let x_end = (cx + self.cell_size).min(img.width() - margin);
                let y_end = (cy + self.cell_size).min(img.height() - margin);

                let mut best: Option<(u32, u32, f32)> = None;
                for y in cy.max(margin)..y_end {
                    for x in cx.max(margin)..x_end {
                        let response = Self::corner_response(img, x, y);
                        if response >= self.response_threshold
                            && best.map_or(true, |(_, _, r)| response > r)
                        {
                            best = Some((x, y, response));
                        }
                    }
                }

                if let Some((x, y, _)) = best {
                    if let Some(descriptor) =
                        Self::patch_descriptor(img, x, y, self.patch_radius)
                    {
                        features.keypoints.push(KeyPoint {
                            x: x as f32,
                            y: y as f32,
                        });
                        features.descriptors.push(descriptor);
                    }
                }

                cx += self.cell_size;
            }
            cy += self.cell_size;
        }

        debug_assert!(features.is_consistent());
        Ok(features)
    }
}
