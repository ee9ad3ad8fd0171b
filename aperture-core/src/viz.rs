//! Match visualization: the observer seam and the keypoint-match
//! overlay renderer.
//!
//! The engine publishes an overlay through [`MatchObserver`] after a
//! successful match. Headless deployments and tests use
//! [`NullObserver`]; a live consumer polls [`FrameSlot::latest`].
//! This path is best-effort by contract: nothing here returns an
//! error into the match call.

use std::sync::Mutex;

use image::{GrayImage, Luma};

use crate::features::{KeyPoint, MatchPair};

/// Receives the rendered overlay of the most recent successful match.
pub trait MatchObserver: Send + Sync {
    fn on_match_visualized(&self, frame: GrayImage);
}

/// Discards frames; the default for headless operation.
#[derive(Debug, Default)]
pub struct NullObserver;

impl MatchObserver for NullObserver {
    fn on_match_visualized(&self, _frame: GrayImage) {}
}

/// Single shared frame slot: the engine is the sole writer, one
/// polling consumer is the sole reader. Only the most recent frame is
/// kept.
#[derive(Debug, Default)]
pub struct FrameSlot {
    slot: Mutex<Option<GrayImage>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently published frame, if any.
    pub fn latest(&self) -> Option<GrayImage> {
        self.slot.lock().expect("frame slot lock poisoned").clone()
    }
}

impl MatchObserver for FrameSlot {
    fn on_match_visualized(&self, frame: GrayImage) {
        *self.slot.lock().expect("frame slot lock poisoned") = Some(frame);
    }
}

/// Render the query and best candidate side by side with a line per
/// matched keypoint pair. Only matched keypoints are drawn.
pub fn render_match_overlay(
    query: &GrayImage,
    query_keypoints: &[KeyPoint],
    candidate: &GrayImage,
    candidate_keypoints: &[KeyPoint],
    matches: &[MatchPair],
) -> GrayImage {
    let width = query.width() + candidate.width();
    let height = query.height().max(candidate.height());
    let mut canvas = GrayImage::new(width, height);

    image::imageops::replace(&mut canvas, query, 0, 0);
    image::imageops::replace(&mut canvas, candidate, query.width() as i64, 0);

    let offset = query.width() as i64;
    for pair in matches {
        let (Some(q), Some(c)) = (
            query_keypoints.get(pair.query_idx),
            candidate_keypoints.get(pair.train_idx),
        ) else {
            continue;
        };
        let (x0, y0) = (q.x as i64, q.y as i64);
        let (x1, y1) = (c.x as i64 + offset, c.y as i64);
        draw_line(&mut canvas, x0, y0, x1, y1);
        draw_marker(&mut canvas, x0, y0);
        draw_marker(&mut canvas, x1, y1);
    }

    canvas
}

fn put_white(canvas: &mut GrayImage, x: i64, y: i64) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, Luma([255]));
    }
}

fn draw_marker(canvas: &mut GrayImage, x: i64, y: i64) {
    for dy in -1..=1 {
        for dx in -1..=1 {
            put_white(canvas, x + dx, y + dy);
        }
    }
}

/// Bresenham line.
fn draw_line(canvas: &mut GrayImage, mut x0: i64, mut y0: i64, x1: i64, y1: i64) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_white(canvas, x0, y0);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_slot_empty_then_latest() {
        let slot = FrameSlot::new();
        assert!(slot.latest().is_none());
        slot.on_match_visualized(GrayImage::new(4, 4));
        assert!(slot.latest().is_some());
    }

    #[test]
    fn test_frame_slot_keeps_newest() {
        let slot = FrameSlot::new();
        slot.on_match_visualized(GrayImage::new(4, 4));
        slot.on_match_visualized(GrayImage::new(8, 8));
        assert_eq!(slot.latest().unwrap().width(), 8);
    }

    #[test]
    fn test_overlay_dimensions() {
        let query = GrayImage::new(20, 10);
        let candidate = GrayImage::new(30, 15);
        let overlay = render_match_overlay(&query, &[], &candidate, &[], &[]);
        assert_eq!(overlay.width(), 50);
        assert_eq!(overlay.height(), 15);
    }

    #[test]
    fn test_overlay_draws_matched_pairs() {
        let query = GrayImage::new(16, 16);
        let candidate = GrayImage::new(16, 16);
        let q_kps = vec![KeyPoint { x: 4.0, y: 4.0 }];
        let c_kps = vec![KeyPoint { x: 8.0, y: 8.0 }];
        let matches = vec![MatchPair {
            query_idx: 0,
            train_idx: 0,
        }];
        let overlay = render_match_overlay(&query, &q_kps, &candidate, &c_kps, &matches);
        // Marker on the query side and the offset candidate side.
        assert_eq!(overlay.get_pixel(4, 4).0[0], 255);
        assert_eq!(overlay.get_pixel(16 + 8, 8).0[0], 255);
    }

    #[test]
    fn test_overlay_ignores_out_of_range_indices() {
        let query = GrayImage::new(8, 8);
        let candidate = GrayImage::new(8, 8);
        let matches = vec![MatchPair {
            query_idx: 5,
            train_idx: 0,
        }];
        // No keypoints at all; must not panic.
        let overlay = render_match_overlay(&query, &[], &candidate, &[], &matches);
        assert_eq!(overlay.width(), 16);
    }
}
