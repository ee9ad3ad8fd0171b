//! Grayscale intensity histograms and the brightness-normalization
//! steps applied before histogram comparison.
//!
//! Two preprocessing steps run before any histogram is compared:
//! tail clipping (saturated and underexposed pixels distort the
//! correlation) and median-bin alignment (a global brightness offset
//! between query and candidate shows up as a shifted histogram).

use image::GrayImage;

pub const NUM_BINS: usize = 256;

/// A 256-bin grayscale intensity histogram. Bins are `f64` counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: [f64; NUM_BINS],
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            bins: [0.0; NUM_BINS],
        }
    }

    /// Count pixel intensities of a grayscale image.
    pub fn of_image(img: &GrayImage) -> Self {
        let mut hist = Self::new();
        for pixel in img.pixels() {
            hist.bins[pixel.0[0] as usize] += 1.0;
        }
        hist
    }

    pub fn from_bins(bins: [f64; NUM_BINS]) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }

    /// Suppress saturated and underexposed artifacts: bins 245..=255
    /// take the value of bin 244, bins 0..10 take the value of bin 10.
    ///
    /// Idempotent: clipping twice equals clipping once.
    pub fn clip_tails(&mut self) {
        let high = self.bins[244];
        for bin in &mut self.bins[245..] {
            *bin = high;
        }
        let low = self.bins[10];
        for bin in &mut self.bins[..10] {
            *bin = low;
        }
    }

    /// The smallest bin index whose cumulative sum strictly exceeds
    /// half the total sample count; 128 for a degenerate histogram
    /// where no bin qualifies (e.g. all bins zero).
    pub fn median_bin(&self) -> usize {
        let half = self.total() / 2.0;
        let mut cumulative = 0.0;
        for (i, &bin) in self.bins.iter().enumerate() {
            cumulative += bin;
            if cumulative > half {
                return i;
            }
        }
        128
    }

    /// Shift all bins right by `n`: `out[i + n] = in[i]`. Vacated low
    /// bins are zero-filled, overflow past the high end is dropped.
    /// A shift of 0 is the identity.
    pub fn shifted_right(&self, n: usize) -> Self {
        let mut out = Self::new();
        if n < NUM_BINS {
            out.bins[n..].copy_from_slice(&self.bins[..NUM_BINS - n]);
        }
        out
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Align two histograms for global brightness offset: shift the one
/// with the lower median bin rightward until the medians line up.
///
/// Returns `(query, candidate)` with exactly one of them shifted (by
/// zero when the medians already agree).
pub fn align_medians(query: &Histogram, candidate: &Histogram) -> (Histogram, Histogram) {
    let dq = query.median_bin();
    let dc = candidate.median_bin();
    if dq > dc {
        (query.clone(), candidate.shifted_right(dq - dc))
    } else {
        (query.shifted_right(dc - dq), candidate.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_of_image_counts() {
        let img = GrayImage::from_fn(4, 4, |x, _| Luma([if x < 2 { 50 } else { 200 }]));
        let hist = Histogram::of_image(&img);
        assert_eq!(hist.bins()[50], 8.0);
        assert_eq!(hist.bins()[200], 8.0);
        assert_eq!(hist.total(), 16.0);
    }

    #[test]
    fn test_clip_tails_idempotent() {
        let mut bins = [0.0; NUM_BINS];
        for (i, bin) in bins.iter_mut().enumerate() {
            *bin = i as f64;
        }
        let mut once = Histogram::from_bins(bins);
        once.clip_tails();
        let mut twice = once.clone();
        twice.clip_tails();
        assert_eq!(once, twice);
        assert_eq!(once.bins()[255], 244.0);
        assert_eq!(once.bins()[0], 10.0);
    }

    #[test]
    fn test_median_bin_strict_majority() {
        let mut bins = [0.0; NUM_BINS];
        bins[10] = 4.0;
        bins[20] = 4.0;
        let hist = Histogram::from_bins(bins);
        // Cumulative at bin 10 is exactly half, not strictly more.
        assert_eq!(hist.median_bin(), 20);
    }

    #[test]
    fn test_median_bin_degenerate() {
        assert_eq!(Histogram::new().median_bin(), 128);
    }

    #[test]
    fn test_shift_zero_is_identity() {
        let mut bins = [0.0; NUM_BINS];
        bins[0] = 1.0;
        bins[255] = 7.0;
        let hist = Histogram::from_bins(bins);
        assert_eq!(hist.shifted_right(0), hist);
    }

    #[test]
    fn test_shift_drops_overflow() {
        let mut bins = [0.0; NUM_BINS];
        bins[100] = 3.0;
        bins[250] = 5.0;
        let shifted = Histogram::from_bins(bins).shifted_right(10);
        assert_eq!(shifted.bins()[110], 3.0);
        assert_eq!(shifted.bins()[100], 0.0);
        // Bin 250 would land at 260; gone.
        assert_eq!(shifted.total(), 3.0);
    }

    #[test]
    fn test_align_medians_shifts_darker_side() {
        let mut q = [0.0; NUM_BINS];
        q[100] = 10.0;
        let mut c = [0.0; NUM_BINS];
        c[80] = 10.0;
        let (qa, ca) = align_medians(&Histogram::from_bins(q), &Histogram::from_bins(c));
        assert_eq!(qa.median_bin(), ca.median_bin());
        assert_eq!(ca.bins()[100], 10.0);
    }
}
