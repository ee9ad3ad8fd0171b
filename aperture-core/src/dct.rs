//! 2-D discrete cosine transform for the frequency-domain match
//! signal.
//!
//! Pixels are normalized to [0, 1], then a separable orthonormal
//! type-II DCT runs over rows and columns. The flattened coefficient
//! matrix of the query is Pearson-correlated against the candidate's
//! to compare global image structure independent of local noise.

use image::GrayImage;

/// Orthonormal type-II DCT of a grayscale image, flattened row-major.
pub fn dct_2d(img: &GrayImage) -> Vec<f64> {
    let w = img.width() as usize;
    let h = img.height() as usize;

    let mut data: Vec<f64> = img.pixels().map(|p| p.0[0] as f64 / 255.0).collect();

    // Rows, then columns; the transform is separable.
    let row_basis = basis(w);
    for row in data.chunks_mut(w) {
        let transformed = dct_1d(row, &row_basis);
        row.copy_from_slice(&transformed);
    }

    let col_basis = basis(h);
    let mut column = vec![0.0; h];
    for x in 0..w {
        for (y, value) in column.iter_mut().enumerate() {
            *value = data[y * w + x];
        }
        let transformed = dct_1d(&column, &col_basis);
        for (y, value) in transformed.iter().enumerate() {
            data[y * w + x] = *value;
        }
    }

    data
}

/// Precomputed cosine basis with orthonormal scale factors:
/// `basis[k][n] = alpha(k) * cos(pi * (2n + 1) * k / 2N)`.
fn basis(n: usize) -> Vec<Vec<f64>> {
    let nf = n as f64;
    (0..n)
        .map(|k| {
            let alpha = if k == 0 {
                (1.0 / nf).sqrt()
            } else {
                (2.0 / nf).sqrt()
            };
            (0..n)
                .map(|i| {
                    alpha
                        * (std::f64::consts::PI * (2.0 * i as f64 + 1.0) * k as f64 / (2.0 * nf))
                            .cos()
                })
                .collect()
        })
        .collect()
}

fn dct_1d(input: &[f64], basis: &[Vec<f64>]) -> Vec<f64> {
    basis
        .iter()
        .map(|row| row.iter().zip(input.iter()).map(|(b, x)| b * x).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_constant_image_has_only_dc() {
        let img = GrayImage::from_pixel(8, 8, Luma([128]));
        let coeffs = dct_2d(&img);
        // DC coefficient carries the whole signal: 8 * (128/255).
        let expected_dc = 8.0 * 128.0 / 255.0;
        assert!((coeffs[0] - expected_dc).abs() < 1e-9, "dc was {}", coeffs[0]);
        for (i, &c) in coeffs.iter().enumerate().skip(1) {
            assert!(c.abs() < 1e-9, "coefficient {i} was {c}");
        }
    }

    #[test]
    fn test_identical_images_identical_coefficients() {
        let img = GrayImage::from_fn(16, 12, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        assert_eq!(dct_2d(&img), dct_2d(&img.clone()));
    }

    #[test]
    fn test_output_length() {
        let img = GrayImage::new(10, 6);
        assert_eq!(dct_2d(&img).len(), 60);
    }

    #[test]
    fn test_energy_preserved() {
        // Orthonormal transform preserves the L2 norm.
        let img = GrayImage::from_fn(8, 8, |x, y| Luma([((x * 31 + y * 17) % 256) as u8]));
        let spatial: f64 = img
            .pixels()
            .map(|p| {
                let v = p.0[0] as f64 / 255.0;
                v * v
            })
            .sum();
        let frequency: f64 = dct_2d(&img).iter().map(|c| c * c).sum();
        assert!((spatial - frequency).abs() < 1e-6);
    }
}
