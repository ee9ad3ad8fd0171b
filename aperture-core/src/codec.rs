//! Image decode/encode boundary.
//!
//! Wraps the `image` crate for the three conversions the service
//! needs: ingress bytes to grayscale, resize to canonical dimensions,
//! and grayscale to JPEG for the egress/overlay path.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::Cursor;

use crate::config::MatchConfig;
use crate::error::{ApertureError, Result};

/// Decode encoded image bytes (JPEG or PNG) into a grayscale buffer.
pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ApertureError::ImageDecode(format!("failed to decode image: {e}")))?;
    Ok(img.into_luma8())
}

/// Resize a grayscale image to the configured canonical dimensions.
///
/// Already-canonical images are returned unchanged.
pub fn resize_canonical(img: GrayImage, config: &MatchConfig) -> GrayImage {
    if img.width() == config.canonical_width && img.height() == config.canonical_height {
        return img;
    }
    image::imageops::resize(
        &img,
        config.canonical_width,
        config.canonical_height,
        FilterType::Triangle,
    )
}

/// Encode a grayscale image as JPEG bytes.
pub fn encode_jpeg(img: &GrayImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| ApertureError::ImageEncode(format!("failed to encode JPEG: {e}")))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn small_config() -> MatchConfig {
        MatchConfig {
            canonical_width: 32,
            canonical_height: 24,
            ..MatchConfig::default()
        }
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let err = decode_grayscale(&[0x00, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, ApertureError::ImageDecode(_)));
    }

    #[test]
    fn test_jpeg_roundtrip_dimensions() {
        let img = GrayImage::from_fn(32, 24, |x, y| Luma([((x + y) % 256) as u8]));
        let bytes = encode_jpeg(&img).unwrap();
        let decoded = decode_grayscale(&bytes).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 24);
    }

    #[test]
    fn test_resize_to_canonical() {
        let config = small_config();
        let img = GrayImage::new(100, 80);
        let resized = resize_canonical(img, &config);
        assert_eq!(resized.width(), 32);
        assert_eq!(resized.height(), 24);
    }

    #[test]
    fn test_resize_noop_when_canonical() {
        let config = small_config();
        let img = GrayImage::from_fn(32, 24, |x, _| Luma([x as u8]));
        let resized = resize_canonical(img.clone(), &config);
        assert_eq!(resized, img);
    }
}
