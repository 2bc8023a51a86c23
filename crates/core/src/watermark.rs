//! Logo watermarking for generated renders.
//!
//! The logo is scaled relative to the render width, keeps its aspect ratio
//! and is alpha-composited into the bottom-right corner. Output is always
//! JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

/// Default watermark width as a fraction of the render width.
pub const DEFAULT_WATERMARK_SCALE: f32 = 0.30;

/// Distance between the watermark and the bottom/right edges, in pixels.
pub const WATERMARK_MARGIN: u32 = 10;

/// JPEG quality for watermarked output.
pub const WATERMARKED_JPEG_QUALITY: u8 = 95;

#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Invalid watermark scale {0}. Must be in (0, 1]")]
    InvalidScale(f32),
}

/// Composite `watermark_bytes` onto `image_bytes` and return JPEG bytes.
pub fn apply_watermark(
    image_bytes: &[u8],
    watermark_bytes: &[u8],
    scale: f32,
) -> Result<Vec<u8>, WatermarkError> {
    let base = image::load_from_memory(image_bytes).map_err(WatermarkError::Decode)?;
    let logo = image::load_from_memory(watermark_bytes).map_err(WatermarkError::Decode)?;
    let composed = composite(base.to_rgba8(), &logo.to_rgba8(), scale)?;
    encode_jpeg(&DynamicImage::ImageRgba8(composed), WATERMARKED_JPEG_QUALITY)
}

/// Overlay `logo` onto `base` in place and return the result.
pub fn composite(
    mut base: RgbaImage,
    logo: &RgbaImage,
    scale: f32,
) -> Result<RgbaImage, WatermarkError> {
    if !(scale > 0.0 && scale <= 1.0) {
        return Err(WatermarkError::InvalidScale(scale));
    }
    let (base_w, base_h) = base.dimensions();
    let (logo_w, logo_h) = logo.dimensions();
    if logo_w == 0 || logo_h == 0 {
        return Ok(base);
    }

    let target_w = ((base_w as f32 * scale).round() as u32).max(1);
    let target_h = ((target_w as f64 * logo_h as f64 / logo_w as f64).round() as u32).max(1);
    let resized = imageops::resize(logo, target_w, target_h, FilterType::Lanczos3);

    let x = i64::from(base_w) - i64::from(target_w) - i64::from(WATERMARK_MARGIN);
    let y = i64::from(base_h) - i64::from(target_h) - i64::from(WATERMARK_MARGIN);
    imageops::overlay(&mut base, &resized, x, y);
    Ok(base)
}

/// Encode any image as baseline JPEG, dropping the alpha channel.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, WatermarkError> {
    let rgb = image.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(WatermarkError::Encode)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{ImageFormat, Rgba};

    fn png_bytes(img: RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn logo_lands_in_bottom_right_corner() {
        let base = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        let logo = RgbaImage::from_pixel(20, 10, Rgba([255, 255, 255, 255]));

        let out = composite(base, &logo, 0.5).unwrap();

        // Logo resized to 100x50, placed at (90, 40).
        assert_eq!(out.get_pixel(150, 70), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(195, 95), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn transparent_logo_leaves_base_untouched() {
        let base = RgbaImage::from_pixel(50, 50, Rgba([10, 20, 30, 255]));
        let logo = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 0]));

        let out = composite(base.clone(), &logo, 0.3).unwrap();
        assert_eq!(out, base);
    }

    #[test]
    fn rejects_invalid_scale() {
        let base = RgbaImage::new(10, 10);
        let logo = RgbaImage::new(2, 2);
        assert_matches!(composite(base.clone(), &logo, 0.0), Err(WatermarkError::InvalidScale(_)));
        assert_matches!(composite(base, &logo, 1.5), Err(WatermarkError::InvalidScale(_)));
    }

    #[test]
    fn apply_watermark_outputs_jpeg_with_same_dimensions() {
        let base = png_bytes(RgbaImage::from_pixel(64, 96, Rgba([40, 40, 40, 255])));
        let logo = png_bytes(RgbaImage::from_pixel(8, 4, Rgba([255, 255, 255, 200])));

        let out = apply_watermark(&base, &logo, DEFAULT_WATERMARK_SCALE).unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 96));
    }

    #[test]
    fn undecodable_input_is_an_error() {
        let logo = png_bytes(RgbaImage::new(4, 4));
        assert_matches!(
            apply_watermark(b"not an image", &logo, 0.3),
            Err(WatermarkError::Decode(_))
        );
    }
}
