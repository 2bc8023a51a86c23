//! Swatch and reference image loading for the inpaint engine.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::GenerationError;

pub const SWATCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const SWATCH_USER_AGENT: &str = "Mozilla/5.0 (HFVirtualStylist/1.0)";

/// Side of the neutral image used when no swatch is available.
pub const BLANK_SWATCH_SIZE: u32 = 512;
const BLANK_SWATCH_GREY: u8 = 200;

/// Fetches swatch images over HTTP or from the local filesystem.
#[derive(Debug, Clone)]
pub struct SwatchLoader {
    client: reqwest::Client,
}

impl SwatchLoader {
    pub fn new() -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(SWATCH_TIMEOUT)
            .user_agent(SWATCH_USER_AGENT)
            .build()
            .map_err(|e| GenerationError::Swatch(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Load `source` (an `http(s)` URL or a local path) as PNG bytes.
    pub async fn load(&self, source: &str) -> Result<Vec<u8>, GenerationError> {
        let raw = if source.starts_with("http://") || source.starts_with("https://") {
            self.download(source).await?
        } else {
            tokio::fs::read(Path::new(source))
                .await
                .map_err(|e| GenerationError::Swatch(format!("{source}: {e}")))?
        };
        normalize_to_png(&raw)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, GenerationError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GenerationError::Swatch(format!("{url}: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Swatch(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Decode any supported image and re-encode it as RGB PNG.
pub fn normalize_to_png(raw: &[u8]) -> Result<Vec<u8>, GenerationError> {
    let decoded = image::load_from_memory(raw)
        .map_err(|e| GenerationError::Swatch(format!("Undecodable image: {e}")))?;
    encode_png(&DynamicImage::ImageRgb8(decoded.to_rgb8()))
}

/// Neutral grey stand-in for a missing swatch.
pub fn blank_swatch() -> Result<Vec<u8>, GenerationError> {
    let blank = RgbImage::from_pixel(
        BLANK_SWATCH_SIZE,
        BLANK_SWATCH_SIZE,
        Rgb([BLANK_SWATCH_GREY; 3]),
    );
    encode_png(&DynamicImage::ImageRgb8(blank))
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, GenerationError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
