//! Placeholder engine for development without an inference server.

use std::time::Instant;

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use serde_json::json;
use stylist_core::generation::{GenerationOutput, GenerationRequest, ImageResult};
use stylist_core::storage::new_run_id;
use stylist_core::watermark::encode_jpeg;

use crate::engine::{plan_cuts, Generator};
use crate::error::GenerationError;
use crate::postprocess::{Finisher, RenderTarget};

pub const MOCK_WIDTH: u32 = 1344;
pub const MOCK_HEIGHT: u32 = 2016;
const MOCK_BACKGROUND: Rgb<u8> = Rgb([24, 24, 24]);
const MOCK_JPEG_QUALITY: u8 = 92;

pub struct MockGenerator {
    finisher: Finisher,
    max_cuts: usize,
}

impl MockGenerator {
    pub fn new(finisher: Finisher, max_cuts: usize) -> Self {
        Self { finisher, max_cuts }
    }
}

/// Dark placeholder frame at catalog resolution.
pub fn placeholder_jpeg() -> Result<Vec<u8>, GenerationError> {
    let frame = RgbImage::from_pixel(MOCK_WIDTH, MOCK_HEIGHT, MOCK_BACKGROUND);
    Ok(encode_jpeg(&DynamicImage::ImageRgb8(frame), MOCK_JPEG_QUALITY)?)
}

#[async_trait]
impl Generator for MockGenerator {
    fn engine_name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let started = Instant::now();
        let run_id = new_run_id();
        let placeholder = placeholder_jpeg()?;

        let mut images = Vec::new();
        for cut in plan_cuts(&request.cuts, self.max_cuts) {
            let finished = self
                .finisher
                .finish(
                    &placeholder,
                    RenderTarget {
                        family_id: &request.family_id,
                        color_id: &request.color_id,
                        run_id: &run_id,
                        cut,
                    },
                )
                .await?;
            images.push(ImageResult {
                cut,
                url: finished.url,
                width: finished.width,
                height: finished.height,
                watermark: true,
                meta: json!({
                    "engine": "mock",
                    "label": format!("{}:{}:{}", request.family_id, request.color_id, cut),
                }),
            });
        }

        Ok(GenerationOutput {
            run_id,
            engine: self.engine_name().to_string(),
            images,
            duration_ms: started.elapsed().as_millis() as u64,
            meta: json!({
                "family_id": request.family_id,
                "color_id": request.color_id,
                "engine": "mock",
            }),
        })
    }
}
