//! The [`Generator`] trait and engine selection.

use std::sync::Arc;

use async_trait::async_trait;
use stylist_core::cut::{Cut, DEFAULT_CUTS};
use stylist_core::generation::{limit_cuts, GenerationOutput, GenerationRequest};
use stylist_storage::SharedStorage;

use crate::config::{GeneratorConfig, GeneratorMode};
use crate::error::GenerationError;
use crate::executor::{InferenceExecutor, WorkflowExecutor};
use crate::inpaint::InpaintGenerator;
use crate::mock::MockGenerator;
use crate::postprocess::Finisher;
use crate::sdxl::SdxlGenerator;
use crate::swatch::SwatchLoader;

/// An image generation engine.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Configured engine family (`mock`, `sdxl`, `inpaint`).
    fn engine_name(&self) -> &'static str;

    /// Render, watermark and store every requested cut.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError>;
}

pub type SharedGenerator = Arc<dyn Generator>;

/// Requested cuts, defaulted when empty and capped at `max_cuts`.
pub fn plan_cuts(requested: &[Cut], max_cuts: usize) -> Vec<Cut> {
    let cuts = if requested.is_empty() {
        DEFAULT_CUTS.to_vec()
    } else {
        requested.to_vec()
    };
    limit_cuts(cuts, max_cuts)
}

/// Build the engine selected by `config`.
///
/// Fails when the watermark logo cannot be loaded.
pub async fn build_generator(
    config: &GeneratorConfig,
    storage: SharedStorage,
) -> Result<SharedGenerator, GenerationError> {
    let finisher = Finisher::load(
        storage,
        &config.watermark_path,
        config.watermark_scale,
        config.public_base_url.clone(),
    )
    .await?;

    let generator: SharedGenerator = match config.mode {
        GeneratorMode::Mock => Arc::new(MockGenerator::new(finisher, config.max_cuts)),
        GeneratorMode::Sdxl => {
            let executor: Arc<dyn WorkflowExecutor> =
                Arc::new(InferenceExecutor::new(&config.inference));
            Arc::new(SdxlGenerator::new(
                config.sdxl.clone(),
                config.max_cuts,
                executor,
                finisher,
            ))
        }
        GeneratorMode::Inpaint => {
            let executor: Arc<dyn WorkflowExecutor> =
                Arc::new(InferenceExecutor::new(&config.inference));
            Arc::new(InpaintGenerator::new(
                config.inpaint.clone(),
                config.max_cuts,
                executor,
                SwatchLoader::new()?,
                finisher,
            ))
        }
    };

    tracing::info!(
        engine = generator.engine_name(),
        max_cuts = config.max_cuts,
        inference_url = %config.inference.url,
        "Generator ready",
    );
    Ok(generator)
}
