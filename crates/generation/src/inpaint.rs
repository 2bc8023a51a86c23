//! SDXL inpaint engine: re-textures the suit in a reference photo, with
//! the fabric swatch fed through IP-Adapter.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use stylist_core::cut::Cut;
use stylist_core::generation::{GenerationOutput, GenerationRequest, ImageResult};
use stylist_core::storage::new_run_id;

use crate::config::InpaintConfig;
use crate::engine::{plan_cuts, Generator};
use crate::error::GenerationError;
use crate::executor::WorkflowExecutor;
use crate::postprocess::{Finisher, RenderTarget};
use crate::prompts::inpaint_prompts;
use crate::seed::{derive_cut_seed, resolve_base_seed};
use crate::swatch::{blank_swatch, SwatchLoader};
use crate::workflow::{build_inpaint_workflow, InpaintWorkflowParams, SwatchInput};

const ENGINE: &str = "sdxl-inpaint";

/// Reference photo and mask used for one cut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutAssets {
    pub reference: PathBuf,
    pub mask: PathBuf,
}

/// Pick the assets for `cut`.
///
/// Without a reference of its own the cut borrows the other cut's
/// reference and mask. `None` when either file is still missing.
pub fn resolve_assets(config: &InpaintConfig, cut: Cut) -> Option<CutAssets> {
    let (reference, mask) = match config.references.existing(cut) {
        Some(reference) => (Some(reference), config.masks.existing(cut)),
        None => {
            let fallback = cut.other();
            tracing::warn!(cut = %cut, fallback = %fallback, "No reference for cut, using fallback");
            (
                config.references.existing(fallback),
                config.masks.existing(fallback),
            )
        }
    };
    Some(CutAssets {
        reference: reference?.to_path_buf(),
        mask: mask?.to_path_buf(),
    })
}

/// At least one reference and one mask must exist.
pub fn check_assets(config: &InpaintConfig) -> Result<(), GenerationError> {
    let any = |paths: &crate::config::CutPaths| {
        [Cut::Recto, Cut::Cruzado]
            .into_iter()
            .any(|cut| paths.existing(cut).is_some())
    };
    if !any(&config.references) {
        return Err(GenerationError::Asset(
            "No inpaint reference images found".into(),
        ));
    }
    if !any(&config.masks) {
        return Err(GenerationError::Asset("No inpaint masks found".into()));
    }
    Ok(())
}

pub struct InpaintGenerator {
    config: InpaintConfig,
    max_cuts: usize,
    executor: Arc<dyn WorkflowExecutor>,
    swatches: SwatchLoader,
    finisher: Finisher,
}

impl InpaintGenerator {
    pub fn new(
        config: InpaintConfig,
        max_cuts: usize,
        executor: Arc<dyn WorkflowExecutor>,
        swatches: SwatchLoader,
        finisher: Finisher,
    ) -> Self {
        Self {
            config,
            max_cuts,
            executor,
            swatches,
            finisher,
        }
    }

    /// Upload the swatch (or a neutral stand-in) for IP-Adapter.
    async fn prepare_swatch(
        &self,
        run_id: &str,
        swatch_url: Option<&str>,
    ) -> Result<Option<SwatchInput>, GenerationError> {
        if !self.config.ip_adapter.enabled {
            return Ok(None);
        }

        let loaded = match swatch_url {
            Some(url) => match self.swatches.load(url).await {
                Ok(png) => Some(png),
                Err(e) => {
                    tracing::warn!(swatch_url = url, error = %e, "Swatch unavailable, continuing without it");
                    None
                }
            },
            None => None,
        };

        let (png, scale) = match loaded {
            Some(png) => (png, self.config.ip_adapter.scale),
            None => (blank_swatch()?, 0.0),
        };
        let image = self
            .executor
            .upload_image(&format!("{run_id}_swatch.png"), png)
            .await?;
        Ok(Some(SwatchInput { image, scale }))
    }

    async fn upload_asset(
        &self,
        run_id: &str,
        cut: Cut,
        label: &str,
        path: &Path,
    ) -> Result<String, GenerationError> {
        let bytes = tokio::fs::read(path).await?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("png");
        self.executor
            .upload_image(&format!("{run_id}_{cut}_{label}.{extension}"), bytes)
            .await
    }
}

#[async_trait]
impl Generator for InpaintGenerator {
    fn engine_name(&self) -> &'static str {
        "inpaint"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let started = Instant::now();
        check_assets(&self.config)?;

        let run_id = new_run_id();
        let base_seed = resolve_base_seed(request.seed);
        let prompts = inpaint_prompts();
        let swatch = self
            .prepare_swatch(&run_id, request.swatch_url.as_deref())
            .await?;

        tracing::info!(
            family_id = %request.family_id,
            color_id = %request.color_id,
            run_id = %run_id,
            base_seed,
            swatch = swatch.as_ref().map(|s| s.scale > 0.0).unwrap_or(false),
            "Starting inpaint generation",
        );

        let mut images = Vec::new();
        for cut in plan_cuts(&request.cuts, self.max_cuts) {
            let Some(assets) = resolve_assets(&self.config, cut) else {
                tracing::error!(cut = %cut, "Missing inpaint assets, skipping cut");
                continue;
            };
            let seed = derive_cut_seed(base_seed, cut);
            let reference = self.upload_asset(&run_id, cut, "reference", &assets.reference).await?;
            let mask = self.upload_asset(&run_id, cut, "mask", &assets.mask).await?;

            let built = build_inpaint_workflow(&InpaintWorkflowParams {
                config: &self.config,
                prompts: &prompts,
                seed,
                reference,
                mask,
                swatch: swatch.clone(),
                filename_prefix: format!("stylist/{run_id}_{cut}"),
            });
            let raw = self.executor.execute(&built.graph, &built.output_node).await?;

            let finished = self
                .finisher
                .finish(
                    &raw,
                    RenderTarget {
                        family_id: &request.family_id,
                        color_id: &request.color_id,
                        run_id: &run_id,
                        cut,
                    },
                )
                .await?;
            tracing::info!(cut = %cut, seed, url = %finished.url, "Cut rendered");

            let ip_adapter_scale = swatch.as_ref().map(|s| s.scale).unwrap_or(0.0);
            let mut meta = json!({
                "seed": seed.to_string(),
                "steps": self.config.steps.to_string(),
                "guidance": self.config.guidance.to_string(),
                "strength": self.config.strength.to_string(),
                "engine": ENGINE,
                "ip_adapter_scale": ip_adapter_scale.to_string(),
            });
            if swatch.is_some() {
                meta["ip_adapter"] = json!(self.config.ip_adapter.source());
            }
            images.push(ImageResult {
                cut,
                url: finished.url,
                width: finished.width,
                height: finished.height,
                watermark: true,
                meta,
            });
        }

        if images.is_empty() {
            return Err(GenerationError::NoOutput);
        }

        Ok(GenerationOutput {
            run_id,
            engine: ENGINE.to_string(),
            images,
            duration_ms: started.elapsed().as_millis() as u64,
            meta: json!({
                "family_id": request.family_id,
                "color_id": request.color_id,
                "engine": ENGINE,
                "base_seed": base_seed.to_string(),
            }),
        })
    }
}
