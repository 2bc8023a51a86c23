//! SDXL base + refiner engine with optional ControlNet guidance.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use stylist_core::cut::Cut;
use stylist_core::generation::{GenerationOutput, GenerationRequest, ImageResult};
use stylist_core::storage::new_run_id;

use crate::config::SdxlConfig;
use crate::engine::{plan_cuts, Generator};
use crate::error::GenerationError;
use crate::executor::WorkflowExecutor;
use crate::postprocess::{Finisher, RenderTarget};
use crate::prompts::prompts_for;
use crate::seed::{derive_cut_seed, resolve_base_seed};
use crate::workflow::{build_sdxl_workflow, ControlInput, SdxlWorkflowParams, StagePlan};

pub struct SdxlGenerator {
    config: SdxlConfig,
    max_cuts: usize,
    executor: Arc<dyn WorkflowExecutor>,
    finisher: Finisher,
}

impl SdxlGenerator {
    pub fn new(
        config: SdxlConfig,
        max_cuts: usize,
        executor: Arc<dyn WorkflowExecutor>,
        finisher: Finisher,
    ) -> Self {
        Self {
            config,
            max_cuts,
            executor,
            finisher,
        }
    }

    fn engine_label(&self) -> &'static str {
        if self.config.use_refiner {
            "sdxl-refiner"
        } else {
            "sdxl-base"
        }
    }

    /// Upload the control images that apply to `cut`.
    async fn upload_controls(
        &self,
        run_id: &str,
        cut: Cut,
    ) -> Result<Vec<ControlInput<'_>>, GenerationError> {
        let mut controls = Vec::new();
        for (index, (unit, path)) in self.config.control_units_for(cut).into_iter().enumerate() {
            let bytes = tokio::fs::read(path).await?;
            let name = self
                .executor
                .upload_image(&upload_name(run_id, cut, index, path), bytes)
                .await?;
            tracing::debug!(cut = %cut, model = %unit.model, image = %name, "ControlNet image uploaded");
            controls.push(ControlInput { unit, image: name });
        }
        Ok(controls)
    }
}

fn upload_name(run_id: &str, cut: Cut, index: usize, path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png");
    format!("{run_id}_{cut}_control{index}.{extension}")
}

#[async_trait]
impl Generator for SdxlGenerator {
    fn engine_name(&self) -> &'static str {
        "sdxl"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let started = Instant::now();
        let run_id = new_run_id();
        let base_seed = resolve_base_seed(request.seed);
        let plan = StagePlan::new(
            self.config.total_steps,
            self.config.refiner_split,
            self.config.use_refiner,
        );
        let engine = self.engine_label();

        tracing::info!(
            family_id = %request.family_id,
            color_id = %request.color_id,
            run_id = %run_id,
            base_seed,
            engine,
            "Starting SDXL generation",
        );

        let mut images = Vec::new();
        for cut in plan_cuts(&request.cuts, self.max_cuts) {
            let seed = derive_cut_seed(base_seed, cut);
            let prompts = prompts_for(cut);
            let controls = self.upload_controls(&run_id, cut).await?;
            let control_models: Vec<&str> =
                controls.iter().map(|c| c.unit.model.as_str()).collect();

            let built = build_sdxl_workflow(&SdxlWorkflowParams {
                config: &self.config,
                prompts: &prompts,
                seed,
                controls: controls.clone(),
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

            let mut meta = json!({
                "seed": seed.to_string(),
                "steps": plan.total_steps.to_string(),
                "guidance": self.config.guidance.to_string(),
                "engine": engine,
                "controlnets": control_models,
            });
            if let Some(refiner_steps) = plan.refiner_steps {
                meta["refiner_split"] = json!(self.config.refiner_split.to_string());
                meta["refiner_steps"] = json!(refiner_steps.to_string());
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
            engine: engine.to_string(),
            images,
            duration_ms: started.elapsed().as_millis() as u64,
            meta: json!({
                "family_id": request.family_id,
                "color_id": request.color_id,
                "engine": engine,
                "base_seed": base_seed.to_string(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use stylist_core::cut::Cut;
    use stylist_core::generation::Quality;

    use super::*;
    use crate::config::{ControlNetUnit, CutPaths};
    use crate::engine::test_support::{test_finisher, FakeExecutor};

    fn config(use_refiner: bool, controlnet: ControlNetUnit) -> SdxlConfig {
        let mut canny = controlnet.clone();
        canny.enabled = false;
        SdxlConfig {
            base_checkpoint: "base.safetensors".into(),
            refiner_checkpoint: "refiner.safetensors".into(),
            use_refiner,
            refiner_split: 0.7,
            total_steps: 80,
            guidance: 4.3,
            width: 1344,
            height: 2016,
            sampler: "dpmpp_2m".into(),
            scheduler: "karras".into(),
            controlnet,
            controlnet2: canny,
        }
    }

    fn no_controlnet() -> ControlNetUnit {
        ControlNetUnit {
            enabled: false,
            model: String::new(),
            weight: 0.9,
            start: 0.0,
            end: 0.5,
            images: CutPaths::default(),
        }
    }

    fn request(seed: Option<u32>) -> GenerationRequest {
        GenerationRequest {
            family_id: "lana".into(),
            color_id: "azul".into(),
            cuts: vec![Cut::Recto, Cut::Cruzado],
            seed,
            quality: Quality::Final,
            swatch_url: None,
        }
    }

    #[tokio::test]
    async fn renders_each_cut_with_derived_seed() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Arc::new(FakeExecutor::new(64, 96));
        let generator = SdxlGenerator::new(
            config(true, no_controlnet()),
            2,
            executor.clone(),
            test_finisher(dir.path()),
        );

        let output = generator.generate(&request(Some(42))).await.unwrap();

        assert_eq!(output.engine, "sdxl-refiner");
        assert_eq!(output.images.len(), 2);
        let first = &output.images[0];
        assert_eq!(first.meta["seed"], derive_cut_seed(42, Cut::Recto).to_string());
        assert_eq!(first.meta["refiner_steps"], "24");
        assert_eq!(first.meta["steps"], "80");
        assert_eq!((first.width, first.height), (64, 96));

        let executed = executor.executed();
        assert_eq!(executed.len(), 2);
        let seeds: Vec<_> = executed
            .iter()
            .map(|wf| {
                wf.as_object()
                    .unwrap()
                    .values()
                    .find(|n| n["class_type"] == "KSamplerAdvanced")
                    .unwrap()["inputs"]["noise_seed"]
                    .clone()
            })
            .collect();
        assert_eq!(seeds[1], json!(derive_cut_seed(42, Cut::Cruzado)));
    }

    #[tokio::test]
    async fn base_only_engine_label() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Arc::new(FakeExecutor::new(32, 32));
        let generator =
            SdxlGenerator::new(config(false, no_controlnet()), 1, executor, test_finisher(dir.path()));

        let output = generator.generate(&request(None)).await.unwrap();
        assert_eq!(output.engine, "sdxl-base");
        assert_eq!(output.images.len(), 1);
        assert!(output.images[0].meta.get("refiner_steps").is_none());
    }

    #[tokio::test]
    async fn uploads_existing_control_images_only() {
        let dir = tempfile::tempdir().unwrap();
        let depth = dir.path().join("recto_depth.png");
        std::fs::write(&depth, b"depth").unwrap();
        let unit = ControlNetUnit {
            enabled: true,
            model: "depth.safetensors".into(),
            weight: 0.9,
            start: 0.0,
            end: 0.5,
            images: CutPaths {
                recto: Some(depth),
                cruzado: Some(dir.path().join("missing.png")),
            },
        };
        let executor = Arc::new(FakeExecutor::new(32, 32));
        let generator =
            SdxlGenerator::new(config(true, unit), 2, executor.clone(), test_finisher(dir.path()));

        let output = generator.generate(&request(Some(1))).await.unwrap();

        assert_eq!(executor.uploads().len(), 1);
        assert_eq!(output.images[0].meta["controlnets"], json!(["depth.safetensors"]));
        assert_eq!(output.images[1].meta["controlnets"], json!([]));
    }

    #[tokio::test]
    async fn execution_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Arc::new(FakeExecutor::failing());
        let generator =
            SdxlGenerator::new(config(true, no_controlnet()), 2, executor, test_finisher(dir.path()));

        let result = generator.generate(&request(Some(1))).await;
        assert_matches!(result, Err(GenerationError::Execution { .. }));
    }
}
