//! Node-graph workflow construction.
//!
//! Workflows are JSON objects keyed by node ID; each node names a
//! `class_type` and its `inputs`, where links to other nodes are written
//! as `["<node id>", <output index>]`.

use serde_json::{json, Map, Value};

use crate::config::{ControlNetUnit, InpaintConfig, SdxlConfig};
use crate::prompts::PromptPair;

/// Refiner steps never drop below this.
pub const MIN_REFINER_STEPS: u32 = 5;

/// Sentinel "run to the end" step for advanced samplers.
const LAST_STEP: u32 = 10_000;

/// Reference to output `index` of node `node_id`.
pub fn link(node_id: &str, index: u32) -> Value {
    json!([node_id, index])
}

/// A workflow under construction with sequential node IDs.
#[derive(Debug, Default)]
pub struct WorkflowGraph {
    nodes: Map<String, Value>,
    next_id: u32,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its ID.
    pub fn add(&mut self, class_type: &str, inputs: Value) -> String {
        self.next_id += 1;
        let id = self.next_id.to_string();
        self.nodes.insert(
            id.clone(),
            json!({ "class_type": class_type, "inputs": inputs }),
        );
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.nodes)
    }
}

/// A finished workflow and the node whose image is the result.
#[derive(Debug, Clone)]
pub struct BuiltWorkflow {
    pub graph: Value,
    pub output_node: String,
}

impl BuiltWorkflow {
    /// Every node of `class_type`, in ID order.
    pub fn nodes_of(&self, class_type: &str) -> Vec<&Value> {
        let Some(nodes) = self.graph.as_object() else {
            return Vec::new();
        };
        let mut ids: Vec<_> = nodes.keys().collect();
        ids.sort_by_key(|id| id.parse::<u32>().unwrap_or(u32::MAX));
        ids.into_iter()
            .filter_map(|id| nodes.get(id))
            .filter(|node| node["class_type"] == class_type)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Stage plan
// ---------------------------------------------------------------------------

/// Step split between the SDXL base and refiner stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    pub total_steps: u32,
    /// Last step run by the base model.
    pub base_end: u32,
    /// Steps the refiner runs after `base_end`, if refining.
    pub refiner_steps: Option<u32>,
}

impl StagePlan {
    pub fn new(total_steps: u32, split: f32, use_refiner: bool) -> Self {
        let total_steps = total_steps.max(1);
        if !use_refiner {
            return Self {
                total_steps,
                base_end: total_steps,
                refiner_steps: None,
            };
        }
        let split = split.clamp(0.0, 1.0);
        let base_end = ((total_steps as f32 * split).round() as u32).clamp(1, total_steps);
        let refiner_steps =
            ((total_steps as f32 * (1.0 - split)).round() as u32).max(MIN_REFINER_STEPS);
        Self {
            total_steps,
            base_end,
            refiner_steps: Some(refiner_steps),
        }
    }

    /// Schedule length the refiner sampler is configured with.
    pub fn refiner_schedule(&self) -> Option<u32> {
        self.refiner_steps.map(|steps| self.base_end + steps)
    }
}

// ---------------------------------------------------------------------------
// SDXL text-to-image
// ---------------------------------------------------------------------------

/// A ControlNet unit paired with its uploaded control image.
#[derive(Debug, Clone)]
pub struct ControlInput<'a> {
    pub unit: &'a ControlNetUnit,
    pub image: String,
}

pub struct SdxlWorkflowParams<'a> {
    pub config: &'a SdxlConfig,
    pub prompts: &'a PromptPair,
    pub seed: u32,
    pub controls: Vec<ControlInput<'a>>,
    pub filename_prefix: String,
}

/// Base (+ optional refiner) SDXL graph with ControlNets on the base stage.
pub fn build_sdxl_workflow(params: &SdxlWorkflowParams<'_>) -> BuiltWorkflow {
    let config = params.config;
    let plan = StagePlan::new(config.total_steps, config.refiner_split, config.use_refiner);
    let mut graph = WorkflowGraph::new();

    let base = graph.add(
        "CheckpointLoaderSimple",
        json!({ "ckpt_name": config.base_checkpoint }),
    );
    let positive = graph.add(
        "CLIPTextEncode",
        json!({ "text": params.prompts.positive, "clip": link(&base, 1) }),
    );
    let negative = graph.add(
        "CLIPTextEncode",
        json!({ "text": params.prompts.negative, "clip": link(&base, 1) }),
    );
    let latent = graph.add(
        "EmptyLatentImage",
        json!({ "width": config.width, "height": config.height, "batch_size": 1 }),
    );

    let mut conditioning = (link(&positive, 0), link(&negative, 0));
    for control in &params.controls {
        let loader = graph.add(
            "ControlNetLoader",
            json!({ "control_net_name": control.unit.model }),
        );
        let image = graph.add("LoadImage", json!({ "image": control.image }));
        let apply = graph.add(
            "ControlNetApplyAdvanced",
            json!({
                "positive": conditioning.0,
                "negative": conditioning.1,
                "control_net": link(&loader, 0),
                "image": link(&image, 0),
                "strength": control.unit.weight,
                "start_percent": control.unit.start,
                "end_percent": control.unit.end,
            }),
        );
        conditioning = (link(&apply, 0), link(&apply, 1));
    }

    let decoded = match plan.refiner_schedule() {
        Some(refiner_schedule) => {
            let base_sampler = graph.add(
                "KSamplerAdvanced",
                json!({
                    "model": link(&base, 0),
                    "add_noise": "enable",
                    "noise_seed": params.seed,
                    "steps": plan.total_steps,
                    "cfg": config.guidance,
                    "sampler_name": config.sampler,
                    "scheduler": config.scheduler,
                    "positive": conditioning.0,
                    "negative": conditioning.1,
                    "latent_image": link(&latent, 0),
                    "start_at_step": 0,
                    "end_at_step": plan.base_end,
                    "return_with_leftover_noise": "enable",
                }),
            );
            let refiner = graph.add(
                "CheckpointLoaderSimple",
                json!({ "ckpt_name": config.refiner_checkpoint }),
            );
            let refiner_positive = graph.add(
                "CLIPTextEncode",
                json!({ "text": params.prompts.positive, "clip": link(&refiner, 1) }),
            );
            let refiner_negative = graph.add(
                "CLIPTextEncode",
                json!({ "text": params.prompts.negative, "clip": link(&refiner, 1) }),
            );
            let refiner_sampler = graph.add(
                "KSamplerAdvanced",
                json!({
                    "model": link(&refiner, 0),
                    "add_noise": "disable",
                    "noise_seed": params.seed,
                    "steps": refiner_schedule,
                    "cfg": config.guidance,
                    "sampler_name": config.sampler,
                    "scheduler": config.scheduler,
                    "positive": link(&refiner_positive, 0),
                    "negative": link(&refiner_negative, 0),
                    "latent_image": link(&base_sampler, 0),
                    "start_at_step": plan.base_end,
                    "end_at_step": LAST_STEP,
                    "return_with_leftover_noise": "disable",
                }),
            );
            graph.add(
                "VAEDecode",
                json!({ "samples": link(&refiner_sampler, 0), "vae": link(&refiner, 2) }),
            )
        }
        None => {
            let sampler = graph.add(
                "KSampler",
                json!({
                    "model": link(&base, 0),
                    "seed": params.seed,
                    "steps": plan.total_steps,
                    "cfg": config.guidance,
                    "sampler_name": config.sampler,
                    "scheduler": config.scheduler,
                    "positive": conditioning.0,
                    "negative": conditioning.1,
                    "latent_image": link(&latent, 0),
                    "denoise": 1.0,
                }),
            );
            graph.add(
                "VAEDecode",
                json!({ "samples": link(&sampler, 0), "vae": link(&base, 2) }),
            )
        }
    };

    let output_node = graph.add(
        "SaveImage",
        json!({ "images": link(&decoded, 0), "filename_prefix": params.filename_prefix }),
    );

    BuiltWorkflow {
        graph: graph.into_value(),
        output_node,
    }
}

// ---------------------------------------------------------------------------
// SDXL inpaint
// ---------------------------------------------------------------------------

/// Swatch conditioning through IP-Adapter.
#[derive(Debug, Clone)]
pub struct SwatchInput {
    pub image: String,
    pub scale: f32,
}

pub struct InpaintWorkflowParams<'a> {
    pub config: &'a InpaintConfig,
    pub prompts: &'a PromptPair,
    pub seed: u32,
    pub reference: String,
    pub mask: String,
    /// `None` when IP-Adapter is disabled.
    pub swatch: Option<SwatchInput>,
    pub filename_prefix: String,
}

/// Inpaint the masked garment area of a reference photo.
pub fn build_inpaint_workflow(params: &InpaintWorkflowParams<'_>) -> BuiltWorkflow {
    let config = params.config;
    let mut graph = WorkflowGraph::new();

    let checkpoint = graph.add(
        "CheckpointLoaderSimple",
        json!({ "ckpt_name": config.model }),
    );
    let positive = graph.add(
        "CLIPTextEncode",
        json!({ "text": params.prompts.positive, "clip": link(&checkpoint, 1) }),
    );
    let negative = graph.add(
        "CLIPTextEncode",
        json!({ "text": params.prompts.negative, "clip": link(&checkpoint, 1) }),
    );

    let reference = graph.add("LoadImage", json!({ "image": params.reference }));
    let reference = graph.add(
        "ImageScale",
        json!({
            "image": link(&reference, 0),
            "upscale_method": "lanczos",
            "width": config.width,
            "height": config.height,
            "crop": "center",
        }),
    );
    let mask_image = graph.add("LoadImage", json!({ "image": params.mask }));
    let mask_image = graph.add(
        "ImageScale",
        json!({
            "image": link(&mask_image, 0),
            "upscale_method": "nearest-exact",
            "width": config.width,
            "height": config.height,
            "crop": "center",
        }),
    );
    let mask = graph.add(
        "ImageToMask",
        json!({ "image": link(&mask_image, 0), "channel": "red" }),
    );

    let mut model = link(&checkpoint, 0);
    if let Some(swatch) = &params.swatch {
        let ip_loader = graph.add(
            "IPAdapterModelLoader",
            json!({ "ipadapter_file": config.ip_adapter.model_file() }),
        );
        let clip_vision = graph.add(
            "CLIPVisionLoader",
            json!({ "clip_name": config.ip_adapter.clip_vision }),
        );
        let swatch_image = graph.add("LoadImage", json!({ "image": swatch.image }));
        let adapter = graph.add(
            "IPAdapterAdvanced",
            json!({
                "model": model,
                "ipadapter": link(&ip_loader, 0),
                "image": link(&swatch_image, 0),
                "clip_vision": link(&clip_vision, 0),
                "weight": swatch.scale,
                "weight_type": "linear",
                "combine_embeds": "concat",
                "start_at": 0.0,
                "end_at": 1.0,
                "embeds_scaling": "V only",
            }),
        );
        model = link(&adapter, 0);
    }

    let conditioning = graph.add(
        "InpaintModelConditioning",
        json!({
            "positive": link(&positive, 0),
            "negative": link(&negative, 0),
            "vae": link(&checkpoint, 2),
            "pixels": link(&reference, 0),
            "mask": link(&mask, 0),
            "noise_mask": true,
        }),
    );
    let sampler = graph.add(
        "KSampler",
        json!({
            "model": model,
            "seed": params.seed,
            "steps": config.steps,
            "cfg": config.guidance,
            "sampler_name": config.sampler,
            "scheduler": config.scheduler,
            "positive": link(&conditioning, 0),
            "negative": link(&conditioning, 1),
            "latent_image": link(&conditioning, 2),
            "denoise": config.strength,
        }),
    );
    let decoded = graph.add(
        "VAEDecode",
        json!({ "samples": link(&sampler, 0), "vae": link(&checkpoint, 2) }),
    );
    let output_node = graph.add(
        "SaveImage",
        json!({ "images": link(&decoded, 0), "filename_prefix": params.filename_prefix }),
    );

    BuiltWorkflow {
        graph: graph.into_value(),
        output_node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CutPaths, IpAdapterConfig};
    use crate::prompts::{inpaint_prompts, prompts_for};
    use stylist_core::cut::Cut;

    fn sdxl_config(use_refiner: bool) -> SdxlConfig {
        let unit = |weight, start, end| ControlNetUnit {
            enabled: true,
            model: "cn.safetensors".into(),
            weight,
            start,
            end,
            images: CutPaths::default(),
        };
        SdxlConfig {
            base_checkpoint: "base.safetensors".into(),
            refiner_checkpoint: "refiner.safetensors".into(),
            use_refiner,
            refiner_split: 0.70,
            total_steps: 80,
            guidance: 4.3,
            width: 1344,
            height: 2016,
            sampler: "dpmpp_2m".into(),
            scheduler: "karras".into(),
            controlnet: unit(0.9, 0.0, 0.5),
            controlnet2: unit(0.65, 0.05, 0.88),
        }
    }

    fn inpaint_config() -> InpaintConfig {
        InpaintConfig {
            model: "inpaint.safetensors".into(),
            strength: 0.85,
            guidance: 7.5,
            steps: 50,
            width: 1024,
            height: 1536,
            sampler: "dpmpp_2m".into(),
            scheduler: "karras".into(),
            references: CutPaths::default(),
            masks: CutPaths::default(),
            ip_adapter: IpAdapterConfig {
                enabled: true,
                repo: "h94/IP-Adapter".into(),
                subfolder: "sdxl_models".into(),
                weight: "ip-adapter-plus_sdxl_vit-h.safetensors".into(),
                clip_vision: "clip-h.safetensors".into(),
                scale: 0.7,
            },
        }
    }

    #[test]
    fn stage_plan_with_refiner() {
        let plan = StagePlan::new(80, 0.70, true);
        assert_eq!(plan.base_end, 56);
        assert_eq!(plan.refiner_steps, Some(24));
        assert_eq!(plan.refiner_schedule(), Some(80));
    }

    #[test]
    fn stage_plan_enforces_min_refiner_steps() {
        let plan = StagePlan::new(10, 0.9, true);
        assert_eq!(plan.base_end, 9);
        assert_eq!(plan.refiner_steps, Some(MIN_REFINER_STEPS));
    }

    #[test]
    fn stage_plan_without_refiner() {
        let plan = StagePlan::new(30, 0.7, false);
        assert_eq!(plan.base_end, 30);
        assert_eq!(plan.refiner_schedule(), None);
    }

    #[test]
    fn graph_assigns_sequential_ids() {
        let mut graph = WorkflowGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.add("A", json!({})), "1");
        assert_eq!(graph.add("B", json!({ "x": link("1", 0) })), "2");
        assert_eq!(graph.len(), 2);
        let value = graph.into_value();
        assert_eq!(value["2"]["inputs"]["x"], json!(["1", 0]));
    }

    #[test]
    fn sdxl_refiner_graph() {
        let config = sdxl_config(true);
        let prompts = prompts_for(Cut::Recto);
        let built = build_sdxl_workflow(&SdxlWorkflowParams {
            config: &config,
            prompts: &prompts,
            seed: 1234,
            controls: Vec::new(),
            filename_prefix: "stylist/recto".into(),
        });

        let samplers = built.nodes_of("KSamplerAdvanced");
        assert_eq!(samplers.len(), 2);
        assert_eq!(samplers[0]["inputs"]["end_at_step"], 56);
        assert_eq!(samplers[0]["inputs"]["return_with_leftover_noise"], "enable");
        assert_eq!(samplers[1]["inputs"]["start_at_step"], 56);
        assert_eq!(samplers[1]["inputs"]["add_noise"], "disable");
        assert_eq!(samplers[1]["inputs"]["noise_seed"], 1234);
        assert_eq!(built.nodes_of("CheckpointLoaderSimple").len(), 2);
        assert_eq!(built.graph[&built.output_node]["class_type"], "SaveImage");
    }

    #[test]
    fn sdxl_base_only_graph() {
        let config = sdxl_config(false);
        let prompts = prompts_for(Cut::Cruzado);
        let built = build_sdxl_workflow(&SdxlWorkflowParams {
            config: &config,
            prompts: &prompts,
            seed: 9,
            controls: Vec::new(),
            filename_prefix: "p".into(),
        });

        assert!(built.nodes_of("KSamplerAdvanced").is_empty());
        let samplers = built.nodes_of("KSampler");
        assert_eq!(samplers.len(), 1);
        assert_eq!(samplers[0]["inputs"]["steps"], 80);
        let latent = built.nodes_of("EmptyLatentImage");
        assert_eq!(latent[0]["inputs"]["width"], 1344);
        assert_eq!(latent[0]["inputs"]["height"], 2016);
    }

    #[test]
    fn controlnets_chain_on_base_stage() {
        let config = sdxl_config(true);
        let prompts = prompts_for(Cut::Recto);
        let built = build_sdxl_workflow(&SdxlWorkflowParams {
            config: &config,
            prompts: &prompts,
            seed: 1,
            controls: vec![
                ControlInput { unit: &config.controlnet, image: "depth.png".into() },
                ControlInput { unit: &config.controlnet2, image: "canny.png".into() },
            ],
            filename_prefix: "p".into(),
        });

        let applies = built.nodes_of("ControlNetApplyAdvanced");
        assert_eq!(applies.len(), 2);
        assert_eq!(applies[0]["inputs"]["end_percent"].as_f64().unwrap() as f32, 0.5);
        assert_eq!(applies[1]["inputs"]["start_percent"].as_f64().unwrap() as f32, 0.05);

        let objects = built.graph.as_object().unwrap();
        let second_apply_id = objects
            .iter()
            .filter(|(_, n)| n["class_type"] == "ControlNetApplyAdvanced")
            .map(|(id, _)| id.parse::<u32>().unwrap())
            .max()
            .unwrap()
            .to_string();
        let samplers = built.nodes_of("KSamplerAdvanced");
        assert_eq!(samplers[0]["inputs"]["positive"], json!([second_apply_id, 0]));
        assert_eq!(samplers[0]["inputs"]["negative"], json!([second_apply_id, 1]));
        assert_ne!(samplers[1]["inputs"]["positive"][0], json!(second_apply_id));
    }

    #[test]
    fn inpaint_graph_with_swatch() {
        let config = inpaint_config();
        let prompts = inpaint_prompts();
        let built = build_inpaint_workflow(&InpaintWorkflowParams {
            config: &config,
            prompts: &prompts,
            seed: 77,
            reference: "recto_reference.jpg".into(),
            mask: "recto_mask.png".into(),
            swatch: Some(SwatchInput { image: "swatch.png".into(), scale: 0.7 }),
            filename_prefix: "p".into(),
        });

        let adapters = built.nodes_of("IPAdapterAdvanced");
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0]["inputs"]["weight"].as_f64().unwrap() as f32, 0.7);
        let loader = &built.nodes_of("IPAdapterModelLoader")[0]["inputs"];
        assert_eq!(
            loader["ipadapter_file"],
            "sdxl_models/ip-adapter-plus_sdxl_vit-h.safetensors"
        );
        let sampler = &built.nodes_of("KSampler")[0]["inputs"];
        assert_eq!(sampler["denoise"].as_f64().unwrap() as f32, 0.85);
        assert_eq!(sampler["steps"], 50);
        assert_eq!(sampler["seed"], 77);
        assert_eq!(built.nodes_of("LoadImage").len(), 3);
    }

    #[test]
    fn inpaint_graph_without_ip_adapter() {
        let config = inpaint_config();
        let prompts = inpaint_prompts();
        let built = build_inpaint_workflow(&InpaintWorkflowParams {
            config: &config,
            prompts: &prompts,
            seed: 1,
            reference: "r.jpg".into(),
            mask: "m.png".into(),
            swatch: None,
            filename_prefix: "p".into(),
        });

        assert!(built.nodes_of("IPAdapterAdvanced").is_empty());
        let sampler = &built.nodes_of("KSampler")[0]["inputs"];
        assert_eq!(sampler["model"], json!(["1", 0]));
    }
}
