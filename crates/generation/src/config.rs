//! Generator configuration loaded from environment variables.

use std::path::{Path, PathBuf};

use stylist_core::cut::Cut;
use stylist_core::watermark::DEFAULT_WATERMARK_SCALE;

/// Which engine renders jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorMode {
    Mock,
    Sdxl,
    Inpaint,
}

impl GeneratorMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mock" => Some(Self::Mock),
            "sdxl" => Some(Self::Sdxl),
            "inpaint" => Some(Self::Inpaint),
            _ => None,
        }
    }
}

/// A pair of per-cut file paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutPaths {
    pub recto: Option<PathBuf>,
    pub cruzado: Option<PathBuf>,
}

impl CutPaths {
    pub fn get(&self, cut: Cut) -> Option<&Path> {
        match cut {
            Cut::Recto => self.recto.as_deref(),
            Cut::Cruzado => self.cruzado.as_deref(),
        }
    }

    /// The path for `cut`, but only when the file exists.
    pub fn existing(&self, cut: Cut) -> Option<&Path> {
        self.get(cut).filter(|path| path.is_file())
    }
}

/// Inference server connection settings.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

/// One ControlNet unit applied to the base stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlNetUnit {
    pub enabled: bool,
    pub model: String,
    pub weight: f32,
    pub start: f32,
    pub end: f32,
    pub images: CutPaths,
}

impl ControlNetUnit {
    /// Control image for `cut` when the unit is usable.
    pub fn image_for(&self, cut: Cut) -> Option<&Path> {
        if !self.enabled || self.model.is_empty() {
            return None;
        }
        self.images.existing(cut)
    }
}

/// SDXL base + refiner settings.
#[derive(Debug, Clone)]
pub struct SdxlConfig {
    pub base_checkpoint: String,
    pub refiner_checkpoint: String,
    pub use_refiner: bool,
    pub refiner_split: f32,
    pub total_steps: u32,
    pub guidance: f32,
    pub width: u32,
    pub height: u32,
    pub sampler: String,
    pub scheduler: String,
    /// Depth unit.
    pub controlnet: ControlNetUnit,
    /// Canny unit, only loaded when the depth unit is enabled.
    pub controlnet2: ControlNetUnit,
}

/// IP-Adapter settings for swatch conditioning.
///
/// The server's ipadapter model directory mirrors the upstream repo layout,
/// so `subfolder` prefixes the weight file the loader node opens.
#[derive(Debug, Clone)]
pub struct IpAdapterConfig {
    pub enabled: bool,
    /// Upstream repo the weights come from; recorded in image meta.
    pub repo: String,
    pub subfolder: String,
    pub weight: String,
    pub clip_vision: String,
    pub scale: f32,
}

impl IpAdapterConfig {
    /// Weight file path relative to the server's ipadapter model directory.
    pub fn model_file(&self) -> String {
        let subfolder = self.subfolder.trim_matches('/');
        if subfolder.is_empty() {
            self.weight.clone()
        } else {
            format!("{subfolder}/{}", self.weight)
        }
    }

    /// `{repo}/{subfolder}/{weight}`, identifying the weights used.
    pub fn source(&self) -> String {
        let repo = self.repo.trim_matches('/');
        if repo.is_empty() {
            self.model_file()
        } else {
            format!("{repo}/{}", self.model_file())
        }
    }
}

/// SDXL inpainting settings.
#[derive(Debug, Clone)]
pub struct InpaintConfig {
    pub model: String,
    pub strength: f32,
    pub guidance: f32,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub sampler: String,
    pub scheduler: String,
    pub references: CutPaths,
    pub masks: CutPaths,
    pub ip_adapter: IpAdapterConfig,
}

/// Everything needed to build a generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub mode: GeneratorMode,
    pub max_cuts: usize,
    pub inference: InferenceConfig,
    pub watermark_path: PathBuf,
    pub watermark_scale: f32,
    pub public_base_url: Option<String>,
    pub sdxl: SdxlConfig,
    pub inpaint: InpaintConfig,
}

impl GeneratorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                         |
    /// |---------------------------|---------------------------------|
    /// | `GENERATOR_MODE`          | `sdxl`                          |
    /// | `USE_MOCK_GENERATOR`      | `false` (forces `mock`)         |
    /// | `MAX_CUTS`                | `2`                             |
    /// | `INFERENCE_URL`           | `http://127.0.0.1:8188`         |
    /// | `INFERENCE_TIMEOUT_SECS`  | `600`                           |
    /// | `WATERMARK_PATH`          | `assets/watermark-logo.png`     |
    /// | `WATERMARK_SCALE`         | `0.30`                          |
    /// | `PUBLIC_BASE_URL`         | (unset)                         |
    ///
    /// SDXL, ControlNet, inpaint and IP-Adapter variables are read by
    /// [`SdxlConfig::from_env`] and [`InpaintConfig::from_env`].
    ///
    /// Panics on unparseable values.
    pub fn from_env() -> Self {
        let mode = if env_bool("USE_MOCK_GENERATOR", false) {
            GeneratorMode::Mock
        } else {
            let name = env_string("GENERATOR_MODE", "sdxl");
            GeneratorMode::parse(&name).unwrap_or_else(|| {
                panic!("GENERATOR_MODE must be one of mock, sdxl, inpaint; got '{name}'")
            })
        };

        Self {
            mode,
            max_cuts: env_parse("MAX_CUTS", 2),
            inference: InferenceConfig {
                url: env_string("INFERENCE_URL", "http://127.0.0.1:8188"),
                timeout_secs: env_parse("INFERENCE_TIMEOUT_SECS", 600),
            },
            watermark_path: PathBuf::from(env_string(
                "WATERMARK_PATH",
                "assets/watermark-logo.png",
            )),
            watermark_scale: env_parse("WATERMARK_SCALE", DEFAULT_WATERMARK_SCALE),
            public_base_url: env_opt("PUBLIC_BASE_URL"),
            sdxl: SdxlConfig::from_env(),
            inpaint: InpaintConfig::from_env(),
        }
    }
}

impl SdxlConfig {
    pub fn from_env() -> Self {
        Self {
            base_checkpoint: env_string("SDXL_BASE_CHECKPOINT", "sd_xl_base_1.0.safetensors"),
            refiner_checkpoint: env_string(
                "SDXL_REFINER_CHECKPOINT",
                "sd_xl_refiner_1.0.safetensors",
            ),
            use_refiner: env_bool("USE_REFINER", true),
            refiner_split: env_parse("REFINER_SPLIT", 0.70),
            total_steps: env_parse("TOTAL_STEPS", 80),
            guidance: env_parse("GUIDANCE", 4.3),
            width: 1344,
            height: 2016,
            sampler: env_string("SAMPLER_NAME", "dpmpp_2m"),
            scheduler: env_string("SCHEDULER", "karras"),
            controlnet: ControlNetUnit {
                enabled: env_bool("CONTROLNET_ENABLED", false),
                model: env_string("CONTROLNET_MODEL", ""),
                weight: env_parse("CONTROLNET_WEIGHT", 0.9),
                start: env_parse("CONTROLNET_GUIDANCE_START", 0.0),
                end: env_parse("CONTROLNET_GUIDANCE_END", 0.5),
                images: CutPaths {
                    recto: env_opt("CONTROL_IMAGE_RECTO").map(PathBuf::from),
                    cruzado: env_opt("CONTROL_IMAGE_CRUZADO").map(PathBuf::from),
                },
            },
            controlnet2: ControlNetUnit {
                enabled: env_bool("CONTROLNET2_ENABLED", false),
                model: env_string("CONTROLNET2_MODEL", ""),
                weight: env_parse("CONTROLNET2_WEIGHT", 0.65),
                start: env_parse("CONTROLNET2_GUIDANCE_START", 0.05),
                end: env_parse("CONTROLNET2_GUIDANCE_END", 0.88),
                images: CutPaths {
                    recto: env_opt("CONTROL_IMAGE_RECTO_CANNY").map(PathBuf::from),
                    cruzado: env_opt("CONTROL_IMAGE_CRUZADO_CANNY").map(PathBuf::from),
                },
            },
        }
    }

    /// ControlNet units that apply to `cut`, paired with their image.
    ///
    /// Each loaded unit contributes independently when its own control image
    /// for `cut` exists.
    pub fn control_units_for(&self, cut: Cut) -> Vec<(&ControlNetUnit, &Path)> {
        let mut units = Vec::new();
        if !self.controlnet.enabled || self.controlnet.model.is_empty() {
            return units;
        }
        if let Some(primary) = self.controlnet.image_for(cut) {
            units.push((&self.controlnet, primary));
        }
        if let Some(secondary) = self.controlnet2.image_for(cut) {
            units.push((&self.controlnet2, secondary));
        }
        units
    }
}

impl InpaintConfig {
    pub fn from_env() -> Self {
        let assets = PathBuf::from(env_string("INPAINT_ASSETS_DIR", "assets/inpaint"));
        let asset = |var: &str, file: &str| {
            Some(env_opt(var).map(PathBuf::from).unwrap_or_else(|| assets.join(file)))
        };

        Self {
            model: env_string("INPAINT_MODEL", "sd_xl_base_1.0_inpainting_0.1.safetensors"),
            strength: env_parse("INPAINT_STRENGTH", 0.85),
            guidance: env_parse("INPAINT_GUIDANCE", 7.5),
            steps: env_parse("INPAINT_STEPS", 50),
            width: 1024,
            height: 1536,
            sampler: env_string("INPAINT_SAMPLER_NAME", "dpmpp_2m"),
            scheduler: env_string("INPAINT_SCHEDULER", "karras"),
            references: CutPaths {
                recto: asset("INPAINT_REF_RECTO", "recto_reference.jpg"),
                cruzado: asset("INPAINT_REF_CRUZADO", "cruzado_reference.jpg"),
            },
            masks: CutPaths {
                recto: asset("INPAINT_MASK_RECTO", "recto_mask.png"),
                cruzado: asset("INPAINT_MASK_CRUZADO", "cruzado_mask.png"),
            },
            ip_adapter: IpAdapterConfig {
                enabled: env_bool("IP_ADAPTER_ENABLED", true),
                repo: env_string("IP_ADAPTER_REPO", "h94/IP-Adapter"),
                subfolder: env_string("IP_ADAPTER_SUBFOLDER", "sdxl_models"),
                weight: env_opt("INPAINT_IP_ADAPTER_WEIGHT")
                    .or_else(|| env_opt("IP_ADAPTER_WEIGHT"))
                    .unwrap_or_else(|| "ip-adapter-plus_sdxl_vit-h.safetensors".into()),
                clip_vision: env_string(
                    "IP_ADAPTER_CLIP_VISION",
                    "CLIP-ViT-H-14-laion2B-s32B-b79K.safetensors",
                ),
                scale: match env_opt("INPAINT_IP_ADAPTER_SCALE")
                    .or_else(|| env_opt("IP_ADAPTER_SCALE"))
                {
                    Some(raw) => raw
                        .parse()
                        .unwrap_or_else(|_| panic!("IP_ADAPTER_SCALE must be a number, got '{raw}'")),
                    None => 0.7,
                },
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Env helpers
// ---------------------------------------------------------------------------

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_string(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

/// `1`, `true`, `yes` and `on` are truthy (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} has an invalid value '{raw}'")),
        None => default,
    }
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
