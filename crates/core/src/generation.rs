//! Generation request and result types shared by the API, the worker and
//! the generation engines.

use serde::{Deserialize, Serialize};

use crate::cut::Cut;
use crate::error::CoreError;

/// Requested output quality.
///
/// Recorded on the job; engines currently render both at full size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Preview,
    #[default]
    Final,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Final => "final",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "preview" => Ok(Self::Preview),
            "final" => Ok(Self::Final),
            other => Err(CoreError::Validation(format!(
                "Invalid quality '{other}'. Must be one of: preview, final"
            ))),
        }
    }
}

/// Everything an engine needs to render one job.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub family_id: String,
    pub color_id: String,
    pub cuts: Vec<Cut>,
    /// Base seed; a random one is drawn when absent.
    pub seed: Option<u32>,
    pub quality: Quality,
    pub swatch_url: Option<String>,
}

/// One stored render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub cut: Cut,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub watermark: bool,
    /// Engine-specific parameters (seed, steps, guidance, ...).
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Result of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutput {
    pub run_id: String,
    pub engine: String,
    pub images: Vec<ImageResult>,
    pub duration_ms: u64,
    /// Run-level details (family, color, engine settings).
    pub meta: serde_json::Value,
}

/// Truncate `cuts` to at most `max_cuts` entries (at least one).
pub fn limit_cuts(mut cuts: Vec<Cut>, max_cuts: usize) -> Vec<Cut> {
    cuts.truncate(max_cuts.max(1));
    cuts
}
