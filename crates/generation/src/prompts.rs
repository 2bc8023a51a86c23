//! Prompt templates for catalog renders.

use stylist_core::cut::Cut;

pub const BASE_PROMPT: &str = "studio catalog photo of a men's tailored suit on a manneque, \
ultra-realistic, high detail, clear background, even lighting, 85mm look, clean tailoring, \
correct grain, even drape, crisp lapels, sharp stitching, true fabric texture, no stretch, ";

pub const BASE_NEGATIVE: &str = "blurry, low quality, text, watermark, logo, jpeg artifacts, \
texture stretching, melted cloth, rubbery fabric, wavy weave, misaligned buttons, \
off-center buttons, missing buttons, warped edges, asymmetry, twisted torso, \
duplicated patterns, heavy denoise";

pub const INPAINT_PROMPT: &str = "high quality suit fabric texture, tailored menswear, \
detailed weave pattern, professional studio lighting, crisp lapels, clean stitching";

pub const INPAINT_NEGATIVE: &str = "blurry, low quality, distorted, watermark, text, \
wrinkled, dirty, stained, torn fabric";

/// Cut-specific additions to the shared prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutTemplate {
    pub positive: &'static str,
    pub negative: &'static str,
}

pub fn cut_template(cut: Cut) -> CutTemplate {
    match cut {
        Cut::Recto => CutTemplate {
            positive: "single-breasted 2-button, notch lapels, patch pockets, \
buttons centered on placket, symmetric front",
            negative: "double-breasted, peak lapels",
        },
        Cut::Cruzado => CutTemplate {
            positive: "double-breasted 6x2, peak lapels, clean overlap, button rows symetric",
            negative: "single-breasted, notch lapels",
        },
    }
}

/// Positive and negative prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub positive: String,
    pub negative: String,
}

/// Shared prompts joined with the cut's template.
pub fn prompts_for(cut: Cut) -> PromptPair {
    let template = cut_template(cut);
    PromptPair {
        positive: join_prompt(BASE_PROMPT, template.positive),
        negative: join_prompt(BASE_NEGATIVE, template.negative),
    }
}

/// Fixed prompts for inpainting.
pub fn inpaint_prompts() -> PromptPair {
    PromptPair {
        positive: INPAINT_PROMPT.to_string(),
        negative: INPAINT_NEGATIVE.to_string(),
    }
}

/// `"{base}, {extra}"` without dangling separators.
fn join_prompt(base: &str, extra: &str) -> String {
    let separator = |c: char| c == ',' || c.is_whitespace();
    let base = base.trim_matches(separator);
    let extra = extra.trim_matches(separator);
    if extra.is_empty() {
        base.to_string()
    } else {
        format!("{base}, {extra}")
    }
}
