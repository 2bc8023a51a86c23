//! Image generation engines and the inference-server client they drive.
//!
//! Engines implement [`engine::Generator`]. The mock engine renders a
//! placeholder locally; the SDXL and inpaint engines compose node-graph
//! workflows ([`workflow`]) and execute them on a ComfyUI-compatible
//! inference server ([`executor`]). Every engine watermarks and stores
//! its renders through [`postprocess::Finisher`].

pub mod api;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod inpaint;
pub mod messages;
pub mod mock;
pub mod postprocess;
pub mod prompts;
pub mod sdxl;
pub mod seed;
pub mod swatch;
pub mod workflow;

pub use engine::{build_generator, Generator, SharedGenerator};
pub use error::GenerationError;
