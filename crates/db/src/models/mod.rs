//! Row models and request DTOs.

pub mod color;
pub mod fabric;
pub mod generation_job;
pub mod status;
