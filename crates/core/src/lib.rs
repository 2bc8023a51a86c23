//! Domain types and pure logic shared by the API, the worker and the
//! generation engines.

pub mod catalog;
pub mod cut;
pub mod error;
pub mod generation;
pub mod storage;
pub mod types;
pub mod upload;
pub mod watermark;
