//! Application layer - Services driving the pipeline through ports.

pub mod orchestrator;
pub mod pipeline;

pub use orchestrator::{BatchOrchestrator, BatchReport};
pub use pipeline::TranscodeService;
