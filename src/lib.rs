//! mlv2cpro - Batch MLV to video conversion
//!
//! Each MLV file goes through two external tools: `mlv_dump` turns the
//! container into a legacy RAW stream, then `raw2gpcf` encodes that stream
//! into the output video.
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (discovery, jobs, tool invocations)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations
//! - application/: Pipeline and batch services
//! - config: Run configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use adapters::local::TokioProcessRunner;
pub use application::{BatchOrchestrator, BatchReport};
pub use config::Config;

use anyhow::Result;

/// Build the tokio runtime for a run.
///
/// A sequential run stays on the calling thread. A threaded run gets one
/// worker per allowed job.
pub fn build_runtime(config: &Config) -> Result<tokio::runtime::Runtime> {
    let mut builder = if config.threading {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.worker_threads(config.parallelism());
        builder
    } else {
        tokio::runtime::Builder::new_current_thread()
    };

    builder.enable_all();

    Ok(builder.build()?)
}
