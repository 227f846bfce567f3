//! mlv2cpro CLI
//!
//! Converts every MLV file in the given directories (or the current one)
//! with mlv_dump and raw2gpcf.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use mlv2cpro::domain::stage::OutputSink;
use mlv2cpro::{build_runtime, BatchOrchestrator, Config, TokioProcessRunner};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "mlv2cpro")]
#[command(about = "Batch convert MLV files with mlv_dump and raw2gpcf", long_about = None)]
struct Cli {
    /// Directories to scan (defaults to the current working directory)
    directories: Vec<PathBuf>,

    /// Path to mlv_dump binary
    #[arg(long, env = "MLVDUMP", default_value = "./mlv_dump")]
    mlvdump: PathBuf,

    /// Path to raw2gpcf binary
    #[arg(long, env = "RAW2GPCF", default_value = "./raw2gpcf")]
    raw2gpcf: PathBuf,

    /// Output directory
    #[arg(long, env = "OUTDIR", default_value = ".")]
    outdir: PathBuf,

    /// File extension
    #[arg(long, env = "EXTENSION", default_value = "mov")]
    extension: String,

    /// Use multi-threading
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    threading: bool,

    /// Keep source files after transcoding
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true"
    )]
    keepfiles: bool,

    /// Maximum number of files converted at once with --threading
    #[arg(long)]
    jobs: Option<NonZeroUsize>,

    /// Where mlv_dump and raw2gpcf output goes
    #[arg(long, value_enum, default_value_t = ToolOutput::Inherit)]
    tool_output: ToolOutput,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ToolOutput {
    /// Straight to this terminal
    Inherit,
    /// Through the log, one event per line
    Log,
    /// Discarded
    Null,
}

impl From<ToolOutput> for OutputSink {
    fn from(value: ToolOutput) -> Self {
        match value {
            ToolOutput::Inherit => OutputSink::Inherit,
            ToolOutput::Log => OutputSink::Log,
            ToolOutput::Null => OutputSink::Null,
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            mlv_dump: self.mlvdump.clone(),
            raw2gpcf: self.raw2gpcf.clone(),
            out_dir: self.outdir.clone(),
            extension: self.extension.clone(),
            threading: self.threading,
            keep_files: self.keepfiles,
            max_parallelism: self.jobs,
            tool_output: self.tool_output.into(),
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = cli.config();
    config.validate()?;

    // Determine if we're using local directory or list of provided ones.
    let directories = if cli.directories.is_empty() {
        let cwd = std::env::current_dir().context("Could not determine working directory")?;
        tracing::info!("Using current working directory to scan: {:?}", cwd);
        vec![cwd]
    } else {
        cli.directories.clone()
    };

    if config.threading {
        tracing::info!("Setting maximum parallelism to {}", config.parallelism());
    }

    let runtime = build_runtime(&config)?;
    let orchestrator = BatchOrchestrator::new(Arc::new(TokioProcessRunner::new()), Arc::new(config));

    // Per-file failures are only logged; the exit status stays 0.
    runtime.block_on(orchestrator.run(&directories));

    Ok(())
}
