//! Run configuration, built once at startup and shared read-only.

use crate::domain::stage::OutputSink;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} path must not be empty")]
    EmptyPath(&'static str),

    #[error("output extension must not be empty")]
    EmptyExtension,

    #[error("output extension {0:?} must not start with a dot")]
    LeadingDot(String),

    #[error("output extension {0:?} must not contain a path separator")]
    SeparatorInExtension(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Path to the mlv_dump binary
    pub mlv_dump: PathBuf,
    /// Path to the raw2gpcf binary
    pub raw2gpcf: PathBuf,
    /// Directory for the intermediate RAW and the final output
    pub out_dir: PathBuf,
    /// Output file extension, without the dot
    pub extension: String,
    /// Run files concurrently instead of one at a time
    pub threading: bool,
    /// Keep the source MLV and intermediate RAW after a successful run
    pub keep_files: bool,
    /// Upper bound on concurrent jobs. Hardware concurrency caps it either way.
    pub max_parallelism: Option<NonZeroUsize>,
    /// Where the tools' own stdout/stderr goes
    pub tool_output: OutputSink,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mlv_dump: Path::new(".").join("mlv_dump"),
            raw2gpcf: Path::new(".").join("raw2gpcf"),
            out_dir: PathBuf::from("."),
            extension: String::from("mov"),
            threading: false,
            keep_files: true,
            max_parallelism: None,
            tool_output: OutputSink::Inherit,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mlv_dump.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("mlvdump"));
        }
        if self.raw2gpcf.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("raw2gpcf"));
        }
        if self.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("outdir"));
        }
        if self.extension.is_empty() {
            return Err(ConfigError::EmptyExtension);
        }
        if self.extension.starts_with('.') {
            return Err(ConfigError::LeadingDot(self.extension.clone()));
        }
        if self.extension.contains(std::path::is_separator) {
            return Err(ConfigError::SeparatorInExtension(self.extension.clone()));
        }
        Ok(())
    }

    /// Number of jobs allowed in flight at once.
    ///
    /// 1 without threading, otherwise `min(max_parallelism, hardware)`.
    pub fn parallelism(&self) -> usize {
        if !self.threading {
            return 1;
        }
        let hardware = hardware_parallelism();
        match self.max_parallelism {
            Some(max) => max.get().min(hardware),
            None => hardware,
        }
    }
}

pub fn hardware_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
