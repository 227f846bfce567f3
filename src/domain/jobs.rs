use crate::domain::discovery::base_name;
use crate::ports::process::RunError;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Suffix of the intermediate artifact written by the dump stage
pub const RAW_SUFFIX: &str = "RAW";

/// An input file found by discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub directory: PathBuf,
    /// Kept as raw bytes; camera cards are not guaranteed to use UTF-8.
    pub name: OsString,
}

impl CandidateFile {
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<OsString>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }

    /// Name without the MLV suffix. Output files are named after it.
    pub fn base_name(&self) -> OsString {
        base_name(&self.name)
    }
}

/// The files one pipeline run reads, writes and possibly removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    /// Original MLV file
    pub source_path: PathBuf,
    /// `<out_dir>/<base>.RAW`
    pub raw_path: PathBuf,
    /// `<out_dir>/<base>.<extension>`
    pub output_path: PathBuf,
}

impl TranscodeJob {
    pub fn new(candidate: &CandidateFile, out_dir: &Path, extension: &str) -> Self {
        let base = candidate.base_name();
        Self {
            source_path: candidate.path(),
            raw_path: out_dir.join(with_suffix(&base, RAW_SUFFIX)),
            output_path: out_dir.join(with_suffix(&base, extension)),
        }
    }
}

fn with_suffix(base: &OsStr, suffix: &str) -> OsString {
    let mut name = base.to_owned();
    name.push(".");
    name.push(suffix);
    name
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Dumping,
    DumpFailed,
    Dumped,
    Encoding,
    EncodeFailed,
    Encoded,
    Cleanup,
    Done,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Pending => "pending",
            JobState::Dumping => "dumping",
            JobState::DumpFailed => "dump failed",
            JobState::Dumped => "dumped",
            JobState::Encoding => "encoding",
            JobState::EncodeFailed => "encode failed",
            JobState::Encoded => "encoded",
            JobState::Cleanup => "cleanup",
            JobState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    DumpFailed,
    EncodeFailed,
}

/// Final word on a single job. Only ever logged and counted.
#[derive(Debug)]
pub struct PipelineResult {
    pub outcome: JobOutcome,
    pub error: Option<RunError>,
}

impl PipelineResult {
    pub fn success() -> Self {
        Self {
            outcome: JobOutcome::Success,
            error: None,
        }
    }

    pub fn failed(outcome: JobOutcome, error: RunError) -> Self {
        Self {
            outcome,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == JobOutcome::Success
    }
}
