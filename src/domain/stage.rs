use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which half of the pipeline a tool invocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// MLV container -> legacy RAW stream
    Dump,
    /// RAW stream -> output video
    Encode,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Dump => write!(f, "dump"),
            StageKind::Encode => write!(f, "encode"),
        }
    }
}

/// Where a child's stdout or stderr ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSink {
    /// Share the parent's stream
    #[default]
    Inherit,
    /// Pipe and re-emit each line as a log event
    Log,
    /// Discard
    Null,
}

/// A single external-tool invocation: program, argument vector and sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    pub kind: StageKind,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub stdout: OutputSink,
    pub stderr: OutputSink,
}

impl PipelineStage {
    /// `<mlv_dump> -o <raw> -r <source>`
    ///
    /// `-r` selects the legacy raw output that the encoder consumes.
    pub fn dump(program: &Path, raw_path: &Path, source_path: &Path, sink: OutputSink) -> Self {
        Self {
            kind: StageKind::Dump,
            program: program.to_path_buf(),
            args: vec![
                OsString::from("-o"),
                raw_path.as_os_str().to_owned(),
                OsString::from("-r"),
                source_path.as_os_str().to_owned(),
            ],
            stdout: sink,
            stderr: sink,
        }
    }

    /// `<raw2gpcf> <raw> <output> <output>`
    ///
    /// The encoder expects the output path twice.
    pub fn encode(program: &Path, raw_path: &Path, output_path: &Path, sink: OutputSink) -> Self {
        Self {
            kind: StageKind::Encode,
            program: program.to_path_buf(),
            args: vec![
                raw_path.as_os_str().to_owned(),
                output_path.as_os_str().to_owned(),
                output_path.as_os_str().to_owned(),
            ],
            stdout: sink,
            stderr: sink,
        }
    }
}
