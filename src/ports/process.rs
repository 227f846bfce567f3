use crate::domain::stage::{PipelineStage, StageKind};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a tool invocation did not succeed.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("{stage} stage: failed to start {program:?}: {source}")]
    Spawn {
        stage: StageKind,
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{stage} stage: {program:?} exited with status {code}")]
    Exit {
        stage: StageKind,
        program: PathBuf,
        code: i32,
    },

    #[error("{stage} stage: {program:?} was terminated by a signal")]
    Terminated { stage: StageKind, program: PathBuf },

    #[error("{stage} stage: waiting on {program:?} failed: {source}")]
    Io {
        stage: StageKind,
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RunError {
    pub fn stage(&self) -> StageKind {
        match self {
            RunError::Spawn { stage, .. }
            | RunError::Exit { stage, .. }
            | RunError::Terminated { stage, .. }
            | RunError::Io { stage, .. } => *stage,
        }
    }
}

/// Runs external programs to completion.
///
/// Implementations start the program with the stage's argument vector
/// (never through a shell), route its output to the stage's sinks and
/// wait for it to exit. A zero exit status is the only success.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, stage: &PipelineStage) -> Result<(), RunError>;
}
