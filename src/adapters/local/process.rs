use crate::domain::stage::{OutputSink, PipelineStage, StageKind};
use crate::ports::process::{ProcessRunner, RunError};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::task::JoinHandle;

/// Runs tools as child processes on the tokio runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, stage: &PipelineStage) -> Result<(), RunError> {
        let mut command = TokioCommand::new(&stage.program);
        command
            .args(&stage.args)
            .stdin(Stdio::null())
            .stdout(stdio_for(stage.stdout))
            .stderr(stdio_for(stage.stderr));

        tracing::debug!(
            "Starting {} stage: {:?} {:?}",
            stage.kind,
            stage.program,
            stage.args
        );

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            stage: stage.kind,
            program: stage.program.clone(),
            source,
        })?;

        // Piped only for OutputSink::Log, so these are None otherwise.
        let program = stage.program.display().to_string();
        let forwarders: Vec<JoinHandle<()>> = [
            child
                .stdout
                .take()
                .map(|out| spawn_forwarder(out, stage.kind, program.clone(), "stdout")),
            child
                .stderr
                .take()
                .map(|err| spawn_forwarder(err, stage.kind, program.clone(), "stderr")),
        ]
        .into_iter()
        .flatten()
        .collect();

        let status = child.wait().await.map_err(|source| RunError::Io {
            stage: stage.kind,
            program: stage.program.clone(),
            source,
        })?;

        for forwarder in forwarders {
            let _ = forwarder.await;
        }

        check_status(stage, status)
    }
}

fn stdio_for(sink: OutputSink) -> Stdio {
    match sink {
        OutputSink::Inherit => Stdio::inherit(),
        OutputSink::Log => Stdio::piped(),
        OutputSink::Null => Stdio::null(),
    }
}

fn spawn_forwarder<R>(
    reader: R,
    stage: StageKind,
    program: String,
    stream: &'static str,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end();
                    if !line.is_empty() {
                        tracing::info!(%stage, %program, stream, "{}", line);
                    }
                }
                Err(e) => {
                    tracing::warn!("Lost {} of {}: {}", stream, program, e);
                    break;
                }
            }
        }
    })
}

fn check_status(stage: &PipelineStage, status: ExitStatus) -> Result<(), RunError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(RunError::Exit {
            stage: stage.kind,
            program: stage.program.clone(),
            code,
        }),
        None => Err(RunError::Terminated {
            stage: stage.kind,
            program: stage.program.clone(),
        }),
    }
}
