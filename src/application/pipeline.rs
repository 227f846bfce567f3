use crate::config::Config;
use crate::domain::jobs::{JobOutcome, JobState, PipelineResult, TranscodeJob};
use crate::domain::stage::PipelineStage;
use crate::ports::process::ProcessRunner;
use std::path::Path;
use std::sync::Arc;

/// Runs the dump -> encode -> cleanup pipeline for one file at a time.
pub struct TranscodeService<R> {
    runner: Arc<R>,
    config: Arc<Config>,
}

impl<R> Clone for TranscodeService<R> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R> TranscodeService<R>
where
    R: ProcessRunner,
{
    pub fn new(runner: Arc<R>, config: Arc<Config>) -> Self {
        Self { runner, config }
    }

    /// Drive a single job to completion.
    ///
    /// A failed stage ends the job on the spot. Nothing after it runs, and
    /// the source and intermediate files stay on disk for inspection.
    pub async fn run(&self, job: &TranscodeJob) -> PipelineResult {
        let mut state = JobState::Pending;

        // Best effort: if this fails the dump stage reports the real problem.
        if let Err(e) = tokio::fs::create_dir_all(&self.config.out_dir).await {
            tracing::warn!(
                "Could not create output directory {:?}: {}",
                self.config.out_dir,
                e
            );
        }

        advance(&mut state, JobState::Dumping);
        let dump = PipelineStage::dump(
            &self.config.mlv_dump,
            &job.raw_path,
            &job.source_path,
            self.config.tool_output,
        );
        if let Err(e) = self.runner.run(&dump).await {
            advance(&mut state, JobState::DumpFailed);
            tracing::error!("{}", e);
            return PipelineResult::failed(JobOutcome::DumpFailed, e);
        }
        advance(&mut state, JobState::Dumped);

        advance(&mut state, JobState::Encoding);
        let encode = PipelineStage::encode(
            &self.config.raw2gpcf,
            &job.raw_path,
            &job.output_path,
            self.config.tool_output,
        );
        if let Err(e) = self.runner.run(&encode).await {
            advance(&mut state, JobState::EncodeFailed);
            tracing::error!("{}", e);
            return PipelineResult::failed(JobOutcome::EncodeFailed, e);
        }
        advance(&mut state, JobState::Encoded);

        advance(&mut state, JobState::Cleanup);
        if !self.config.keep_files {
            tracing::info!("Removing original MLV file");
            remove_quietly(&job.source_path).await;
            tracing::info!("Removing intermediate RAW file");
            remove_quietly(&job.raw_path).await;
        }

        advance(&mut state, JobState::Done);
        tracing::info!("Successfully processed");
        PipelineResult::success()
    }
}

fn advance(state: &mut JobState, next: JobState) {
    tracing::debug!("{} -> {}", state, next);
    *state = next;
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Could not remove {:?}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::CandidateFile;
    use crate::domain::stage::{OutputSink, StageKind};
    use crate::ports::process::{MockProcessRunner, RunError};
    use mockall::Sequence;
    use std::ffi::OsString;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        config: Config,
        job: TranscodeJob,
    }

    /// Source `clip01.mlv` in `<tmp>/in`, outputs go to `<tmp>/out`.
    fn fixture(keep_files: bool) -> Fixture {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("clip01.mlv"), b"mlv").unwrap();

        let config = Config {
            mlv_dump: PathBuf::from("/opt/ml/mlv_dump"),
            raw2gpcf: PathBuf::from("/opt/ml/raw2gpcf"),
            out_dir: dir.path().join("out"),
            extension: String::from("mov"),
            keep_files,
            tool_output: OutputSink::Null,
            ..Config::default()
        };
        let job = TranscodeJob::new(
            &CandidateFile::new(&input, "clip01.mlv"),
            &config.out_dir,
            &config.extension,
        );

        Fixture {
            _dir: dir,
            config,
            job,
        }
    }

    fn service(runner: MockProcessRunner, config: &Config) -> TranscodeService<MockProcessRunner> {
        TranscodeService::new(Arc::new(runner), Arc::new(config.clone()))
    }

    fn exit_error(stage: StageKind, code: i32) -> RunError {
        RunError::Exit {
            stage,
            program: PathBuf::from("tool"),
            code,
        }
    }

    /// Mimic the real tools: dump writes the RAW, encode writes the output.
    /// Both argument vectors carry the file they produce at index 1.
    fn write_target(stage: &PipelineStage) -> Result<(), RunError> {
        fs::write(&stage.args[1], b"data").unwrap();
        Ok(())
    }

    #[tokio::test]
    async fn test_stages_run_in_order_with_exact_arguments() {
        let fx = fixture(true);
        let mut runner = MockProcessRunner::new();
        let mut seq = Sequence::new();

        let raw = fx.job.raw_path.clone();
        let source = fx.job.source_path.clone();
        runner
            .expect_run()
            .withf(move |stage| {
                stage.kind == StageKind::Dump
                    && stage.program == PathBuf::from("/opt/ml/mlv_dump")
                    && stage.args
                        == vec![
                            OsString::from("-o"),
                            raw.clone().into_os_string(),
                            OsString::from("-r"),
                            source.clone().into_os_string(),
                        ]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let raw = fx.job.raw_path.clone();
        let output = fx.job.output_path.clone();
        runner
            .expect_run()
            .withf(move |stage| {
                stage.kind == StageKind::Encode
                    && stage.program == PathBuf::from("/opt/ml/raw2gpcf")
                    && stage.args
                        == vec![
                            raw.clone().into_os_string(),
                            output.clone().into_os_string(),
                            output.clone().into_os_string(),
                        ]
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let result = service(runner, &fx.config).run(&fx.job).await;

        assert_eq!(result.outcome, JobOutcome::Success);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_output_directory_is_created() {
        let fx = fixture(true);
        assert!(!fx.config.out_dir.exists());

        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(2).returning(|_| Ok(()));

        service(runner, &fx.config).run(&fx.job).await;
        assert!(fx.config.out_dir.is_dir());
    }

    #[tokio::test]
    async fn test_unusable_output_directory_still_reaches_dump() {
        let mut fx = fixture(true);
        // A regular file where a parent directory should be.
        let blocker = fx._dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        fx.config.out_dir = blocker.join("out");
        fx.job = TranscodeJob::new(
            &CandidateFile::new(fx._dir.path().join("in"), "clip01.mlv"),
            &fx.config.out_dir,
            &fx.config.extension,
        );

        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|stage| stage.kind == StageKind::Dump)
            .times(1)
            .returning(|_| Err(exit_error(StageKind::Dump, 1)));
        runner
            .expect_run()
            .withf(|stage| stage.kind == StageKind::Encode)
            .times(0);

        let result = service(runner, &fx.config).run(&fx.job).await;

        assert_eq!(result.outcome, JobOutcome::DumpFailed);
        assert!(!fx.config.out_dir.exists());
        assert!(fx.job.source_path.exists());
    }

    #[tokio::test]
    async fn test_dump_failure_skips_encode_and_cleanup() {
        for keep_files in [true, false] {
            let fx = fixture(keep_files);
            let mut runner = MockProcessRunner::new();
            runner
                .expect_run()
                .withf(|stage| stage.kind == StageKind::Dump)
                .times(1)
                .returning(|_| Err(exit_error(StageKind::Dump, 1)));
            runner
                .expect_run()
                .withf(|stage| stage.kind == StageKind::Encode)
                .times(0);

            let result = service(runner, &fx.config).run(&fx.job).await;

            assert_eq!(result.outcome, JobOutcome::DumpFailed);
            assert_eq!(result.error.unwrap().stage(), StageKind::Dump);
            assert!(fx.job.source_path.exists(), "source removed after dump failure");
        }
    }

    #[tokio::test]
    async fn test_encode_failure_keeps_intermediates() {
        let fx = fixture(false);
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|stage| stage.kind == StageKind::Dump)
            .times(1)
            .returning(write_target);
        runner
            .expect_run()
            .withf(|stage| stage.kind == StageKind::Encode)
            .times(1)
            .returning(|_| Err(exit_error(StageKind::Encode, 2)));

        let result = service(runner, &fx.config).run(&fx.job).await;

        assert_eq!(result.outcome, JobOutcome::EncodeFailed);
        assert!(matches!(result.error, Some(RunError::Exit { code: 2, .. })));
        assert!(fx.job.source_path.exists());
        assert!(fx.job.raw_path.exists());
    }

    #[tokio::test]
    async fn test_success_without_keepfiles_removes_source_and_raw() {
        let fx = fixture(false);
        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(2).returning(write_target);

        let result = service(runner, &fx.config).run(&fx.job).await;

        assert!(result.is_success());
        assert!(!fx.job.source_path.exists());
        assert!(!fx.job.raw_path.exists());
        assert!(fx.job.output_path.exists());
    }

    #[tokio::test]
    async fn test_success_with_keepfiles_retains_everything() {
        let fx = fixture(true);
        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(2).returning(write_target);

        let result = service(runner, &fx.config).run(&fx.job).await;

        assert!(result.is_success());
        assert!(fx.job.source_path.exists());
        assert!(fx.job.raw_path.exists());
        assert!(fx.job.output_path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_errors_are_not_fatal() {
        // The dump "succeeds" without writing a RAW, so its removal fails.
        let fx = fixture(false);
        let mut runner = MockProcessRunner::new();
        runner.expect_run().times(2).returning(|_| Ok(()));

        let result = service(runner, &fx.config).run(&fx.job).await;

        assert!(result.is_success());
        assert!(!fx.job.source_path.exists());
    }
}
