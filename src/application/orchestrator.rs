use crate::application::pipeline::TranscodeService;
use crate::config::Config;
use crate::domain::discovery::discover;
use crate::domain::jobs::{CandidateFile, JobOutcome, TranscodeJob};
use crate::ports::process::ProcessRunner;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

/// Tally of a batch run. Logged, never turned into an exit code.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub discovered: usize,
    pub succeeded: usize,
    pub dump_failed: usize,
    pub encode_failed: usize,
    /// Jobs whose task panicked before reporting an outcome
    pub aborted: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: Option<JobOutcome>) {
        match outcome {
            Some(JobOutcome::Success) => self.succeeded += 1,
            Some(JobOutcome::DumpFailed) => self.dump_failed += 1,
            Some(JobOutcome::EncodeFailed) => self.encode_failed += 1,
            None => self.aborted += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.dump_failed + self.encode_failed + self.aborted
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s): {} succeeded, {} failed at dump, {} failed at encode",
            self.discovered, self.succeeded, self.dump_failed, self.encode_failed
        )?;
        if self.aborted > 0 {
            write!(f, ", {} aborted", self.aborted)?;
        }
        Ok(())
    }
}

/// Finds MLV files and pushes each one through the pipeline.
pub struct BatchOrchestrator<R> {
    service: TranscodeService<R>,
    config: Arc<Config>,
}

impl<R> BatchOrchestrator<R>
where
    R: ProcessRunner + 'static,
{
    pub fn new(runner: Arc<R>, config: Arc<Config>) -> Self {
        Self {
            service: TranscodeService::new(runner, config.clone()),
            config,
        }
    }

    /// Process every MLV file in `directories` and wait for all of them.
    ///
    /// Without threading each job finishes before the next starts. With
    /// threading up to `Config::parallelism()` jobs run at once, each on
    /// its own task. Job failures are logged and counted, nothing more.
    pub async fn run(&self, directories: &[PathBuf]) -> BatchReport {
        let mut candidates = Vec::new();
        for directory in directories {
            let found = discover(directory).await;
            tracing::info!("Found {} MLV file(s) in {:?}", found.len(), directory);
            candidates.extend(found);
        }

        for (base, sources) in shared_base_names(&candidates) {
            tracing::warn!(
                "{} files share the output name {:?} and will overwrite each other: {:?}",
                sources.len(),
                base,
                sources
            );
        }

        let mut report = BatchReport {
            discovered: candidates.len(),
            ..BatchReport::default()
        };

        let parallelism = self.config.parallelism();
        if self.config.threading {
            tracing::info!("Running up to {} jobs at once", parallelism);
        }

        // Items are pulled lazily, so at most `parallelism` tasks exist at a time.
        let outcomes: Vec<Option<JobOutcome>> = stream::iter(candidates)
            .map(|candidate| {
                let handle = tokio::spawn(self.job_future(candidate));
                async move {
                    match handle.await {
                        Ok(outcome) => Some(outcome),
                        Err(e) => {
                            tracing::error!("Job task failed: {}", e);
                            None
                        }
                    }
                }
            })
            .buffer_unordered(parallelism)
            .collect()
            .await;

        for outcome in outcomes {
            report.record(outcome);
        }

        tracing::info!("Run completed: {}", report);
        report
    }

    fn job_future(
        &self,
        candidate: CandidateFile,
    ) -> impl std::future::Future<Output = JobOutcome> + Send + 'static {
        let service = self.service.clone();
        let job = TranscodeJob::new(&candidate, &self.config.out_dir, &self.config.extension);
        let span = tracing::info_span!("job", file = %candidate.name.to_string_lossy());

        async move {
            tracing::info!("Processing {:?} in {:?}", candidate.name, candidate.directory);
            service.run(&job).await.outcome
        }
        .instrument(span)
    }
}

/// Base names claimed by more than one candidate, with the sources claiming them.
///
/// Such candidates write the same RAW and output files in `out_dir`.
fn shared_base_names(candidates: &[CandidateFile]) -> Vec<(OsString, Vec<PathBuf>)> {
    let mut by_base: BTreeMap<OsString, Vec<PathBuf>> = BTreeMap::new();
    for candidate in candidates {
        by_base
            .entry(candidate.base_name())
            .or_default()
            .push(candidate.path());
    }
    by_base
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .collect()
}
