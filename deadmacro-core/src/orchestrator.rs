//! Fans a file set out to concurrent scan workers.
//!
//! Every candidate file becomes one task on a dedicated Rayon pool. A task
//! tokenizes its file, builds a fresh [`DefinitionTable`] from the seed
//! defines and runs a [`ConditionalScanner`] that publishes into the shared
//! [`Registries`]. Tokenizer failures end that task only.
//!
//! Completion is collected over a channel: the orchestrator first polls with
//! a short timeout (so cancellation is noticed and logged promptly), then
//! blocks until every task has reported. Registries are never read while a
//! worker may still write to them.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cancel::ScanCancellation;
use crate::config::ScanConfiguration;
use crate::error::{DeadmacroError, DeadmacroResult};
use crate::lexer::{CTokenizer, TokenSource};
use crate::registry::Registries;
use crate::scan::{gather_candidate_files, FileFilter};
use crate::scanner::{ConditionalScanner, DefinitionTable, ScanSummary};

/// How long each completion poll waits before re-checking cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Result of scanning one file.
#[derive(Debug)]
pub enum FileOutcome {
    Scanned(ScanSummary),
    Failed(DeadmacroError),
    /// Cancellation was raised before the worker started.
    Skipped,
}

/// Aggregate result of a scan run.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files_total: usize,
    pub files_scanned: usize,
    /// Scanned files whose worker stopped early on cancellation.
    pub files_interrupted: usize,
    pub files_skipped: usize,
    /// Workers that never reported (panicked).
    pub files_lost: usize,
    pub failures: Vec<(PathBuf, DeadmacroError)>,
    pub tokens: usize,
    pub cancelled: bool,
}

impl ScanOutcome {
    fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Scanned(summary) => {
                self.files_scanned += 1;
                self.tokens += summary.tokens;
                if summary.cancelled {
                    self.files_interrupted += 1;
                }
            }
            FileOutcome::Failed(err) => self.failures.push((path, err)),
            FileOutcome::Skipped => self.files_skipped += 1,
        }
    }

    fn received(&self) -> usize {
        self.files_scanned + self.files_skipped + self.failures.len()
    }
}

/// Drives a whole scan run over a [`ScanConfiguration`].
pub struct ScanOrchestrator {
    config: ScanConfiguration,
    source: Arc<dyn TokenSource>,
    registries: Arc<Registries>,
    cancellation: ScanCancellation,
}

impl ScanOrchestrator {
    pub fn new(config: ScanConfiguration) -> Self {
        Self {
            config,
            source: Arc::new(CTokenizer::new()),
            registries: Arc::new(Registries::new()),
            cancellation: ScanCancellation::new(),
        }
    }

    /// Replace the default C tokenizer.
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.source = source;
        self
    }

    /// Share an externally owned cancellation flag (e.g. an interrupt handler's).
    pub fn with_cancellation(mut self, cancellation: ScanCancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn config(&self) -> &ScanConfiguration {
        &self.config
    }

    pub fn cancellation(&self) -> ScanCancellation {
        self.cancellation.clone()
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Discover candidate files under the configured roots and scan them.
    pub fn run(&self) -> DeadmacroResult<ScanOutcome> {
        let filter = FileFilter::new(&self.config.include_patterns, &self.config.exclude_patterns)?;
        let files = gather_candidate_files(&self.config.root_paths, &filter)?;
        info!(files = files.len(), "candidate files collected");
        self.scan_files(files)
    }

    /// Scan an explicit file list, one worker per file.
    pub fn scan_files(&self, files: Vec<PathBuf>) -> DeadmacroResult<ScanOutcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .thread_name(|i| format!("deadmacro-worker-{}", i))
            .panic_handler(|_| error!("scan worker panicked"))
            .build()
            .map_err(|e| DeadmacroError::internal(format!("failed to start worker pool: {}", e)))?;

        let seeds: Arc<Vec<String>> = Arc::new(self.config.seed_defines.iter().cloned().collect());
        let (tx, rx) = mpsc::channel::<(PathBuf, FileOutcome)>();

        let mut outcome = ScanOutcome {
            files_total: files.len(),
            ..ScanOutcome::default()
        };

        for path in files {
            let tx = tx.clone();
            let source = Arc::clone(&self.source);
            let registries = Arc::clone(&self.registries);
            let seeds = Arc::clone(&seeds);
            let cancel = self.cancellation.clone();
            pool.spawn(move || {
                let result = scan_file(&path, source.as_ref(), &seeds, &registries, &cancel);
                // The receiver outlives every task; a send error is unreachable.
                let _ = tx.send((path, result));
            });
        }
        drop(tx);

        while outcome.received() < outcome.files_total && !self.cancellation.is_cancelled() {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok((path, result)) => outcome.record(path, result),
                Err(RecvTimeoutError::Timeout) => debug!(
                    done = outcome.received(),
                    total = outcome.files_total,
                    "waiting for scan workers"
                ),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if self.cancellation.is_cancelled() {
            warn!(
                pending = outcome.files_total - outcome.received(),
                "cancellation requested, waiting for workers to stop"
            );
        }

        // Ends once every task has dropped its sender.
        for (path, result) in rx.iter() {
            outcome.record(path, result);
        }

        outcome.files_lost = outcome.files_total - outcome.received();
        outcome.cancelled = self.cancellation.is_cancelled();

        info!(
            scanned = outcome.files_scanned,
            failed = outcome.failures.len(),
            skipped = outcome.files_skipped,
            interrupted = outcome.files_interrupted,
            lost = outcome.files_lost,
            tokens = outcome.tokens,
            definitions = self.registries.definitions.len(),
            usages = self.registries.usages.len(),
            "scan finished"
        );

        Ok(outcome)
    }
}

/// Scan a single file into the shared registries.
pub fn scan_file(
    path: &Path,
    source: &dyn TokenSource,
    seeds: &[String],
    registries: &Registries,
    cancellation: &ScanCancellation,
) -> FileOutcome {
    if cancellation.is_cancelled() {
        return FileOutcome::Skipped;
    }
    info!(file = %path.display(), "running");

    let tokens = match source.tokenize(path) {
        Ok(tokens) => tokens,
        Err(e) => {
            error!(file = %path.display(), error = %e, "tokenizer failed, skipping file");
            return FileOutcome::Failed(e);
        }
    };

    let table = DefinitionTable::seeded(seeds.iter().cloned());
    let mut scanner = ConditionalScanner::new(registries, table, cancellation);
    FileOutcome::Scanned(scanner.scan(&tokens))
}
