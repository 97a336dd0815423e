//! Builder pattern API for deadmacro analysis.
//!
//! ```rust,ignore
//! use deadmacro_core::prelude::*;
//!
//! let result = Deadmacro::new()
//!     .path("src")
//!     .include(r"\.[ch]$")
//!     .define("NDEBUG")
//!     .analyze()?;
//!
//! for finding in &result.report.findings {
//!     println!("{}", finding.message());
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::cancel::ScanCancellation;
use crate::config::{define_name, OutputFormat, OutputTarget, ScanConfiguration};
use crate::error::DeadmacroResult;
use crate::lexer::TokenSource;
use crate::orchestrator::{ScanOrchestrator, ScanOutcome};
use crate::report::{write_report, Report};

/// Builder for configuring an unused-define scan.
#[derive(Clone, Default)]
pub struct Deadmacro {
    config: ScanConfiguration,
    /// Whether any root was added explicitly (replaces the default `.`).
    explicit_paths: bool,
    cancellation: Option<ScanCancellation>,
    source: Option<Arc<dyn TokenSource>>,
}

impl Deadmacro {
    /// Start from the default configuration (scan `.`, plain output to stdout).
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ScanConfiguration) -> Self {
        Self {
            config,
            explicit_paths: true,
            ..Self::default()
        }
    }

    /// Add a root directory to scan.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        if !self.explicit_paths {
            self.config.root_paths.clear();
            self.explicit_paths = true;
        }
        self.config.root_paths.push(path.into());
        self
    }

    /// Add an include file name pattern.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.config.include_patterns.push(pattern.into());
        self
    }

    /// Add an exclude file name pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.config.exclude_patterns.push(pattern.into());
        self
    }

    /// Treat `name` (or `NAME=VALUE`) as defined in every file.
    pub fn define(mut self, name: impl AsRef<str>) -> Self {
        self.config
            .seed_defines
            .insert(define_name(name.as_ref()).to_string());
        self
    }

    /// Add several seed defines.
    pub fn defines(mut self, names: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        for name in names {
            self = self.define(name);
        }
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn output(mut self, target: OutputTarget) -> Self {
        self.config.output_target = target;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.config.verbose = enabled;
        self
    }

    /// Worker thread count (0 = one per CPU).
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    pub fn cancellation(mut self, cancellation: ScanCancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    pub fn token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(&self) -> &ScanConfiguration {
        &self.config
    }

    /// Run the scan and reconcile the registries into a report.
    pub fn analyze(&self) -> DeadmacroResult<AnalysisResult> {
        let mut orchestrator = ScanOrchestrator::new(self.config.clone());
        if let Some(cancellation) = &self.cancellation {
            orchestrator = orchestrator.with_cancellation(cancellation.clone());
        }
        if let Some(source) = &self.source {
            orchestrator = orchestrator.with_token_source(Arc::clone(source));
        }

        let outcome = orchestrator.run()?;
        let report = Report::from_registries(orchestrator.registries());

        Ok(AnalysisResult { report, outcome })
    }

    /// Analyze, then write the report to the configured target.
    pub fn run(&self) -> DeadmacroResult<AnalysisResult> {
        let result = self.analyze()?;
        write_report(
            &result.report,
            self.config.output_format,
            &self.config.output_target,
        )?;
        Ok(result)
    }
}

/// Result of running an analysis.
#[derive(Debug)]
pub struct AnalysisResult {
    pub report: Report,
    pub outcome: ScanOutcome,
}

impl AnalysisResult {
    /// Check if any unused define was found.
    pub fn has_unused(&self) -> bool {
        !self.report.is_clean()
    }

    pub fn unused_count(&self) -> usize {
        self.report.findings.len()
    }

    /// Percentage of definitions that are unused.
    pub fn unused_percentage(&self) -> f64 {
        if self.report.stats.definitions == 0 {
            0.0
        } else {
            (self.report.stats.unused as f64 / self.report.stats.definitions as f64) * 100.0
        }
    }
}
