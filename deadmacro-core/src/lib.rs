//! deadmacro-core: unused preprocessor define detection for C and C++ trees.
//!
//! The library scans many files concurrently, tracks which `#define`d names
//! are live under `#if`/`#ifdef`/`#ifndef`/`#else`/`#endif` and reports the
//! ones whose names are never referenced anywhere.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use deadmacro_core::prelude::*;
//!
//! let result = Deadmacro::new()
//!     .path("src")
//!     .include(r"\.(c|h|cpp|hpp)$")
//!     .analyze()?;
//!
//! for finding in &result.report.findings {
//!     println!("{} ({}:{})", finding.message(), finding.file.display(), finding.line);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`lexer`]: logos-based C tokenizer and the [`TokenSource`] seam
//! - [`scanner`]: directive-aware conditional-compilation state machine
//! - [`registry`]: concurrency-safe definition/usage registries
//! - [`scan`]: candidate file discovery and name filters
//! - [`orchestrator`]: one worker per file, cancellation, completion wait
//! - [`report`]: unused-set computation and plain/XML/JSON output
//! - [`builder`]: fluent builder API for configuration
//! - [`error`]: typed error handling
//!
//! # Cargo Features
//!
//! - `xml` (default): structured XML report output

pub mod builder;
pub mod cancel;
pub mod config;
pub mod error;
pub mod lexer;
pub mod logging;
pub mod orchestrator;
pub mod prelude;
pub mod registry;
pub mod report;
pub mod scan;
pub mod scanner;
pub mod token;

// Error types
pub use error::{DeadmacroError, DeadmacroResult, IoResultExt};

// Builder API
pub use builder::{AnalysisResult, Deadmacro};

// Cancellation
pub use cancel::ScanCancellation;

// Configuration
pub use config::{
    define_name, load_config, load_config_file, DeadmacroConfig, OutputConfig, OutputFormat,
    OutputTarget, ScanConfiguration, CONFIG_FILE_NAME,
};

// Tokens and tokenizer
pub use lexer::{tokenize_str, CTokenizer, TokenSource};
pub use token::{Location, Token, TokenKind};

// Logging
pub use logging::{init_logging, LogFormat};

// Scanning
pub use orchestrator::{scan_file, FileOutcome, ScanOrchestrator, ScanOutcome};
pub use scan::{gather_candidate_files, gather_files, FileFilter};
pub use scanner::{ConditionalScanner, DefinitionEntry, DefinitionTable, ScanSummary};

// Registries
pub use registry::{Registries, SymbolRecord, SymbolRegistry};

// Reporting
pub use report::{
    find_unused, render, render_json, render_plain, render_xml, write_report, Finding, Report,
    ReportStats, FINDING_ID, FINDING_SEVERITY,
};

#[cfg(test)]
mod tests;
