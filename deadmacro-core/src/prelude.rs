//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use deadmacro_core::prelude::*;
//! ```

// Builder API
pub use crate::builder::{AnalysisResult, Deadmacro};

// Core types
pub use crate::cancel::ScanCancellation;
pub use crate::config::{OutputFormat, OutputTarget, ScanConfiguration};
pub use crate::error::{DeadmacroError, DeadmacroResult};

// Scanning
pub use crate::lexer::{CTokenizer, TokenSource};
pub use crate::orchestrator::{ScanOrchestrator, ScanOutcome};
pub use crate::registry::Registries;
pub use crate::scanner::{ConditionalScanner, DefinitionTable};

// Reporting
pub use crate::report::{write_report, Finding, Report};
