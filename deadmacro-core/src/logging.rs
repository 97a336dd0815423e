//! Structured logging using **tracing**.
//!
//! Scan workers emit `D`/`U`/`X` events at debug level, per-file progress at
//! info, tokenizer failures at error. Output goes to stderr so stdout stays
//! clean for the report.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::error::DeadmacroError;

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = DeadmacroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(DeadmacroError::invalid_argument(format!(
                "unknown log format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Default filter directive: errors only, or everything at debug when verbose.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "error"
    }
}

/// Initializes the global tracing subscriber.
///
/// Call once at startup. `RUST_LOG` takes precedence over `verbose` when set.
pub fn init_logging(verbose: bool, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr);

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = match format {
        LogFormat::Text => builder.with_ansi(false).try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
}
