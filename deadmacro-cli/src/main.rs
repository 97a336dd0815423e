//! deadmacro CLI - unused preprocessor define detector for C and C++ trees.
//!
//! Features:
//! - Conditional-aware scanning (`#if 0`, `#ifdef`, `#ifndef`, `#else`)
//! - Seed defines from the command line or deadmacro.toml
//! - Rayon-powered parallel scanning, one task per file
//! - Plain, XML and JSON reports
//! - Ctrl-C stops the scan and still reports what was recorded

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use deadmacro_core::{
    define_name, init_logging, load_config, load_config_file, write_report, DeadmacroConfig,
    LogFormat, OutputFormat, OutputTarget, Report, ScanCancellation, ScanConfiguration,
    ScanOrchestrator,
};

/// Exit code for a clean run.
const EXIT_CLEAN: i32 = 0;
/// Exit code when unused defines were reported.
const EXIT_FINDINGS: i32 = 1;
/// Exit code for fatal errors (bad arguments, unwritable report, panic).
const EXIT_FATAL: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find unused #define macros in C and C++ sources")]
pub struct Cli {
    /// Write the report to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report format: plain, xml or json
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Treat NAME as defined in every file (NAME=VALUE accepted)
    #[arg(short = 'D', long = "define", value_name = "NAME")]
    defines: Vec<String>,

    /// Root directory to scan (repeatable, default ".")
    #[arg(short, long = "path", value_name = "DIR")]
    paths: Vec<PathBuf>,

    /// Only scan files whose name matches REGEX (repeatable)
    #[arg(short, long = "name", value_name = "REGEX")]
    names: Vec<String>,

    /// Skip files whose name matches REGEX (repeatable)
    #[arg(short, long = "ignore", value_name = "REGEX")]
    ignores: Vec<String>,

    /// Worker threads (default: one per CPU)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Log encoding on stderr: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: String,

    /// Read settings from FILE instead of ./deadmacro.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Loads the explicit config file, or deadmacro.toml from the working directory.
fn load_file_config(explicit: Option<&Path>) -> Result<Option<DeadmacroConfig>> {
    match explicit {
        Some(path) => {
            let cfg = load_config_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            Ok(Some(cfg))
        }
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Ok(load_config(&cwd)?)
        }
    }
}

/// Layers command-line values over the file configuration.
///
/// List options are appended; roots given with `-p` replace the file's roots.
fn build_configuration(cli: &Cli, file: Option<&DeadmacroConfig>) -> Result<ScanConfiguration> {
    let mut config = match file {
        Some(cfg) => ScanConfiguration::from_file_config(cfg)?,
        None => ScanConfiguration::default(),
    };

    if !cli.paths.is_empty() {
        config.root_paths = cli.paths.clone();
    }
    config.include_patterns.extend(cli.names.iter().cloned());
    config.exclude_patterns.extend(cli.ignores.iter().cloned());
    config
        .seed_defines
        .extend(cli.defines.iter().map(|d| define_name(d).to_string()));

    if let Some(format) = &cli.format {
        config.output_format = format
            .parse::<OutputFormat>()
            .with_context(|| format!("Invalid --format value: {}", format))?;
    }
    if let Some(output) = &cli.output {
        config.output_target = OutputTarget::File(output.clone());
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
    }
    config.verbose |= cli.debug;

    Ok(config)
}

/// Raises `cancellation` on Ctrl-C. The listener thread lives until exit.
fn install_interrupt_handler(cancellation: ScanCancellation) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start signal runtime")?;

    std::thread::Builder::new()
        .name("deadmacro-signal".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, stopping scan");
                    cancellation.cancel();
                }
            });
        })
        .context("Failed to spawn signal thread")?;
    Ok(())
}

fn run(cli: &Cli, log_format: LogFormat) -> Result<i32> {
    let file_config = load_file_config(cli.config.as_deref())?;
    let config = build_configuration(cli, file_config.as_ref())?;
    init_logging(config.verbose, log_format);

    let cancellation = ScanCancellation::new();
    install_interrupt_handler(cancellation.clone())?;

    let orchestrator = ScanOrchestrator::new(config.clone()).with_cancellation(cancellation);
    let outcome = orchestrator.run().context("Scan failed")?;

    for (path, err) in &outcome.failures {
        tracing::error!(file = %path.display(), error = %err, "file not scanned");
    }
    if outcome.cancelled {
        eprintln!(
            "WARN: scan interrupted, report covers {} of {} file(s)",
            outcome.files_scanned, outcome.files_total
        );
    }

    let report = Report::from_registries(orchestrator.registries());
    write_report(&report, config.output_format, &config.output_target)
        .with_context(|| format!("Failed to write report to {}", config.output_target))?;

    Ok(if report.is_clean() {
        EXIT_CLEAN
    } else {
        EXIT_FINDINGS
    })
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deadmacro internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code {}.", EXIT_FATAL);
    }));

    let cli = Cli::parse();

    let log_format = match cli.log_format.parse::<LogFormat>() {
        Ok(format) => format,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    let code = match std::panic::catch_unwind(|| run(&cli, log_format)) {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            eprintln!("ERROR: {:#}", e);
            EXIT_FATAL
        }
        Err(_) => EXIT_FATAL,
    };
    std::process::exit(code);
}
