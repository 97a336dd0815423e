//! Scan configuration and loading from deadmacro.toml.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{DeadmacroError, DeadmacroResult, IoResultExt};

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE_NAME: &str = "deadmacro.toml";

/// Report encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    Xml,
    Json,
}

impl FromStr for OutputFormat {
    type Err = DeadmacroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            other => Err(DeadmacroError::invalid_argument(format!(
                "unknown output format '{}' (expected plain, xml or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Xml => write!(f, "xml"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Where the report goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything one scan run needs. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfiguration {
    pub root_paths: Vec<PathBuf>,
    /// Regexes searched in file names; empty means every file.
    pub include_patterns: Vec<String>,
    /// Regexes searched in file names; a match always excludes.
    pub exclude_patterns: Vec<String>,
    pub seed_defines: BTreeSet<String>,
    pub output_format: OutputFormat,
    pub output_target: OutputTarget,
    pub verbose: bool,
    /// Worker threads; 0 picks one per CPU.
    pub jobs: usize,
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self {
            root_paths: vec![PathBuf::from(".")],
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            seed_defines: BTreeSet::new(),
            output_format: OutputFormat::Plain,
            output_target: OutputTarget::Stdout,
            verbose: false,
            jobs: 0,
        }
    }
}

impl ScanConfiguration {
    /// Layer a config file over the defaults. Paths listed in the file
    /// replace the default `.` root.
    pub fn from_file_config(cfg: &DeadmacroConfig) -> DeadmacroResult<Self> {
        let mut config = Self::default();
        if let Some(paths) = &cfg.paths {
            if !paths.is_empty() {
                config.root_paths = paths.iter().map(PathBuf::from).collect();
            }
        }
        if let Some(include) = &cfg.include {
            config.include_patterns.extend(include.iter().cloned());
        }
        if let Some(exclude) = &cfg.exclude {
            config.exclude_patterns.extend(exclude.iter().cloned());
        }
        if let Some(defines) = &cfg.defines {
            config
                .seed_defines
                .extend(defines.iter().map(|d| define_name(d).to_string()));
        }
        if let Some(jobs) = cfg.jobs {
            config.jobs = jobs;
        }
        config.verbose = cfg.verbose.unwrap_or(false);
        if let Some(output) = &cfg.output {
            if let Some(format) = &output.format {
                config.output_format = format.parse()?;
            }
            if let Some(file) = &output.file {
                config.output_target = OutputTarget::File(PathBuf::from(file));
            }
        }
        Ok(config)
    }
}

/// Strip a `=VALUE` suffix from a `-D` style define.
pub fn define_name(define: &str) -> &str {
    define.split_once('=').map_or(define, |(name, _)| name).trim()
}

/// Main configuration structure for deadmacro.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DeadmacroConfig {
    /// Macro names treated as defined in every file.
    pub defines: Option<Vec<String>>,
    /// Root directories to scan.
    pub paths: Option<Vec<String>>,
    /// File name patterns to include.
    pub include: Option<Vec<String>>,
    /// File name patterns to exclude.
    pub exclude: Option<Vec<String>>,
    /// Worker thread count.
    pub jobs: Option<usize>,
    /// Debug logging.
    pub verbose: Option<bool>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format: "plain", "xml" or "json".
    pub format: Option<String>,
    /// Output file; stdout when absent.
    pub file: Option<String>,
}

/// Loads configuration from deadmacro.toml in `dir` if it exists.
pub fn load_config(dir: &Path) -> DeadmacroResult<Option<DeadmacroConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Loads an explicitly named configuration file.
pub fn load_config_file(path: &Path) -> DeadmacroResult<DeadmacroConfig> {
    let content = fs::read_to_string(path).with_path(path)?;
    toml::from_str(&content).map_err(|e| DeadmacroError::config(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert_eq!("XML".parse::<OutputFormat>().unwrap(), OutputFormat::Xml);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_define_name_strips_value() {
        assert_eq!(define_name("DEBUG"), "DEBUG");
        assert_eq!(define_name("LEVEL=3"), "LEVEL");
        assert_eq!(define_name("EMPTY="), "EMPTY");
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfiguration::default();
        assert_eq!(config.root_paths, vec![PathBuf::from(".")]);
        assert_eq!(config.output_target, OutputTarget::Stdout);
        assert!(config.include_patterns.is_empty());
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_and_apply_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
defines = ["DEBUG", "LEVEL=2"]
paths = ["src", "include"]
include = ['\.[ch]$']
exclude = ["_test"]
jobs = 4
verbose = true

[output]
format = "xml"
file = "report.xml"
"#,
        )
        .unwrap();

        let cfg = load_config(dir.path()).unwrap().unwrap();
        let config = ScanConfiguration::from_file_config(&cfg).unwrap();

        assert_eq!(
            config.root_paths,
            vec![PathBuf::from("src"), PathBuf::from("include")]
        );
        assert!(config.seed_defines.contains("DEBUG"));
        assert!(config.seed_defines.contains("LEVEL"));
        assert_eq!(config.include_patterns, vec![r"\.[ch]$"]);
        assert_eq!(config.exclude_patterns, vec!["_test"]);
        assert_eq!(config.jobs, 4);
        assert!(config.verbose);
        assert_eq!(config.output_format, OutputFormat::Xml);
        assert_eq!(
            config.output_target,
            OutputTarget::File(PathBuf::from("report.xml"))
        );
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "unknown_key = 1").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, DeadmacroError::Config { .. }));
    }
}
