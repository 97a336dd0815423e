//! Unused-define computation and output formatting (plain, XML, JSON).

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::config::{OutputFormat, OutputTarget};
use crate::error::{DeadmacroError, DeadmacroResult};
use crate::registry::{Registries, SymbolRecord};

/// Category identifier carried by every finding.
pub const FINDING_ID: &str = "unusedDefine";
/// Severity carried by every finding.
pub const FINDING_SEVERITY: &str = "style";

/// A `#define` whose name is never used anywhere in the scanned tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub name: String,
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl Finding {
    fn from_record(record: &SymbolRecord) -> Self {
        Self {
            name: record.name.clone(),
            file: record.last_token.file().to_path_buf(),
            line: record.last_token.line(),
            column: record.last_token.column(),
        }
    }

    pub fn message(&self) -> String {
        format!("Unused define: {}", self.name)
    }
}

/// Counters shown alongside the findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub definitions: usize,
    pub usages: usize,
    pub unused: usize,
}

/// The reconciled result of a scan.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Unused defines, sorted by name.
    pub findings: Vec<Finding>,
    /// Defines that are used somewhere, sorted by name.
    pub used_definitions: Vec<SymbolRecord>,
    pub stats: ReportStats,
}

impl Report {
    /// Compute `definitions - usages` by name. Call only after every worker
    /// has finished.
    pub fn from_registries(registries: &Registries) -> Self {
        let definitions = registries.definitions.snapshot();
        let usages = registries.usages.snapshot();

        let findings: Vec<Finding> = find_unused(&definitions, &usages)
            .into_iter()
            .map(Finding::from_record)
            .collect();

        let mut used_definitions: Vec<SymbolRecord> = definitions
            .values()
            .filter(|record| usages.contains_key(&record.name))
            .cloned()
            .collect();
        used_definitions.sort_by(|a, b| a.name.cmp(&b.name));

        let stats = ReportStats {
            definitions: definitions.len(),
            usages: usages.len(),
            unused: findings.len(),
        };

        Self {
            findings,
            used_definitions,
            stats,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Definitions whose names never appear among the usages, sorted by name.
pub fn find_unused<'a>(
    definitions: &'a HashMap<String, SymbolRecord>,
    usages: &HashMap<String, SymbolRecord>,
) -> Vec<&'a SymbolRecord> {
    let mut unused: Vec<&SymbolRecord> = definitions
        .iter()
        .filter(|(name, _)| !usages.contains_key(*name))
        .map(|(_, record)| record)
        .collect();
    unused.sort_by(|a, b| a.name.cmp(&b.name));
    unused
}

/// One line per finding.
pub fn render_plain<W: Write>(report: &Report, out: &mut W) -> io::Result<()> {
    for finding in &report.findings {
        writeln!(
            out,
            "{} ({} line:{} column:{})",
            finding.message(),
            finding.file.display(),
            finding.line,
            finding.column
        )?;
    }
    Ok(())
}

/// `<results>` document with one `<error/>` element per finding.
#[cfg(feature = "xml")]
pub fn render_xml<W: Write>(report: &Report, out: &mut W) -> DeadmacroResult<()> {
    use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
    use quick_xml::Writer;

    fn xml_err<E: std::fmt::Display>(e: E) -> DeadmacroError {
        DeadmacroError::report("xml", e.to_string())
    }

    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("results")))
        .map_err(xml_err)?;

    for finding in &report.findings {
        let file = finding.file.display().to_string();
        let line = finding.line.to_string();
        let msg = finding.message();

        let mut error = BytesStart::new("error");
        error.push_attribute(("file", file.as_str()));
        error.push_attribute(("line", line.as_str()));
        error.push_attribute(("id", FINDING_ID));
        error.push_attribute(("severity", FINDING_SEVERITY));
        error.push_attribute(("msg", msg.as_str()));
        writer.write_event(Event::Empty(error)).map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("results")))
        .map_err(xml_err)?;
    writer.get_mut().write_all(b"\n").map_err(xml_err)?;
    Ok(())
}

#[cfg(not(feature = "xml"))]
pub fn render_xml<W: Write>(_report: &Report, _out: &mut W) -> DeadmacroResult<()> {
    Err(DeadmacroError::invalid_argument(
        "XML output requires the `xml` feature",
    ))
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    file: String,
    line: usize,
    column: usize,
    id: &'static str,
    severity: &'static str,
    msg: String,
    name: &'a str,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: Vec<JsonFinding<'a>>,
    summary: &'a ReportStats,
}

/// JSON document mirroring the XML schema, plus a summary.
pub fn render_json<W: Write>(report: &Report, out: &mut W) -> DeadmacroResult<()> {
    let doc = JsonReport {
        results: report
            .findings
            .iter()
            .map(|f| JsonFinding {
                file: f.file.display().to_string(),
                line: f.line,
                column: f.column,
                id: FINDING_ID,
                severity: FINDING_SEVERITY,
                msg: f.message(),
                name: &f.name,
            })
            .collect(),
        summary: &report.stats,
    };

    serde_json::to_writer_pretty(&mut *out, &doc)
        .map_err(|e| DeadmacroError::report("json", e.to_string()))?;
    writeln!(out).map_err(|e| DeadmacroError::report("json", e.to_string()))
}

/// Render in the requested format.
pub fn render<W: Write>(report: &Report, format: OutputFormat, out: &mut W) -> DeadmacroResult<()> {
    match format {
        OutputFormat::Plain => {
            render_plain(report, out).map_err(|e| DeadmacroError::report("plain", e.to_string()))
        }
        OutputFormat::Xml => render_xml(report, out),
        OutputFormat::Json => render_json(report, out),
    }
}

/// Debug-log every define that turned out to be used.
pub fn log_used_definitions(report: &Report) {
    for record in &report.used_definitions {
        debug!(name = %record.name, location = %record.last_token.location, "used define");
    }
}

/// Render and write the report. File targets are written atomically
/// (temp file + rename); on failure nothing is left at the target.
pub fn write_report(
    report: &Report,
    format: OutputFormat,
    target: &OutputTarget,
) -> DeadmacroResult<()> {
    log_used_definitions(report);

    match target {
        OutputTarget::Stdout => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            render(report, format, &mut lock)?;
            lock.flush()
                .map_err(|e| DeadmacroError::report(target.to_string(), e.to_string()))
        }
        OutputTarget::File(path) => {
            let mut buffer = Vec::with_capacity(4096);
            render(report, format, &mut buffer)?;
            write_atomic(path, &buffer)
        }
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> DeadmacroResult<()> {
    let report_err = |e: io::Error| DeadmacroError::report(path.display().to_string(), e.to_string());

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| DeadmacroError::report(path.display().to_string(), "not a file path"))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!(
        ".{}.{}.{}.tmp",
        file_name.to_string_lossy(),
        std::process::id(),
        nanos
    ));

    fs::write(&temp_path, contents).map_err(report_err)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        report_err(e)
    })
}
