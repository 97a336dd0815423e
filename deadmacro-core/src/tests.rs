//! End-to-end test suite for deadmacro-core.

use crate::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_tree() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("deadmacro_tests")
        .join(format!("{}_{}", timestamp, id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn unused_names(root: &Path, defines: &[&str]) -> Vec<String> {
    let result = Deadmacro::new()
        .path(root)
        .include(r"\.(c|h)$")
        .defines(defines.iter().copied())
        .jobs(4)
        .analyze()
        .unwrap();
    result.report.findings.into_iter().map(|f| f.name).collect()
}

// Core Test 1: definitions minus usages
#[test]
fn test_unused_define_reported() {
    let root = setup_temp_tree();
    write_file(&root.join("defs.h"), "#define A 1\n#define B 2\n");
    write_file(&root.join("main.c"), "int x = B;\n");

    assert_eq!(unused_names(&root, &[]), vec!["A"]);
    fs::remove_dir_all(&root).ok();
}

// Core Test 2: #if 0 hides both definitions and usages
#[test]
fn test_if_zero_hides_definitions_and_usages() {
    let root = setup_temp_tree();
    write_file(
        &root.join("a.c"),
        "#define LIVE 1\n#if 0\n#define DISABLED 1\nint y = LIVE;\n#else\nint z = 0;\n#endif\n",
    );

    // DISABLED is never registered, LIVE's only use is suppressed.
    assert_eq!(unused_names(&root, &[]), vec!["LIVE"]);
    fs::remove_dir_all(&root).ok();
}

// Core Test 3: usage in another file counts
#[test]
fn test_cross_file_usage() {
    let root = setup_temp_tree();
    write_file(&root.join("include/limits.h"), "#define MAX_ITEMS 16\n");
    write_file(&root.join("src/queue.c"), "static int items[MAX_ITEMS];\n");

    assert!(unused_names(&root, &[]).is_empty());
    fs::remove_dir_all(&root).ok();
}

// Core Test 4: #ifdef guard names count as used
#[test]
fn test_include_guard_is_used() {
    let root = setup_temp_tree();
    write_file(
        &root.join("guard.h"),
        "#ifndef GUARD_H\n#define GUARD_H\n#define PAYLOAD 1\n#endif\n",
    );

    assert_eq!(unused_names(&root, &[]), vec!["PAYLOAD"]);
    fs::remove_dir_all(&root).ok();
}

// Core Test 5: seed defines select branches
#[test]
fn test_seed_define_selects_branch() {
    let root = setup_temp_tree();
    write_file(
        &root.join("platform.c"),
        "#ifdef WIN32\n#define PATH_SEP '\\\\'\n#else\n#define PATH_SEP_POSIX '/'\n#endif\n",
    );

    assert_eq!(unused_names(&root, &["WIN32"]), vec!["PATH_SEP"]);
    assert_eq!(unused_names(&root, &[]), vec!["PATH_SEP_POSIX"]);
    fs::remove_dir_all(&root).ok();
}

// Core Test 6: nested conditionals
#[test]
fn test_nested_conditionals() {
    let root = setup_temp_tree();
    write_file(&root.join("defs.h"), "#define X 1\n");
    write_file(
        &root.join("use.c"),
        "#ifdef A\n#ifdef B\nint v = X;\n#endif\n#endif\n",
    );

    assert_eq!(unused_names(&root, &["A"]), vec!["X"]);
    assert!(unused_names(&root, &["A", "B"]).is_empty());
    fs::remove_dir_all(&root).ok();
}

// Core Test 7: tokenizer failures are isolated
#[test]
fn test_broken_file_does_not_abort_scan() {
    let root = setup_temp_tree();
    write_file(&root.join("broken.c"), "int v = USE_ME; /* never closed\n");
    write_file(&root.join("defs.h"), "#define USE_ME 1\n");

    let result = Deadmacro::new()
        .path(&root)
        .include(r"\.(c|h)$")
        .analyze()
        .unwrap();

    assert_eq!(result.outcome.failures.len(), 1);
    assert_eq!(result.outcome.files_scanned, 1);
    // The only use lived in the failed file.
    assert_eq!(result.report.findings.len(), 1);
    assert_eq!(result.report.findings[0].name, "USE_ME");
    fs::remove_dir_all(&root).ok();
}

// Core Test 8: exclude wins over include
#[test]
fn test_exclude_overrides_include() {
    let root = setup_temp_tree();
    write_file(&root.join("defs.h"), "#define ONLY_USED_IN_TESTS 1\n");
    write_file(&root.join("test_defs.c"), "int t = ONLY_USED_IN_TESTS;\n");

    let result = Deadmacro::new()
        .path(&root)
        .include(r"\.(c|h)$")
        .exclude("^test_")
        .analyze()
        .unwrap();

    assert_eq!(result.outcome.files_total, 1);
    assert_eq!(result.report.findings[0].name, "ONLY_USED_IN_TESTS");
    fs::remove_dir_all(&root).ok();
}

// Core Test 9: stray apostrophes do not drop a file's usages
#[test]
fn test_apostrophe_in_prose_keeps_file() {
    let root = setup_temp_tree();
    write_file(&root.join("defs.h"), "#define USED_ELSEWHERE 1\n");
    write_file(
        &root.join("main.c"),
        "#if 0\nthis isn't compiled\n#endif\n#ifdef NEVER\n#error don't build this\n#endif\nint x = USED_ELSEWHERE;\n",
    );

    let result = Deadmacro::new()
        .path(&root)
        .include(r"\.(c|h)$")
        .analyze()
        .unwrap();

    assert!(result.outcome.failures.is_empty());
    assert_eq!(result.outcome.files_scanned, 2);
    assert!(result.report.is_clean());
    fs::remove_dir_all(&root).ok();
}

// Core Test 10: a missing root does not discard the other roots
#[test]
fn test_missing_root_is_skipped() {
    let root = setup_temp_tree();
    write_file(&root.join("defs.h"), "#define LONELY 1\n");

    let result = Deadmacro::new()
        .path(&root)
        .path(root.join("does_not_exist"))
        .analyze()
        .unwrap();

    assert_eq!(result.outcome.files_scanned, 1);
    assert_eq!(result.report.findings.len(), 1);
    assert_eq!(result.report.findings[0].name, "LONELY");
    fs::remove_dir_all(&root).ok();
}

// Extended Test 1: cancellation still yields a valid report
#[test]
fn test_cancelled_scan_reports_consistently() {
    let root = setup_temp_tree();
    for i in 0..20 {
        write_file(
            &root.join(format!("f{}.c", i)),
            &format!("#define DEF_{} 1\nint v{} = DEF_{};\n", i, i, i),
        );
    }

    let cancel = ScanCancellation::new();
    cancel.cancel();
    let result = Deadmacro::new()
        .path(&root)
        .cancellation(cancel)
        .analyze()
        .unwrap();

    assert!(result.outcome.cancelled);
    assert_eq!(result.outcome.files_skipped, 20);
    assert!(result.report.is_clean());

    let mut out = Vec::new();
    render(&result.report, OutputFormat::Json, &mut out).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["summary"]["definitions"], 0);
    fs::remove_dir_all(&root).ok();
}

// Extended Test 2: cancellation raised by a token source mid-run
#[test]
fn test_cancellation_mid_scan() {
    struct CancellingSource {
        inner: CTokenizer,
        cancel: ScanCancellation,
    }

    impl TokenSource for CancellingSource {
        fn tokenize(&self, path: &Path) -> DeadmacroResult<Vec<Token>> {
            let tokens = self.inner.tokenize(path)?;
            if path.file_name().is_some_and(|n| n == "trigger.c") {
                self.cancel.cancel();
            }
            Ok(tokens)
        }
    }

    let root = setup_temp_tree();
    write_file(&root.join("trigger.c"), "#define NEVER_SCANNED 1\n");

    let cancel = ScanCancellation::new();
    let source = Arc::new(CancellingSource {
        inner: CTokenizer::new(),
        cancel: cancel.clone(),
    });
    let result = Deadmacro::new()
        .path(&root)
        .cancellation(cancel)
        .token_source(source)
        .analyze()
        .unwrap();

    assert!(result.outcome.cancelled);
    assert_eq!(result.outcome.files_interrupted, 1);
    assert!(result.report.is_clean());
    fs::remove_dir_all(&root).ok();
}

// Extended Test 3: parallelism stress test
#[test]
fn test_parallel_many_files() {
    let root = setup_temp_tree();
    for i in 0..200 {
        write_file(
            &root.join(format!("dir{}/file{}.c", i % 10, i)),
            &format!("#define SHARED 1\n#define UNIQUE_{} 1\nint a{} = SHARED;\n", i, i),
        );
    }

    let result = Deadmacro::new()
        .path(&root)
        .include(r"\.c$")
        .jobs(8)
        .analyze()
        .unwrap();

    assert_eq!(result.outcome.files_scanned, 200);
    assert_eq!(result.report.stats.definitions, 201);
    assert_eq!(result.report.findings.len(), 200);
    assert!(!result.report.findings.iter().any(|f| f.name == "SHARED"));
    fs::remove_dir_all(&root).ok();
}

// Extended Test 4: XML report written to disk
#[cfg(feature = "xml")]
#[test]
fn test_xml_report_file() {
    let root = setup_temp_tree();
    write_file(&root.join("src/defs.h"), "#define STALE 1\n");
    let out = root.join("report.xml");

    Deadmacro::new()
        .path(root.join("src"))
        .format(OutputFormat::Xml)
        .output(OutputTarget::File(out.clone()))
        .run()
        .unwrap();

    let xml = fs::read_to_string(&out).unwrap();
    assert!(xml.contains(r#"id="unusedDefine""#));
    assert!(xml.contains(r#"severity="style""#));
    assert!(xml.contains(r#"msg="Unused define: STALE""#));
    assert!(xml.contains(r#"line="1""#));
    fs::remove_dir_all(&root).ok();
}

// Extended Test 5: config file drives the scan
#[test]
fn test_config_file_round_trip() {
    let root = setup_temp_tree();
    write_file(&root.join("src/a.c"), "#ifdef FEATURE_X\n#define X_ON 1\n#endif\n");
    write_file(
        &root.join(CONFIG_FILE_NAME),
        &format!(
            "defines = [\"FEATURE_X\"]\npaths = [{:?}]\ninclude = ['\\.c$']\n",
            root.join("src").display().to_string()
        ),
    );

    let cfg = load_config(&root).unwrap().unwrap();
    let config = ScanConfiguration::from_file_config(&cfg).unwrap();
    let result = Deadmacro::from_config(config).analyze().unwrap();

    assert_eq!(result.report.findings.len(), 1);
    assert_eq!(result.report.findings[0].name, "X_ON");
    fs::remove_dir_all(&root).ok();
}
