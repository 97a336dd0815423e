//! Parallel, deterministic candidate file discovery.
//!
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel filtering via Rayon's `par_bridge`
//! - Include/exclude regexes are searched anywhere in the file name;
//!   exclude always wins over include

use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{DeadmacroError, DeadmacroResult};

/// Version control metadata directories, never scanned.
const EXCLUDED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// Include/exclude file name filter.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl FileFilter {
    /// Compile both pattern lists; the first invalid pattern is an error.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> DeadmacroResult<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// A file name is a candidate iff it matches some include pattern (or
    /// there are none) and no exclude pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|re| re.is_match(file_name));
        included && !self.exclude.iter().any(|re| re.is_match(file_name))
    }

    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.matches(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> DeadmacroResult<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            let p = p.as_ref();
            Regex::new(p).map_err(|e| DeadmacroError::pattern(p, e.to_string()))
        })
        .collect()
}

/// Gathers every candidate file under `root` in sorted order.
pub fn gather_files(root: &Path, filter: &FileFilter) -> DeadmacroResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(DeadmacroError::invalid_argument(format!(
            "scan path does not exist: {}",
            root.display()
        )));
    }
    info!(path = %root.display(), "searching");

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                (e.file_type().is_file() && filter.matches_path(path)).then(|| path.to_path_buf())
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Gathers candidates from every root, scanning each file at most once even
/// when roots overlap. Roots that do not exist are logged and skipped.
pub fn gather_candidate_files(
    roots: &[PathBuf],
    filter: &FileFilter,
) -> DeadmacroResult<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for root in roots {
        if !root.exists() {
            warn!(path = %root.display(), "scan path does not exist, skipping");
            continue;
        }
        for file in gather_files(root, filter)? {
            let key = fs::canonicalize(&file).unwrap_or_else(|_| file.clone());
            if seen.insert(key) {
                candidates.push(file);
            }
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_filter_match_all_by_default() {
        let filter = FileFilter::new::<&str>(&[], &[]).unwrap();
        assert!(filter.matches("main.c"));
        assert!(filter.matches("README"));
    }

    #[test]
    fn test_filter_include_and_exclude() {
        let filter = FileFilter::new(&[r"\.c$", r"\.h$"], &["^test_"]).unwrap();
        assert!(filter.matches("util.c"));
        assert!(filter.matches("util.h"));
        assert!(!filter.matches("util.cpp"));
        assert!(!filter.matches("test_util.c"));
    }

    #[test]
    fn test_filter_exclude_wins_without_includes() {
        let filter = FileFilter::new(&[] as &[&str], &["generated"]).unwrap();
        assert!(!filter.matches("generated_tables.c"));
        assert!(filter.matches("tables.c"));
    }

    #[test]
    fn test_filter_searches_anywhere() {
        let filter = FileFilter::new(&["conf"], &[] as &[&str]).unwrap();
        assert!(filter.matches("myconfig.h"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = FileFilter::new(&["(unclosed"], &[] as &[&str]).unwrap_err();
        assert!(matches!(err, DeadmacroError::Pattern { .. }));
    }

    #[test]
    fn test_gather_recursive_and_prunes_vcs() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.c"));
        touch(&dir.path().join("sub/deeper/b.h"));
        touch(&dir.path().join("sub/notes.txt"));
        touch(&dir.path().join(".git/hooks/c.c"));

        let filter = FileFilter::new(&[r"\.[ch]$"], &[] as &[&str]).unwrap();
        let files = gather_files(dir.path(), &filter).unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("a.c"), dir.path().join("sub/deeper/b.h")]
        );
    }

    #[test]
    fn test_overlapping_roots_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/a.c"));

        let filter = FileFilter::default();
        let roots = vec![dir.path().to_path_buf(), dir.path().join("src")];
        let files = gather_candidate_files(&roots, &filter).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_root_is_error_for_single_walk() {
        let dir = tempfile::tempdir().unwrap();
        let err = gather_files(&dir.path().join("nope"), &FileFilter::default()).unwrap_err();
        assert!(matches!(err, DeadmacroError::InvalidArgument { .. }));
    }

    #[test]
    fn test_missing_root_skipped_among_candidates() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.c"));

        let roots = vec![dir.path().join("nope"), dir.path().to_path_buf()];
        let files = gather_candidate_files(&roots, &FileFilter::default()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.c")]);

        let none = gather_candidate_files(&[dir.path().join("nope")], &FileFilter::default());
        assert!(none.unwrap().is_empty());
    }
}
