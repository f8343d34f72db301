//! General utility functions for mxe
//!
//! This module contains file-selection helpers used by the directory
//! operations.

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

/// Create a glob matcher for file names
///
/// A pattern without wildcards matches names containing it.
pub fn create_glob_matcher(pattern: &str) -> Result<GlobMatcher> {
    let pattern = if !pattern.contains('*') && !pattern.contains('?') {
        format!("*{}*", pattern)
    } else {
        pattern.to_string()
    };

    let glob = Glob::new(&pattern).with_context(|| format!("Invalid pattern: {}", pattern))?;
    Ok(glob.compile_matcher())
}

/// Check if a name matches the optional filter
pub fn matches_filter(name: &str, matcher: Option<&GlobMatcher>) -> bool {
    match matcher {
        Some(m) => m.is_match(name),
        None => true,
    }
}

/// Files directly inside `dir` whose name matches `*.csv`, sorted by name
pub fn collect_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let matcher = create_glob_matcher("*.csv")?;

    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_match = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| matches_filter(name, Some(&matcher)));
        if path.is_file() && is_match {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
