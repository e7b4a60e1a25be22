//! Clip name enumeration
//!
//! **Why**: The resolver only sees names. This module lists asset files and
//! strips directories and extensions, keeping a deterministic order (the
//! order decides `previous` ties).
//!
//! **Used by**: runner

use log::{debug, trace};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// What to pick up while scanning.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Allowed extensions (lowercase, no dot). Empty = all files
    pub extensions: Vec<String>,
    /// Include dot-files and dot-directories
    pub include_hidden: bool,
}

impl ScanOptions {
    /// Normalize extension list: lowercase, strip leading dots, drop empties
    pub fn with_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = exts
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| self.extensions.contains(&s.to_lowercase()))
            .unwrap_or(false)
    }
}

#[derive(Debug)]
pub enum ScanError {
    NotADirectory(PathBuf),
    Io { path: PathBuf, message: String },
    Pattern(String),
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::NotADirectory(p) => write!(f, "Not a directory: {}", p.display()),
            ScanError::Io { path, message } => write!(f, "I/O error at {}: {}", path.display(), message),
            ScanError::Pattern(e) => write!(f, "Pattern error: {}", e),
        }
    }
}

impl std::error::Error for ScanError {}

/// Clip name of a file: file name without directory and final extension.
pub fn clip_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

/// List clip names in `dir`, entries sorted by file name within each directory.
pub fn clip_names_in_dir(dir: &Path, opts: &ScanOptions) -> Result<Vec<String>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }
    let mut names = Vec::new();
    walk(dir, opts, &mut names)?;
    debug!("Scanned {}: {} clips", dir.display(), names.len());
    Ok(names)
}

fn walk(dir: &Path, opts: &ScanOptions, names: &mut Vec<String>) -> Result<(), ScanError> {
    let io_err = |e: std::io::Error| ScanError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(io_err)?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for path in entries {
        if !opts.include_hidden && is_hidden(&path) {
            trace!("Skipping hidden: {}", path.display());
            continue;
        }
        if path.is_dir() {
            if opts.recursive {
                walk(&path, opts, names)?;
            }
            continue;
        }
        if !opts.accepts(&path) {
            trace!("Skipping by extension: {}", path.display());
            continue;
        }
        if let Some(name) = clip_name(&path) {
            names.push(name);
        }
    }
    Ok(())
}

/// List clip names for files matching a glob pattern (glob order).
pub fn clip_names_from_glob(pattern: &str, opts: &ScanOptions) -> Result<Vec<String>, ScanError> {
    let entries = glob::glob(pattern)
        .map_err(|e| ScanError::Pattern(format!("{}: {}", pattern, e)))?;

    let mut names = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ScanError::Io {
            path: e.path().to_path_buf(),
            message: e.error().to_string(),
        })?;
        if !path.is_file() || (!opts.include_hidden && is_hidden(&path)) || !opts.accepts(&path) {
            continue;
        }
        if let Some(name) = clip_name(&path) {
            names.push(name);
        }
    }
    debug!("Glob {}: {} clips", pattern, names.len());
    Ok(names)
}

/// Clip names for explicitly given paths, in the given order. Files need not exist.
pub fn clip_names_from_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().filter_map(|p| clip_name(p)).collect()
}

/// One name per line, trimmed; blank lines skipped. Names are taken as-is.
pub fn clip_names_from_lines<R: BufRead>(reader: R) -> Result<Vec<String>, ScanError> {
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| ScanError::Io {
            path: PathBuf::from("<stdin>"),
            message: e.to_string(),
        })?;
        let line = line.trim();
        if !line.is_empty() {
            names.push(line.to_string());
        }
    }
    Ok(names)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
