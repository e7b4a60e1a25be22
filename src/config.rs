use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::report::Format;

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "clipgraph.json";
/// Default log file name inside the data directory
pub const LOG_FILE: &str = "clipgraph.log";

/// Where clipgraph looks for its settings file and writes its default log
///
/// Directory priority:
/// 1. CLI --config-dir argument
/// 2. CLIPGRAPH_CONFIG_DIR environment variable
/// 3. Current folder IF clipgraph.json or clipgraph.log exists there
/// 4. Platform directory from dirs-next (config dir for settings, data dir for logs)
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (CLIPGRAPH_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| {
            std::env::var("CLIPGRAPH_CONFIG_DIR")
                .ok()
                .map(PathBuf::from)
        });

        Self { config_dir }
    }

    /// `clipgraph.json`; may not exist
    pub fn settings_file(&self) -> PathBuf {
        self.dir_or(dirs_next::config_dir()).join(SETTINGS_FILE)
    }

    /// Default target of `--log` without a file name
    pub fn log_file(&self) -> PathBuf {
        self.dir_or(dirs_next::data_dir()).join(LOG_FILE)
    }

    /// Create the directory of [`Self::log_file`] and return the log path
    pub fn prepare_log_file(&self) -> Result<PathBuf> {
        let path = self.log_file();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        }
        Ok(path)
    }

    fn dir_or(&self, platform_dir: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = &self.config_dir {
            return dir.clone();
        }

        if let Ok(current_dir) = std::env::current_dir() {
            if [SETTINGS_FILE, LOG_FILE].iter().any(|f| current_dir.join(f).exists()) {
                return current_dir;
            }
        }

        platform_dir
            .map(|dir| dir.join("clipgraph"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Persisted defaults, overridden by command-line flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Asset extensions to scan (empty = every file)
    pub extensions: Vec<String>,
    pub recursive: bool,
    pub include_hidden: bool,
    pub format: Format,
    pub pretty: bool,
    /// Fail when resolution reports diagnostics
    pub strict: bool,
    /// Resolver threads (None = 3/4 of CPU cores)
    pub jobs: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            recursive: false,
            include_hidden: false,
            format: Format::Json,
            pretty: false,
            strict: false,
            jobs: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; missing file gives defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))
    }

    /// Command-line flags win over file values
    pub fn apply_args(&mut self, args: &Args) {
        if !args.extensions.is_empty() {
            self.extensions = args.extensions.clone();
        }
        if let Some(on) = Args::switch(args.recursive, args.no_recursive) {
            self.recursive = on;
        }
        if let Some(on) = Args::switch(args.hidden, args.no_hidden) {
            self.include_hidden = on;
        }
        if let Some(on) = Args::switch(args.pretty, args.no_pretty) {
            self.pretty = on;
        }
        if let Some(on) = Args::switch(args.strict, args.no_strict) {
            self.strict = on;
        }
        if let Some(format) = args.format {
            self.format = format;
        }
        if args.jobs.is_some() {
            self.jobs = args.jobs;
        }
    }

    /// Worker thread count for the resolver pool
    pub fn worker_count(&self) -> usize {
        self.jobs
            .filter(|&n| n > 0)
            .unwrap_or_else(|| (num_cpus::get() * 3 / 4).max(1))
    }
}
