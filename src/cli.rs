use clap::Parser;
use std::path::PathBuf;

use crate::report::Format;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Default asset folder when no input source is given
pub const DEFAULT_DIR: &str = "animations";

/// Infer next/alternate/previous links between animation clips from their file names
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Directory with clip files (default: ./animations when no other input is given)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Clip file to include (can be specified multiple times, file need not exist)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Glob pattern selecting clip files (e.g. "anims/**/A_*.anim")
    #[arg(short = 'g', long = "glob", value_name = "PATTERN")]
    pub glob: Option<String>,

    /// Read clip names from stdin, one per line
    #[arg(long = "stdin")]
    pub stdin: bool,

    /// Scan subdirectories too
    #[arg(short = 'r', long = "recursive", overrides_with = "no_recursive")]
    pub recursive: bool,

    /// Don't scan subdirectories, even if the settings file says so
    #[arg(long = "no-recursive", overrides_with = "recursive")]
    pub no_recursive: bool,

    /// Only files with these extensions (repeat or comma-separate: -e anim,fbx)
    #[arg(short = 'e', long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Include hidden files and directories
    #[arg(long = "hidden", overrides_with = "no_hidden")]
    pub hidden: bool,

    /// Skip hidden files and directories, even if the settings file says so
    #[arg(long = "no-hidden", overrides_with = "hidden")]
    pub no_hidden: bool,

    /// Write the result to a file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "OUT")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum, value_name = "FORMAT")]
    pub format: Option<Format>,

    /// Pretty-print JSON output
    #[arg(short = 'p', long = "pretty", overrides_with = "no_pretty")]
    pub pretty: bool,

    /// Compact JSON output, even if the settings file says pretty
    #[arg(long = "no-pretty", overrides_with = "pretty")]
    pub no_pretty: bool,

    /// Exit with an error when ambiguous clips or index overflows are found
    #[arg(long = "strict", overrides_with = "no_strict")]
    pub strict: bool,

    /// Never fail on diagnostics, even if the settings file enables strict mode
    #[arg(long = "no-strict", overrides_with = "strict")]
    pub no_strict: bool,

    /// Resolver worker threads (default: 3/4 of CPU cores)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Enable logging to file (default: clipgraph.log in the data directory)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Explicit on/off for a `--flag` / `--no-flag` pair; `None` when neither was given
    pub fn switch(on: bool, off: bool) -> Option<bool> {
        match (on, off) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// True when no explicit input source was given
    pub fn uses_default_dir(&self) -> bool {
        self.dir.is_none() && self.files.is_empty() && self.glob.is_none() && !self.stdin
    }
}
