//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use crate::fs_ops::{BulkTool, CopyOptions};

/// Application name fragments matched against running processes by default.
pub const DEFAULT_PROCESS_PATTERNS: &[&str] = &["lmstudio", "lm studio"];

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for one relocation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Application data directory to relocate
    pub source_dir: PathBuf,
    /// Where the data should live afterwards
    pub target_dir: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Case-insensitive fragments identifying the owning application's processes
    pub process_patterns: Vec<String>,
    /// Try the platform bulk-copy tool before the manual walk
    pub bulk_copy: bool,
    /// Per-file retries handed to the bulk-copy tool
    pub copy_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: paths::default_source_dir(),
            target_dir: paths::default_target_dir(),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path(),
            process_patterns: DEFAULT_PROCESS_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            bulk_copy: true,
            copy_retries: 1,
        }
    }
}

impl Config {
    /// Construct a Config with explicit directories; other fields use defaults.
    pub fn new(source_dir: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            ..Default::default()
        }
    }

    /// Copy settings derived from this config.
    pub fn copy_options(&self) -> CopyOptions {
        CopyOptions {
            bulk_tool: if self.bulk_copy {
                BulkTool::platform_default()
            } else {
                None
            },
            retries: self.copy_retries,
        }
    }
}
