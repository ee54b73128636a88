//! CLI definition and parsing.
//!
//! Notes:
//! - Flags override config values (which come from XML if present).
//! - --link-only wins over --overwrite.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::fs_ops::clean_input;

/// Relocate an application data directory to another volume and leave a
/// directory junction behind so the old path keeps working.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about)]
pub struct Args {
    /// Directory to relocate (default: ~/.lmstudio or the configured source_dir).
    #[arg(long, short = 's', value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Where the data should live afterwards.
    #[arg(long, short = 't', value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub target: Option<PathBuf>,

    /// If the target exists, delete it and copy over it (still asks for confirmation).
    #[arg(long)]
    pub overwrite: bool,

    /// If the target exists, skip copying and link the source to it (still asks).
    #[arg(long)]
    pub link_only: bool,

    /// Answer yes to every confirmation; never prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Show source and target information, then exit without changing anything.
    #[arg(long)]
    pub info: bool,

    /// Skip the platform bulk-copy tool and always copy manually.
    #[arg(long)]
    pub no_bulk_copy: bool,

    /// Per-file retries handed to the bulk-copy tool.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs in structured JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the config file location (or JUNCTION_MOVE_CONFIG if set) and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write a template config file at the config location and exit.
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Link-only and overwrite are mutually exclusive; link-only wins.
    pub fn effective_overwrite(&self) -> bool {
        self.overwrite && !self.link_only
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(p) = &self.source {
            cfg.source_dir = clean_input(&p.to_string_lossy());
        }
        if let Some(p) = &self.target {
            cfg.target_dir = clean_input(&p.to_string_lossy());
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.no_bulk_copy {
            cfg.bulk_copy = false;
        }
        if let Some(n) = self.retries {
            cfg.copy_retries = n;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
