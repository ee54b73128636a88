//! Core library for `junction_move`.
//!
//! Relocates an application-data directory to another volume and leaves a
//! directory junction (a directory symlink on Unix) at the old path.
//!
//! The work is split in two stages:
//! - [`relocate::prepare`] inspects both paths and asks every question up front;
//! - [`relocate::execute`] runs the mutating phases without further input.
//!
//! Everything the user sees flows through [`report::Reporter`] so a front end can
//! render it however it likes.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod relocate;
pub mod report;
pub mod shutdown;
pub mod terminal;

pub use config::{
    CONFIG_ENV, Config, ConfigSource, LogLevel, create_template_config, default_config_path,
    default_log_path, load_config, path_has_symlink_ancestor,
};
pub use errors::RelocateError;
pub use relocate::{Decision, Outcome, RelocateRequest, RelocationPlan, execute, prepare};

/// Convenience re-exports for embedding the relocation in another front end.
pub mod prelude {
    pub use crate::config::{Config, LogLevel, default_config_path, load_config};
    pub use crate::errors::RelocateError;
    pub use crate::fs_ops::{DirectoryInfo, inspect, status_block};
    pub use crate::relocate::{
        Advisory, Decision, DestinationPolicy, Frontend, Operations, Outcome, Phase, Question,
        RelocateRequest, RelocationPlan, State, SystemAdvisory, SystemOps, TargetChoice, execute,
        prepare,
    };
    pub use crate::report::{ChannelReporter, Event, Reporter};
}
