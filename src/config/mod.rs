//! Config module.
//! Provides configuration types, default paths and XML loading.

pub mod paths;
pub mod types;
pub mod xml;

pub use paths::{
    default_config_path, default_log_path, default_source_dir, default_target_dir,
    path_has_symlink_ancestor,
};
pub use types::{Config, DEFAULT_PROCESS_PATTERNS, LogLevel};
pub use xml::{ConfigSource, create_template_config, load_config, load_config_from_xml_path};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "JUNCTION_MOVE_CONFIG";
