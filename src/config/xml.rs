//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Writes a commented template on request (`--init-config`).
//!
//! Notes:
//! - A missing file means "use defaults"; it is not an error.
//! - Unknown XML fields are an error so misconfigurations surface early.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::paths::{
    default_config_path, default_log_path, default_source_dir, default_target_dir,
    path_has_symlink_ancestor,
};
use crate::config::types::{Config, DEFAULT_PROCESS_PATTERNS, LogLevel};
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    source_dir: Option<String>,
    target_dir: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(rename = "process_pattern", default)]
    process_patterns: Vec<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    bulk_copy: Option<bool>,
    #[serde(default, deserialize_with = "de_u32_trimmed_opt")]
    copy_retries: Option<u32>,
}

// Trims surrounding whitespace before parsing so pretty-printed files work.
fn de_u32_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<u32>().ok()))
}

fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }))
}

fn non_empty_path(s: Option<&str>) -> Option<PathBuf> {
    s.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(PathBuf::from)
}

// Map XmlConfig -> Config; absent fields keep their defaults.
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();
    if let Some(p) = non_empty_path(parsed.source_dir.as_deref()) {
        cfg.source_dir = p;
    }
    if let Some(p) = non_empty_path(parsed.target_dir.as_deref()) {
        cfg.target_dir = p;
    }
    if let Some(p) = non_empty_path(parsed.log_file.as_deref()) {
        cfg.log_file = Some(p);
    }
    if let Some(level) = parsed
        .log_level
        .as_deref()
        .and_then(|s| s.trim().parse::<LogLevel>().ok())
    {
        cfg.log_level = level;
    }
    let patterns: Vec<String> = parsed
        .process_patterns
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if !patterns.is_empty() {
        cfg.process_patterns = patterns;
    }
    if let Some(b) = parsed.bulk_copy {
        cfg.bulk_copy = b;
    }
    if let Some(n) = parsed.copy_retries {
        cfg.copy_retries = n;
    }
    cfg
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_config(parsed))
}

/// Where the effective config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

/// Load the config from its default location; defaults when no file exists there.
pub fn load_config() -> Result<(Config, ConfigSource)> {
    let Some(path) = default_config_path() else {
        debug!("no config location available; using defaults");
        return Ok((Config::default(), ConfigSource::Defaults));
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok((Config::default(), ConfigSource::Defaults));
    }
    let cfg = load_config_from_xml_path(&path)?;
    Ok((cfg, ConfigSource::File(path)))
}

/// Template contents with every field set to its default.
pub fn template_contents() -> String {
    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/junction_move.log".into());
    let patterns: String = DEFAULT_PROCESS_PATTERNS
        .iter()
        .map(|p| format!("  <process_pattern>{p}</process_pattern>\n"))
        .collect();
    format!(
        "<!--\n  junction_move configuration (XML)\n\n  source_dir       -> application data directory to relocate\n  target_dir       -> where the data should live afterwards\n  log_level        -> quiet | normal | info | debug\n  log_file         -> path to log file (optional; console output still used)\n  process_pattern  -> repeatable; case-insensitive fragment of the application's process name\n  bulk_copy        -> true/false; try the platform bulk-copy tool (robocopy) first\n  copy_retries     -> per-file retries handed to the bulk-copy tool\n\n  CLI flags override XML values.\n-->\n<config>\n  <source_dir>{}</source_dir>\n  <target_dir>{}</target_dir>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n{}  <bulk_copy>true</bulk_copy>\n  <copy_retries>1</copy_retries>\n</config>\n",
        default_source_dir().display(),
        default_target_dir().display(),
        suggested_log,
        patterns,
    )
}

/// Create the template config file and its parent directory.
/// Refuses an existing file and any symlinked ancestor.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }
    write_config_secure_new_0600(path, template_contents().as_bytes())?;
    info!(path = %path.display(), "created template config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_back_to_defaults() {
        let parsed: XmlConfig = from_xml_str(&template_contents()).unwrap();
        let cfg = xml_to_config(parsed);
        let def = Config::default();
        assert_eq!(cfg.source_dir, def.source_dir);
        assert_eq!(cfg.target_dir, def.target_dir);
        assert_eq!(cfg.process_patterns, def.process_patterns);
        assert!(cfg.bulk_copy);
        assert_eq!(cfg.copy_retries, 1);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let xml = "<config>\n  <target_dir>  /mnt/big/models  </target_dir>\n  <copy_retries> 3 </copy_retries>\n  <bulk_copy> false </bulk_copy>\n</config>";
        let cfg = xml_to_config(from_xml_str(xml).unwrap());
        assert_eq!(cfg.target_dir, PathBuf::from("/mnt/big/models"));
        assert_eq!(cfg.copy_retries, 3);
        assert!(!cfg.bulk_copy);
        assert_eq!(cfg.source_dir, Config::default().source_dir);
    }

    #[test]
    fn repeated_patterns_replace_defaults() {
        let xml = "<config><process_pattern>Foo</process_pattern><process_pattern>bar baz</process_pattern></config>";
        let cfg = xml_to_config(from_xml_str(xml).unwrap());
        assert_eq!(cfg.process_patterns, vec!["Foo", "bar baz"]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("config.xml");
        fs::write(&p, "<config><download_base>/x</download_base></config>").unwrap();
        let err = load_config_from_xml_path(&p).unwrap_err();
        assert!(format!("{err:#}").contains("parse config xml"));
    }

    #[test]
    fn template_refuses_to_overwrite() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("nested/config.xml");
        create_template_config(&p).unwrap();
        assert!(p.exists());
        assert!(create_template_config(&p).is_err());
    }
}
