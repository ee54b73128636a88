//! Default path helpers and symlink checks.
//! Determines OS-appropriate config/log/data paths and detects symlinked ancestors for safety.

use dirs::{config_dir, data_dir, home_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

fn home() -> PathBuf {
    home_dir()
        .or_else(|| env::var_os("HOME").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Application data directory that gets relocated: `<home>/.lmstudio`.
pub fn default_source_dir() -> PathBuf {
    home().join(".lmstudio")
}

/// Where relocated data goes unless configured otherwise.
pub fn default_target_dir() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("D:/LMstudio_AIModels")
    } else {
        home().join("LMstudio_AIModels")
    }
}

/// Config file location: `$JUNCTION_MOVE_CONFIG` when set, else the OS config dir.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(p));
    }
    if let Some(mut base) = config_dir() {
        base.push("junction_move");
        base.push("config.xml");
        Some(base)
    } else {
        env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("junction_move")
                .join("config.xml")
        })
    }
}

/// Default log file. Sits next to an env-override config so test and portable
/// setups stay self-contained; otherwise under the OS data dir.
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        let cfg = PathBuf::from(p);
        return cfg.parent().map(|d| d.join("junction_move.log"));
    }
    if let Some(mut base) = data_dir() {
        base.push("junction_move");
        base.push("junction_move.log");
        Some(base)
    } else {
        env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("junction_move")
                .join("junction_move.log")
        })
    }
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
