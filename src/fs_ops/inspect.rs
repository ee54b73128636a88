//! Read-only directory inspection.
//! Counts files and subdirectories and sums file sizes. Never fails: a missing path is
//! a normal answer, and entries that cannot be read are skipped.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Snapshot of what lives at a path. Recompute after every mutation; never cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryInfo {
    pub exists: bool,
    pub is_directory: bool,
    pub file_count: u64,
    pub subdir_count: u64,
    pub total_bytes: u64,
    pub is_empty: bool,
}

impl DirectoryInfo {
    fn missing() -> Self {
        Self {
            exists: false,
            is_directory: false,
            file_count: 0,
            subdir_count: 0,
            total_bytes: 0,
            is_empty: true,
        }
    }

    /// Existing directory with at least one entry.
    pub fn is_populated_dir(&self) -> bool {
        self.exists && self.is_directory && !self.is_empty
    }
}

/// Inspect `path`, following a link at the root (so a junction reports its target's contents).
pub fn inspect(path: &Path) -> DirectoryInfo {
    let meta = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return DirectoryInfo::missing(),
    };

    let mut info = DirectoryInfo {
        exists: true,
        is_directory: meta.is_dir(),
        ..DirectoryInfo::missing()
    };
    if !info.is_directory {
        return info;
    }

    for entry in WalkDir::new(path)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        let ft = entry.file_type();
        if ft.is_dir() {
            info.subdir_count += 1;
            continue;
        }
        if ft.is_symlink() {
            // Linked directories count as subdirectories but are not descended into.
            match fs::metadata(entry.path()) {
                Ok(m) if m.is_dir() => info.subdir_count += 1,
                Ok(m) => {
                    info.file_count += 1;
                    info.total_bytes += m.len();
                }
                Err(_) => info.file_count += 1,
            }
            continue;
        }
        info.file_count += 1;
        if let Ok(m) = entry.metadata() {
            info.total_bytes += m.len();
        }
    }

    info.is_empty = info.file_count == 0 && info.subdir_count == 0;
    info
}

/// Human-readable size using 1024-based units and two decimals.
pub fn format_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut amount = n as f64;
    for unit in UNITS {
        if amount < 1024.0 {
            return format!("{amount:.2} {unit}");
        }
        amount /= 1024.0;
    }
    format!("{amount:.2} PB")
}

/// Multi-line status block for one inspected directory.
pub fn status_block(title: &str, path: &Path, info: &DirectoryInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {title} ===");
    let _ = writeln!(out, "Path: {}", path.display());
    if !info.exists {
        let _ = writeln!(out, "Status: does not exist");
        return out;
    }
    if info.is_directory {
        let _ = writeln!(out, "Type: directory");
    } else {
        let _ = writeln!(out, "Type: NOT a directory (check this path)");
    }
    let _ = writeln!(
        out,
        "Files: {} | Subdirectories: {}",
        info.file_count, info.subdir_count
    );
    let _ = writeln!(out, "Total size: {}", format_bytes(info.total_bytes));
    let _ = writeln!(out, "Empty: {}", if info.is_empty { "yes" } else { "no" });
    out
}
