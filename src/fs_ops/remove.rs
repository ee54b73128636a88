//! Recursive delete. Missing path is a no-op; any error stops immediately and the
//! tree may be left partially deleted. A link at `path` is removed, not followed.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

use super::helpers::io_error_with_help;

pub fn remove_tree(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_error_with_help("stat before removal", path)(e)),
    };

    let ft = meta.file_type();
    if ft.is_symlink() {
        remove_link(path)?;
    } else if ft.is_dir() {
        fs::remove_dir_all(path).map_err(io_error_with_help("remove directory tree", path))?;
    } else {
        fs::remove_file(path).map_err(io_error_with_help("remove file", path))?;
    }
    info!(path = %path.display(), "removed");
    Ok(())
}

/// Drop the link itself. Directory links on Windows (junctions included) go through
/// `remove_dir`; everywhere else a link is a file entry.
fn remove_link(path: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        if fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false) {
            return fs::remove_dir(path).map_err(io_error_with_help("remove junction", path));
        }
    }
    fs::remove_file(path).map_err(io_error_with_help("remove link", path))
}
