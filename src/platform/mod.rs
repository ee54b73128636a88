//! Platform-specific helpers.
//! Hides the OS differences (link facility, elevation, process list, free space,
//! file modes) behind one API so the relocation logic stays platform-agnostic.

use std::path::{Path, PathBuf};

mod temp;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{
    create_dir_link, free_space_bytes, is_elevated, list_processes, open_log_file_secure_append,
    set_dir_mode_0700, write_config_secure_new_0600,
};

#[cfg(windows)]
pub use windows::{
    create_dir_link, free_space_bytes, is_elevated, list_processes, open_log_file_secure_append,
    set_dir_mode_0700, write_config_secure_new_0600,
};

/// One entry from the OS process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    /// Image name on Windows, full command line on Unix.
    pub name: String,
}

/// Fail early on targets that have no directory link facility at all.
pub fn ensure_link_support() -> anyhow::Result<()> {
    #[cfg(any(unix, windows))]
    {
        Ok(())
    }
    #[cfg(not(any(unix, windows)))]
    {
        Err(crate::errors::RelocateError::UnsupportedPlatform.into())
    }
}

/// Closest ancestor of `path` (itself included) that exists. Free-space queries need a
/// real directory, and the target usually does not exist yet.
pub fn nearest_existing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())
        .map(Path::to_path_buf)
}
