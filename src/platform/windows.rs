//! Windows implementations of platform helpers.
//!
//! Notes:
//! - The link is a directory junction made by `mklink /J`; junctions need no symlink
//!   privilege but `mklink` still reports policy failures, which are surfaced verbatim.
//! - No ACL management; POSIX-mode helpers are no-ops.

use anyhow::Result;
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::ProcessEntry;
use super::temp::tmp_config_sibling_name;
use crate::errors::RelocateError;

pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Write the config via temp file + rename. Best-effort security (no ACL changes).
pub fn write_config_secure_new_0600(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "config path has no parent"))?;
    fs::create_dir_all(parent)?;

    let tmp = tmp_config_sibling_name(path);
    let mut f = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
    f.write_all(contents)?;
    f.sync_all()?;
    drop(f);
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

pub fn set_dir_mode_0700(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Whether the process runs with Administrator rights.
pub fn is_elevated() -> bool {
    unsafe { windows_sys::Win32::UI::Shell::IsUserAnAdmin() != 0 }
}

/// Snapshot of running processes via `tasklist`. Failure yields an empty list.
pub fn list_processes() -> Vec<ProcessEntry> {
    let output = match Command::new("tasklist").args(["/FO", "CSV", "/NH"]).output() {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            debug!(status = ?o.status, "tasklist exited unsuccessfully");
            return Vec::new();
        }
        Err(e) => {
            debug!(error = %e, "tasklist not available");
            return Vec::new();
        }
    };
    parse_tasklist(&String::from_utf8_lossy(&output.stdout))
}

/// `"Image Name","PID","Session Name","Session#","Mem Usage"` rows.
fn parse_tasklist(text: &str) -> Vec<ProcessEntry> {
    text.lines()
        .filter_map(|line| {
            let mut cols = line.split("\",\"").map(|c| c.trim_matches('"'));
            let name = cols.next()?.trim();
            let pid = cols.next()?.trim().parse().ok()?;
            Some(ProcessEntry {
                pid,
                name: name.to_string(),
            })
        })
        .collect()
}

fn wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

/// Bytes available to the caller on the volume holding `path`.
pub fn free_space_bytes(path: &Path) -> io::Result<u64> {
    use windows_sys::Win32::Storage::FileSystem::GetDiskFreeSpaceExW;
    let w = wide(path.as_os_str());
    let mut avail: u64 = 0;
    let mut total: u64 = 0;
    let mut free: u64 = 0;
    let ok = unsafe { GetDiskFreeSpaceExW(w.as_ptr(), &mut avail, &mut total, &mut free) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(avail)
}

/// Create `link` as a directory junction to `target` with `mklink /J`.
pub fn create_dir_link(link: &Path, target: &Path) -> Result<()> {
    let output = Command::new("cmd")
        .arg("/C")
        .arg("mklink")
        .arg("/J")
        .arg(link)
        .arg(target)
        .output()
        .map_err(|e| RelocateError::JunctionFailed {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            detail: format!("could not run mklink: {e}"),
        })?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let detail = match (stderr.is_empty(), stdout.is_empty()) {
        (false, _) => stderr,
        (true, false) => stdout,
        (true, true) => format!("mklink exited with {}", output.status),
    };
    Err(RelocateError::JunctionFailed {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        detail,
    }
    .into())
}
