//! Unix implementations of platform helpers.
//! The directory link here is a plain symlink; there is no junction on Unix.

use anyhow::{Context, Result};
use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::ProcessEntry;
use super::temp::tmp_config_sibling_name;
use crate::errors::RelocateError;

/// Open log file for appending; 0600 only when the file is new so that
/// administrator adjustments to an existing log are preserved.
pub fn open_log_file_secure_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let existed = path.exists();
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)?;
    if !existed {
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(f)
}

/// Write config atomically: temp file (0600) + fsync + rename + fsync dir.
pub fn write_config_secure_new_0600(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "config path has no parent"))?;
    fs::create_dir_all(parent).with_context(|| format!("create parent '{}'", parent.display()))?;

    let tmp = tmp_config_sibling_name(path);
    let mut f = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(&tmp)
        .with_context(|| format!("create temp '{}'", tmp.display()))?;
    f.write_all(contents).context("write temp")?;
    f.sync_all().context("fsync temp")?;
    drop(f);

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e)
            .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()));
    }

    let dir_file =
        File::open(parent).with_context(|| format!("open dir '{}'", parent.display()))?;
    dir_file.sync_all().context("fsync parent dir")?;
    Ok(())
}

pub fn set_dir_mode_0700(path: &Path) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
}

/// Root counts as elevated.
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Snapshot of running processes via `ps`. An unavailable `ps` yields an empty list.
pub fn list_processes() -> Vec<ProcessEntry> {
    let output = match Command::new("ps").args(["-eo", "pid=,args="]).output() {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            debug!(status = ?o.status, "ps exited unsuccessfully");
            return Vec::new();
        }
        Err(e) => {
            debug!(error = %e, "ps not available");
            return Vec::new();
        }
    };
    parse_ps(&String::from_utf8_lossy(&output.stdout))
}

fn parse_ps(text: &str) -> Vec<ProcessEntry> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let (pid, rest) = line.split_once(char::is_whitespace)?;
            Some(ProcessEntry {
                pid: pid.parse().ok()?,
                name: rest.trim().to_string(),
            })
        })
        .collect()
}

/// Bytes available to the current user on the filesystem holding `path`.
pub fn free_space_bytes(path: &Path) -> io::Result<u64> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains null byte"))?;
    unsafe {
        let mut stat: MaybeUninit<libc::statvfs> = MaybeUninit::uninit();
        if libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) != 0 {
            return Err(io::Error::last_os_error());
        }
        let stat = stat.assume_init();
        #[allow(clippy::unnecessary_cast)]
        Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
    }
}

/// Create `link` as a directory symlink to `target`.
pub fn create_dir_link(link: &Path, target: &Path) -> Result<()> {
    match std::os::unix::fs::symlink(target, link) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(RelocateError::LinkPathOccupied(link.to_path_buf()).into())
        }
        Err(e) => Err(RelocateError::JunctionFailed {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            detail: e.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::temp::TMP_PREFIX;
    use tempfile::tempdir;

    #[test]
    fn preserve_existing_log_file_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, b"hello").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        let _f = open_log_file_secure_append(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640, "existing permissions should be preserved");
    }

    #[test]
    fn new_log_file_gets_0600() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs/new_log.txt");
        let _f = open_log_file_secure_append(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn config_write_sets_mode_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let cfg = dir.path().join("config.xml");
        write_config_secure_new_0600(&cfg, b"<a/>").unwrap();
        write_config_secure_new_0600(&cfg, b"<b/>").unwrap();
        assert_eq!(fs::read(&cfg).unwrap(), b"<b/>");
        let mode = fs::metadata(&cfg).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.starts_with(TMP_PREFIX), "leftover temp file: {name}");
        }
    }

    #[test]
    fn config_write_onto_directory_fails_and_cleans_temp() {
        let dir = tempdir().unwrap();
        let cfg_dir = dir.path().join("config.xml");
        fs::create_dir(&cfg_dir).unwrap();
        assert!(write_config_secure_new_0600(&cfg_dir, b"<x/>").is_err());
        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            assert!(!name.starts_with(TMP_PREFIX), "leftover temp file: {name}");
        }
    }

    #[test]
    fn free_space_smoke() {
        let dir = tempdir().unwrap();
        assert!(free_space_bytes(dir.path()).unwrap() > 0);
        assert!(free_space_bytes(Path::new("/definitely/not/here/jm")).is_err());
    }

    #[test]
    fn parse_ps_lines() {
        let text = "    1 /sbin/init splash\n  420 /opt/LM Studio/lm-studio --flag\ngarbage\n";
        let got = parse_ps(text);
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].pid, 420);
        assert_eq!(got[1].name, "/opt/LM Studio/lm-studio --flag");
    }

    #[test]
    fn own_process_is_listed() {
        let me = std::process::id();
        let procs = list_processes();
        // Minimal containers may lack ps; only assert when a listing came back.
        if !procs.is_empty() {
            assert!(procs.iter().any(|p| p.pid == me));
        }
    }

    #[test]
    fn symlink_link_errors_are_classified() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("t");
        fs::create_dir(&target).unwrap();
        let occupied = dir.path().join("occupied");
        fs::create_dir(&occupied).unwrap();

        let err = create_dir_link(&occupied, &target).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RelocateError>(),
            Some(RelocateError::LinkPathOccupied(_))
        ));

        let err = create_dir_link(&dir.path().join("x/y"), &target).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RelocateError>(),
            Some(RelocateError::JunctionFailed { .. })
        ));
    }
}
