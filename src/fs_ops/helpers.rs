//! I/O error enrichment.
//!
//! Wraps `io::Error`s with the operation, the path, and a platform-aware hint so a
//! phase failure can be shown to the user as one actionable line.
//!
//! Usage:
//!   fs::remove_dir_all(dir).map_err(io_error_with_help("remove directory", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

/// Hint keyed on the raw OS error code, when there is one we recognise.
fn os_hint(code: i32) -> Option<&'static str> {
    #[cfg(unix)]
    {
        match code {
            libc::EACCES | libc::EPERM => {
                Some("permission denied; check ownership or re-run with elevated rights")
            }
            libc::EBUSY | libc::ETXTBSY => Some("in use; close the application and retry"),
            libc::ENOENT => Some("path not found; verify it exists"),
            libc::EEXIST => Some("already exists; remove it or pick another path"),
            libc::ENOTEMPTY => Some("directory not empty; something is still writing into it"),
            libc::ENOSPC => Some("no space left on the target volume"),
            libc::EROFS => Some("read-only filesystem"),
            libc::ELOOP => Some("too many levels of symbolic links"),
            libc::ENAMETOOLONG => Some("path too long"),
            libc::EXDEV => Some("crosses filesystems"),
            _ => None,
        }
    }
    #[cfg(windows)]
    {
        match code {
            5 => Some("access denied; run as Administrator or clear read-only attributes"),
            32 | 33 => Some("file is in use by another process; close the application"),
            2 | 3 => Some("path not found; verify it exists"),
            80 | 183 => Some("already exists; remove it or pick another path"),
            112 => Some("target disk is full"),
            145 => Some("directory not empty; something is still writing into it"),
            206 => Some("path too long (MAX_PATH exceeded)"),
            1314 => Some("privilege not held; run as Administrator or enable Developer Mode"),
            _ => None,
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = code;
        None
    }
}

fn kind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => {
            Some("permission denied; check ownership or re-run with elevated rights")
        }
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("already exists; remove it or pick another path"),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            Some("busy; close the application and retry")
        }
        _ => None,
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    let hint = match e.raw_os_error() {
        Some(code) => os_hint(code),
        None => kind_hint(e.kind()),
    };
    if let Some(h) = hint {
        msg.push_str(" (");
        msg.push_str(h);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Adapter for anyhow::Result code: `.map_err(io_error_with_help("op", path))`.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// Adapter for io::Result code; keeps the original ErrorKind.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_fallback_mentions_path_and_hint() {
        let p = Path::new("/nonexistent/for/test");
        let err = io_error_with_help("remove directory", p)(io::Error::from(io::ErrorKind::NotFound));
        let msg = err.to_string();
        assert!(msg.contains("remove directory"));
        assert!(msg.contains("/nonexistent/for/test"));
        assert!(msg.contains("path not found"));
        assert!(!msg.contains("os code"));
    }

    #[cfg(unix)]
    #[test]
    fn raw_code_gets_hint_and_code() {
        let p = Path::new("/tmp");
        let err = io_error_with_help("copy file", p)(io::Error::from_raw_os_error(libc::ENOSPC));
        let msg = err.to_string();
        assert!(msg.contains("no space left"), "msg was: {msg}");
        assert!(msg.contains("os code"));
    }

    #[cfg(unix)]
    #[test]
    fn busy_hint_suggests_closing_app() {
        let p = Path::new("/tmp/x");
        let msg = io_error_with_help("remove", p)(io::Error::from_raw_os_error(libc::EBUSY)).to_string();
        assert!(msg.contains("close the application"));
    }

    #[test]
    fn io_adapter_preserves_kind() {
        let p = Path::new("/tmp/test.txt");
        let wrapped =
            io_error_with_help_io("create", p)(io::Error::from(io::ErrorKind::AlreadyExists));
        assert_eq!(wrapped.kind(), io::ErrorKind::AlreadyExists);
        assert!(wrapped.to_string().contains("already exists"));
    }
}
