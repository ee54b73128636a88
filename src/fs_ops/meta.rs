//! Best-effort metadata carry-over for the manual copy path.
//! Timestamps always; mode bits on Unix; the read-only attribute on Windows;
//! extended attributes when built with the `xattrs` feature. Failures are logged, never fatal.

use filetime::{set_file_times, FileTime};
use std::fs;
use std::path::Path;
use tracing::{trace, warn};

pub(super) fn preserve_metadata(src: &Path, dest: &Path, src_meta: &fs::Metadata) {
    let mtime = FileTime::from_last_modification_time(src_meta);
    let atime = FileTime::from_last_access_time(src_meta);
    match set_file_times(dest, atime, mtime) {
        Ok(()) => trace!(path = %dest.display(), "copied timestamps"),
        Err(e) => warn!(path = %dest.display(), error = %e, "failed to set timestamps on copy"),
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = src_meta.permissions().mode() & 0o7777;
        if let Err(e) = fs::set_permissions(dest, fs::Permissions::from_mode(mode)) {
            warn!(path = %dest.display(), mode = format!("{mode:o}"), error = %e, "failed to set permissions on copy");
        }
    }

    #[cfg(windows)]
    {
        if src_meta.permissions().readonly() {
            if let Ok(meta) = fs::metadata(dest) {
                let mut perms = meta.permissions();
                perms.set_readonly(true);
                if let Err(e) = fs::set_permissions(dest, perms) {
                    warn!(path = %dest.display(), error = %e, "failed to set read-only attribute on copy");
                }
            }
        }
    }

    preserve_xattrs(src, dest);
}

#[cfg(feature = "xattrs")]
fn preserve_xattrs(src: &Path, dest: &Path) {
    let names = match xattr::list(src) {
        Ok(n) => n,
        Err(e) => {
            warn!(src = %src.display(), error = %e, "failed to list xattrs");
            return;
        }
    };
    for name in names {
        let value = match xattr::get(src, &name) {
            Ok(v) => v.unwrap_or_default(),
            Err(e) => {
                warn!(src = %src.display(), xattr = %name.to_string_lossy(), error = %e, "failed to read xattr");
                continue;
            }
        };
        if let Err(e) = xattr::set(dest, &name, &value) {
            warn!(dest = %dest.display(), xattr = %name.to_string_lossy(), error = %e, "failed to set xattr");
        }
    }
}

#[cfg(not(feature = "xattrs"))]
fn preserve_xattrs(_src: &Path, _dest: &Path) {}
