//! Tree copy: bulk tool first, manual walk as fallback.
//!
//! - The bulk tool (robocopy on Windows) mirrors the tree, keeps metadata and retries
//!   failed files itself. Its exit code is interpreted against a success range.
//! - If the tool is not installed (or none is configured), a manual walk mirrors
//!   directories and copies each file that does not exist at the destination yet.
//!   An existing destination file is never refreshed, even if the source changed.
//! - Nothing is ever deleted here.

use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::helpers::{io_error_with_help, io_error_with_help_io};
use super::inspect::format_bytes;
use super::meta::preserve_metadata;
use crate::errors::RelocateError;
use crate::report::Reporter;

/// Narrate manual-copy progress every this many files.
const PROGRESS_EVERY: u64 = 500;

/// External bulk-copy program and how to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkTool {
    pub program: String,
    /// Argument templates. An argument that is exactly `{source}` or `{target}` is
    /// replaced by that path; `{retries}` inside an argument is replaced by the retry count.
    pub args: Vec<String>,
    /// Highest exit code that still counts as success.
    pub max_success_code: i32,
}

impl BulkTool {
    /// robocopy: mirror subdirectories (including empty ones), copy all file info,
    /// retry each failed file `{retries}` times with a one second wait.
    /// Exit codes 0-7 are informational success flags; 8 and above mean failures.
    pub fn robocopy() -> Self {
        Self {
            program: "robocopy".into(),
            args: ["{source}", "{target}", "/E", "/COPYALL", "/R:{retries}", "/W:1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_success_code: 7,
        }
    }

    /// The tool used when nothing else is configured; `None` means manual copy only.
    pub fn platform_default() -> Option<Self> {
        if cfg!(windows) {
            Some(Self::robocopy())
        } else {
            None
        }
    }

    fn render_args(&self, source: &Path, target: &Path, retries: u32) -> Vec<OsString> {
        self.args
            .iter()
            .map(|a| match a.as_str() {
                "{source}" => source.as_os_str().to_owned(),
                "{target}" => target.as_os_str().to_owned(),
                other => OsString::from(other.replace("{retries}", &retries.to_string())),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Bulk tool to try first; `None` goes straight to the manual walk.
    pub bulk_tool: Option<BulkTool>,
    /// Per-file retry count handed to the bulk tool.
    pub retries: u32,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            bulk_tool: BulkTool::platform_default(),
            retries: 1,
        }
    }
}

/// How the copy was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyMethod {
    Bulk { exit_code: i32 },
    Manual { copied: u64, skipped: u64, bytes: u64 },
}

enum BulkRun {
    Completed(i32),
    Unavailable,
}

/// Copy the tree under `source` into `target` (created if missing).
pub fn copy_tree(
    source: &Path,
    target: &Path,
    opts: &CopyOptions,
    reporter: &dyn Reporter,
) -> Result<CopyMethod> {
    let meta = fs::metadata(source).map_err(io_error_with_help("read copy source", source))?;
    if !meta.is_dir() {
        return Err(RelocateError::NotADirectory(source.to_path_buf()).into());
    }
    fs::create_dir_all(target).map_err(io_error_with_help("create target directory", target))?;

    if let Some(tool) = &opts.bulk_tool {
        match run_bulk_tool(tool, source, target, opts.retries, reporter)? {
            BulkRun::Completed(exit_code) => {
                info!(src = %source.display(), dest = %target.display(), exit_code, "bulk copy finished");
                return Ok(CopyMethod::Bulk { exit_code });
            }
            BulkRun::Unavailable => {
                warn!(program = %tool.program, "bulk copy tool not found; using manual copy");
                reporter.note(&format!(
                    "{} not found; falling back to a manual copy (this may be slow).",
                    tool.program
                ));
            }
        }
    }

    manual_copy(source, target, reporter)
}

fn run_bulk_tool(
    tool: &BulkTool,
    source: &Path,
    target: &Path,
    retries: u32,
    reporter: &dyn Reporter,
) -> Result<BulkRun> {
    let args = tool.render_args(source, target, retries);
    let shown: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
    reporter.note(&format!("Copying with {}...", tool.program));
    reporter.note(&format!("Command: {} {}", tool.program, shown.join(" ")));

    let output = match Command::new(&tool.program).args(&args).output() {
        Ok(o) => o,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BulkRun::Unavailable),
        Err(e) => {
            return Err(io_error_with_help("launch bulk copy tool", Path::new(&tool.program))(e));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        reporter.note(stdout.trim_end());
    }

    match output.status.code() {
        Some(code) if (0..=tool.max_success_code).contains(&code) => {
            reporter.note("Copy succeeded.");
            Ok(BulkRun::Completed(code))
        }
        code => {
            let status = match code {
                Some(c) => format!("exit code {c}"),
                None => "terminated by a signal".to_string(),
            };
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                tail_lines(&stdout, 20)
            } else {
                stderr.trim().to_string()
            };
            Err(RelocateError::BulkCopyFailed { status, detail }.into())
        }
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

fn manual_copy(source: &Path, target: &Path, reporter: &dyn Reporter) -> Result<CopyMethod> {
    reporter.note("Copying file by file...");
    let mut copied = 0u64;
    let mut skipped = 0u64;
    let mut bytes = 0u64;

    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| anyhow!("walk '{}': {}", source.display(), e))?;
        let rel = entry.path().strip_prefix(source)?;
        let dest = target.join(rel);
        let ft = entry.file_type();

        if ft.is_dir() {
            fs::create_dir_all(&dest).map_err(io_error_with_help("create directory", &dest))?;
            continue;
        }
        if fs::symlink_metadata(&dest).is_ok() {
            debug!(path = %dest.display(), "already present; not copied again");
            skipped += 1;
            continue;
        }
        if ft.is_symlink() {
            copy_link(entry.path(), &dest)?;
        } else {
            bytes += fs::copy(entry.path(), &dest).map_err(io_error_with_help("copy file", &dest))?;
            if let Ok(m) = entry.metadata() {
                preserve_metadata(entry.path(), &dest, &m);
            }
        }
        copied += 1;
        if copied % PROGRESS_EVERY == 0 {
            reporter.note(&format!("  {} files copied ({})", copied, format_bytes(bytes)));
        }
    }

    reporter.note(&format!(
        "Manual copy finished: {} files copied ({}), {} already present.",
        copied,
        format_bytes(bytes),
        skipped
    ));
    info!(src = %source.display(), dest = %target.display(), copied, skipped, bytes, "manual copy finished");
    Ok(CopyMethod::Manual { copied, skipped, bytes })
}

/// Recreate a link found inside the tree instead of copying what it points at.
fn copy_link(src: &Path, dest: &Path) -> io::Result<()> {
    let pointee = fs::read_link(src).map_err(io_error_with_help_io("read link", src))?;
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&pointee, dest).map_err(io_error_with_help_io("create link", dest))
    }
    #[cfg(windows)]
    {
        let is_dir = fs::metadata(src).map(|m| m.is_dir()).unwrap_or(false);
        let res = if is_dir {
            std::os::windows::fs::symlink_dir(&pointee, dest)
        } else {
            std::os::windows::fs::symlink_file(&pointee, dest)
        };
        res.map_err(io_error_with_help_io("create link", dest))
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (pointee, dest);
        Err(io::Error::new(io::ErrorKind::Unsupported, "links not supported"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;
    use assert_fs::prelude::*;

    fn manual_only() -> CopyOptions {
        CopyOptions {
            bulk_tool: None,
            retries: 1,
        }
    }

    #[test]
    fn robocopy_args_substitute_paths_and_retries() {
        let tool = BulkTool::robocopy();
        let args = tool.render_args(Path::new("C:/src"), Path::new("D:/dst"), 3);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["C:/src", "D:/dst", "/E", "/COPYALL", "/R:3", "/W:1"]);
        assert_eq!(tool.max_success_code, 7);
    }

    #[test]
    fn manual_copy_mirrors_tree() {
        let src = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();
        src.child("a.txt").write_str("alpha").unwrap();
        src.child("models/m.bin").write_binary(&[7u8; 64]).unwrap();
        src.child("empty/dir").create_dir_all().unwrap();
        let target = dst.path().join("new/target");

        let rec = RecordingReporter::new();
        let method = copy_tree(src.path(), &target, &manual_only(), &rec).unwrap();
        assert_eq!(
            method,
            CopyMethod::Manual {
                copied: 2,
                skipped: 0,
                bytes: 69
            }
        );
        assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "alpha");
        assert_eq!(fs::read(target.join("models/m.bin")).unwrap(), vec![7u8; 64]);
        assert!(target.join("empty/dir").is_dir());
        assert!(src.child("a.txt").path().exists(), "source must be left alone");
        assert!(rec.transcript().contains("Manual copy finished"));
    }

    #[test]
    fn manual_copy_keeps_existing_destination_files() {
        let src = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();
        src.child("config.json").write_str("new").unwrap();
        src.child("other.txt").write_str("other").unwrap();
        dst.child("config.json").write_str("old").unwrap();

        let rec = RecordingReporter::new();
        let method = copy_tree(src.path(), dst.path(), &manual_only(), &rec).unwrap();
        assert!(matches!(method, CopyMethod::Manual { copied: 1, skipped: 1, .. }));
        assert_eq!(fs::read_to_string(dst.child("config.json").path()).unwrap(), "old");
        assert_eq!(fs::read_to_string(dst.child("other.txt").path()).unwrap(), "other");
    }

    #[test]
    fn source_must_be_a_directory() {
        let td = assert_fs::TempDir::new().unwrap();
        let f = td.child("file.txt");
        f.write_str("x").unwrap();
        let err = copy_tree(f.path(), &td.path().join("out"), &manual_only(), &RecordingReporter::new())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RelocateError>(),
            Some(RelocateError::NotADirectory(_))
        ));
    }

    #[test]
    fn missing_tool_falls_back_to_manual() {
        let src = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();
        src.child("f.txt").write_str("x").unwrap();
        let opts = CopyOptions {
            bulk_tool: Some(BulkTool {
                program: "junction-move-no-such-copy-tool".into(),
                args: vec!["{source}".into(), "{target}".into()],
                max_success_code: 0,
            }),
            retries: 1,
        };
        let rec = RecordingReporter::new();
        let method = copy_tree(src.path(), dst.path(), &opts, &rec).unwrap();
        assert!(matches!(method, CopyMethod::Manual { copied: 1, .. }));
        assert!(rec.transcript().contains("falling back"));
    }

    #[cfg(unix)]
    fn sh_tool(script: &str, max_success_code: i32) -> CopyOptions {
        CopyOptions {
            bulk_tool: Some(BulkTool {
                program: "sh".into(),
                args: vec![
                    "-c".into(),
                    script.into(),
                    "{source}".into(),
                    "{target}".into(),
                ],
                max_success_code,
            }),
            retries: 1,
        }
    }

    #[cfg(unix)]
    #[test]
    fn bulk_tool_success_range_counts_as_success() {
        let src = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();
        src.child("sub/f.txt").write_str("bulk").unwrap();
        let opts = sh_tool(r#"cp -R "$0"/. "$1" && echo copied && exit 3"#, 7);
        let rec = RecordingReporter::new();
        let method = copy_tree(src.path(), dst.path(), &opts, &rec).unwrap();
        assert_eq!(method, CopyMethod::Bulk { exit_code: 3 });
        assert_eq!(fs::read_to_string(dst.path().join("sub/f.txt")).unwrap(), "bulk");
        assert!(rec.transcript().contains("copied"));
    }

    #[cfg(unix)]
    #[test]
    fn bulk_tool_failure_is_not_retried_manually() {
        let src = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();
        src.child("f.txt").write_str("x").unwrap();
        let opts = sh_tool("echo 'ERROR: access denied' >&2; exit 16", 7);
        let err = copy_tree(src.path(), dst.path(), &opts, &RecordingReporter::new()).unwrap_err();
        match err.downcast_ref::<RelocateError>() {
            Some(RelocateError::BulkCopyFailed { status, detail }) => {
                assert_eq!(status, "exit code 16");
                assert!(detail.contains("access denied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dst.path().join("f.txt").exists(), "no manual fallback after a real failure");
    }

    #[cfg(unix)]
    #[test]
    fn manual_copy_recreates_links() {
        let src = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();
        src.child("real.txt").write_str("r").unwrap();
        std::os::unix::fs::symlink("real.txt", src.path().join("alias.txt")).unwrap();
        copy_tree(src.path(), dst.path(), &manual_only(), &RecordingReporter::new()).unwrap();
        let link = dst.path().join("alias.txt");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), Path::new("real.txt"));
    }

    #[test]
    fn tail_lines_keeps_last_n() {
        assert_eq!(tail_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail_lines("a", 5), "a");
    }
}
