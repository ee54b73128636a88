//! Typed error definitions for junction_move.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("Path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Source and target resolve to the same path: {0}")]
    SamePath(PathBuf),

    #[error("'{inner}' lies inside '{outer}'; source and target must be disjoint")]
    NestedPaths { outer: PathBuf, inner: PathBuf },

    #[error("Source is already a link or junction (already relocated?): {0}")]
    AlreadyLinked(PathBuf),

    #[error("Link location already exists: {0}")]
    LinkPathOccupied(PathBuf),

    #[error("Target directory does not exist: {0}")]
    TargetMissing(PathBuf),

    #[error("Insufficient disk space for destination {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u64,
        available: u64,
        dest: PathBuf,
    },

    #[error("Bulk copy failed ({status}): {detail}")]
    BulkCopyFailed { status: String, detail: String },

    #[error("Creating junction '{link}' -> '{target}' failed: {detail}")]
    JunctionFailed {
        link: PathBuf,
        target: PathBuf,
        detail: String,
    },

    #[error("Directory junctions are not supported on this platform")]
    UnsupportedPlatform,

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl RelocateError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            RelocateError::NotADirectory(_) => 10,
            RelocateError::SamePath(_) => 11,
            RelocateError::NestedPaths { .. } => 12,
            RelocateError::AlreadyLinked(_) => 13,
            RelocateError::LinkPathOccupied(_) => 14,
            RelocateError::TargetMissing(_) => 15,
            RelocateError::InsufficientSpace { .. } => 20,
            RelocateError::BulkCopyFailed { .. } => 30,
            RelocateError::JunctionFailed { .. } => 40,
            RelocateError::UnsupportedPlatform => 50,
            RelocateError::Interrupted => 130,
        }
    }

    /// One-line suggestion shown to the user next to the cause.
    pub fn remediation(&self) -> &'static str {
        match self {
            RelocateError::NotADirectory(_) => "Point the tool at a directory, not a file.",
            RelocateError::SamePath(_) | RelocateError::NestedPaths { .. } => {
                "Pick a target on another volume that is not inside the source."
            }
            RelocateError::AlreadyLinked(_) => {
                "The source already redirects elsewhere; nothing to relocate."
            }
            RelocateError::LinkPathOccupied(_) => {
                "Remove or rename the entry at the link path, then create the link again."
            }
            RelocateError::TargetMissing(_) => {
                "Link-only mode needs an existing target; choose a normal relocation instead."
            }
            RelocateError::InsufficientSpace { .. } => {
                "Free up space on the target volume or pick another target."
            }
            RelocateError::BulkCopyFailed { .. } => {
                "Make sure the application is closed and the target volume is writable, then re-run."
            }
            RelocateError::JunctionFailed { .. } => junction_hint(),
            RelocateError::UnsupportedPlatform => {
                "Run the tool on a system with directory junction or symlink support."
            }
            RelocateError::Interrupted => "Re-run the tool when ready.",
        }
    }
}

/// Platform guidance for a failed link creation.
pub fn junction_hint() -> &'static str {
    if cfg!(windows) {
        "Run the terminal as Administrator or enable Windows Developer Mode, then retry."
    } else {
        "Check write permission on the parent of the link path (or re-run with elevated rights), then retry."
    }
}
