//! Directory junction creation.
//! Refuses to touch an occupied link path; otherwise delegates to the platform facility
//! (`mklink /J` on Windows, a directory symlink on Unix).

use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::errors::RelocateError;
use crate::platform;
use crate::report::Reporter;

/// Create `link` as a redirect to the directory `target`.
///
/// Any existing entry at `link` (file, directory, live or dangling link) is a
/// precondition error and nothing is created. The platform call itself also refuses an
/// existing entry, so a path that appears between the check and the call is still caught.
pub fn create_junction(link: &Path, target: &Path, reporter: &dyn Reporter) -> Result<()> {
    if fs::symlink_metadata(link).is_ok() {
        return Err(RelocateError::LinkPathOccupied(link.to_path_buf()).into());
    }
    reporter.note(&format!(
        "Creating directory junction: {} -> {}",
        link.display(),
        target.display()
    ));
    platform::create_dir_link(link, target)?;
    info!(link = %link.display(), target = %target.display(), "junction created");
    reporter.note("Junction created.");
    Ok(())
}
