use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::fs_ops::{self, CopyMethod, CopyOptions, DirectoryInfo, io_error_with_help};
use crate::report::Reporter;

/// Filesystem effects the protocol needs. Each method maps onto one component.
pub trait Operations: Send + Sync {
    fn inspect(&self, path: &Path) -> DirectoryInfo;
    /// Create `path` and any missing parents.
    fn create_dir(&self, path: &Path) -> Result<()>;
    fn copy(&self, source: &Path, target: &Path, reporter: &dyn Reporter) -> Result<CopyMethod>;
    fn remove(&self, path: &Path) -> Result<()>;
    fn link(&self, link: &Path, target: &Path, reporter: &dyn Reporter) -> Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Default)]
pub struct SystemOps {
    pub copy: CopyOptions,
}

impl SystemOps {
    pub fn new(copy: CopyOptions) -> Self {
        Self { copy }
    }
}

impl Operations for SystemOps {
    fn inspect(&self, path: &Path) -> DirectoryInfo {
        fs_ops::inspect(path)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(io_error_with_help("create directory", path))
    }

    fn copy(&self, source: &Path, target: &Path, reporter: &dyn Reporter) -> Result<CopyMethod> {
        fs_ops::copy_tree(source, target, &self.copy, reporter)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        fs_ops::remove_tree(path)
    }

    fn link(&self, link: &Path, target: &Path, reporter: &dyn Reporter) -> Result<()> {
        fs_ops::create_junction(link, target, reporter)
    }
}
