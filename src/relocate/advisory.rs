//! Read-only pre-flight signals: elevation, running application processes, free space.
//! None of these gate anything on their own; they feed the final confirmation and the
//! free-space precondition.

use std::path::Path;
use tracing::debug;

use crate::platform::{self, ProcessEntry};

/// At most this many matching processes are shown to the user.
pub const MAX_SHOWN_PROCESSES: usize = 5;

pub trait Advisory {
    fn is_elevated(&self) -> bool;
    /// Every running process that looks like the owning application, as "pid name" lines.
    fn matching_processes(&self) -> Vec<String>;
    /// Bytes free on the volume that will hold `path`; `None` when unknown.
    fn free_space(&self, path: &Path) -> Option<u64>;
}

/// Queries the real OS.
#[derive(Debug, Clone)]
pub struct SystemAdvisory {
    patterns: Vec<String>,
}

impl SystemAdvisory {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }
}

impl Advisory for SystemAdvisory {
    fn is_elevated(&self) -> bool {
        platform::is_elevated()
    }

    fn matching_processes(&self) -> Vec<String> {
        matching_processes(
            &platform::list_processes(),
            &self.patterns,
            std::process::id(),
        )
    }

    fn free_space(&self, path: &Path) -> Option<u64> {
        let dir = platform::nearest_existing_ancestor(path)?;
        platform::free_space_bytes(&dir)
            .map_err(|e| debug!(path = %dir.display(), error = %e, "free space query failed"))
            .ok()
    }
}

/// Case-insensitive substring match of each process name against `patterns`.
/// `own_pid` is skipped: this tool's own command line usually mentions the data path.
pub fn matching_processes(procs: &[ProcessEntry], patterns: &[String], own_pid: u32) -> Vec<String> {
    let needles: Vec<String> = patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    procs
        .iter()
        .filter(|p| p.pid != own_pid)
        .filter(|p| {
            let hay = p.name.to_lowercase();
            needles.iter().any(|n| hay.contains(n.as_str()))
        })
        .map(|p| format!("{} {}", p.pid, p.name))
        .collect()
}
