//! Decision stage: from raw user paths to a confirmed [`RelocationPlan`].
//!
//! Precondition violations come back as `Err` carrying a
//! [`RelocateError`](crate::errors::RelocateError); a user declining something comes
//! back as [`Decision::Abort`]. Nothing here deletes or copies.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{Advisory, DestinationPolicy, MAX_SHOWN_PROCESSES, Operations, RelocationPlan, State};
use crate::errors::RelocateError;
use crate::fs_ops::{self, DirectoryInfo, format_bytes};
use crate::platform;
use crate::report::{Event, Reporter};

/// Raw input for one run, as typed by the user or taken from config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocateRequest {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Pre-select overwrite for an existing target (still confirmed).
    pub overwrite: bool,
    /// Pre-select link-only for an existing target (still confirmed). Wins over `overwrite`.
    pub link_only: bool,
}

/// Yes/no questions the decision stage may ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    CreateMissingSource(PathBuf),
    ContinueWithEmptySource(PathBuf),
    ConfirmOverwrite(PathBuf),
    ConfirmLinkOnly {
        source: PathBuf,
        target: PathBuf,
    },
    ConfirmAppClosed {
        elevated: bool,
        /// Total matching processes found.
        running: usize,
        /// Up to [`MAX_SHOWN_PROCESSES`] of them.
        shown: Vec<String>,
    },
}

impl Question {
    pub fn prompt(&self) -> String {
        match self {
            Question::CreateMissingSource(p) => {
                format!("Source {} does not exist. Create it and continue?", p.display())
            }
            Question::ContinueWithEmptySource(p) => {
                format!("Source {} is empty. Continue anyway?", p.display())
            }
            Question::ConfirmOverwrite(p) => format!(
                "Delete the existing target {} and copy over it? This cannot be undone.",
                p.display()
            ),
            Question::ConfirmLinkOnly { source, target } => format!(
                "Skip copying, delete {} and link it to the existing {}?",
                source.display(),
                target.display()
            ),
            Question::ConfirmAppClosed { .. } => {
                "Confirm the application is fully closed (and the terminal is elevated if needed). Start?"
                    .to_string()
            }
        }
    }

    /// Extra lines shown before the prompt.
    pub fn details(&self) -> Vec<String> {
        match self {
            Question::ConfirmAppClosed {
                elevated,
                running,
                shown,
            } => {
                let mut lines = vec![
                    format!("Elevated: {}", if *elevated { "yes" } else { "no" }),
                    format!("Matching running processes: {running}"),
                ];
                if !shown.is_empty() {
                    lines.push(format!("Examples (at most {MAX_SHOWN_PROCESSES}):"));
                    lines.extend(shown.iter().map(|p| format!("  {p}")));
                }
                lines
            }
            _ => Vec::new(),
        }
    }

    /// Answer used when the user just presses Enter.
    pub fn default_answer(&self) -> bool {
        matches!(self, Question::CreateMissingSource(_))
    }
}

/// User's pick when the target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetChoice {
    Reenter,
    Overwrite,
    LinkOnly,
    Abort,
}

/// The interactive half of the decision stage. Status output goes through the
/// [`Reporter`]; this trait only asks.
pub trait Frontend {
    fn confirm(&mut self, question: &Question) -> Result<bool>;
    fn choose_existing_target(&mut self, target: &Path) -> Result<TargetChoice>;
    /// A different target path, or `None` to give up.
    fn reenter_target(&mut self, current: &Path) -> Result<Option<PathBuf>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed(RelocationPlan),
    Abort(String),
}

fn abort(reporter: &dyn Reporter, reason: &str) -> Result<Decision> {
    info!(reason, "relocation aborted");
    reporter.state(State::Aborted);
    reporter.note(&format!("Aborted: {reason}"));
    Ok(Decision::Abort(reason.to_string()))
}

fn show(reporter: &dyn Reporter, title: &str, path: &Path, info: &DirectoryInfo) {
    reporter.report(Event::Status {
        title: title.to_string(),
        path: path.to_path_buf(),
        info: info.clone(),
    });
}

/// The source must not already be a link: resolving it would silently follow the
/// redirect and relocate the target onto itself.
fn resolve_source(raw: &Path) -> Result<PathBuf> {
    let absolute = fs_ops::absolutize(raw)?;
    if fs_ops::is_link(&absolute) {
        return Err(RelocateError::AlreadyLinked(absolute).into());
    }
    fs_ops::resolve_path(&absolute)
}

/// Run the decision stage.
pub fn prepare(
    request: &RelocateRequest,
    frontend: &mut dyn Frontend,
    advisory: &dyn Advisory,
    ops: &dyn Operations,
    reporter: &dyn Reporter,
) -> Result<Decision> {
    platform::ensure_link_support()?;
    reporter.state(State::Init);

    let source = resolve_source(&request.source)?;
    let mut src_info = ops.inspect(&source);
    show(reporter, "Source", &source, &src_info);
    if !src_info.exists {
        if !frontend.confirm(&Question::CreateMissingSource(source.clone()))? {
            return abort(reporter, "source does not exist");
        }
        ops.create_dir(&source)?;
        src_info = ops.inspect(&source);
        show(reporter, "Source (created)", &source, &src_info);
    } else if !src_info.is_directory {
        return Err(RelocateError::NotADirectory(source).into());
    }
    if src_info.is_empty && !frontend.confirm(&Question::ContinueWithEmptySource(source.clone()))? {
        return abort(reporter, "source is empty");
    }
    reporter.state(State::SourceResolved);

    let mut preset = if request.link_only {
        Some(TargetChoice::LinkOnly)
    } else if request.overwrite {
        Some(TargetChoice::Overwrite)
    } else {
        None
    };
    let mut raw_target = request.target.clone();
    let (target, tgt_info, policy) = loop {
        let target = fs_ops::resolve_path(&raw_target)?;
        fs_ops::ensure_disjoint(&source, &target)?;
        let info = ops.inspect(&target);
        show(reporter, "Target", &target, &info);

        if !info.exists {
            if preset == Some(TargetChoice::LinkOnly) {
                return Err(RelocateError::TargetMissing(target).into());
            }
            break (target, info, DestinationPolicy::ProceedFresh);
        }
        if !info.is_directory {
            return Err(RelocateError::NotADirectory(target).into());
        }

        let choice = match preset.take() {
            Some(c) => c,
            None => frontend.choose_existing_target(&target)?,
        };
        debug!(?choice, target = %target.display(), "existing target choice");
        match choice {
            TargetChoice::Reenter => match frontend.reenter_target(&target)? {
                Some(p) => raw_target = p,
                None => return abort(reporter, "no target chosen"),
            },
            TargetChoice::Overwrite => {
                if frontend.confirm(&Question::ConfirmOverwrite(target.clone()))? {
                    break (target, info, DestinationPolicy::OverwriteExisting);
                }
            }
            TargetChoice::LinkOnly => {
                let q = Question::ConfirmLinkOnly {
                    source: source.clone(),
                    target: target.clone(),
                };
                if frontend.confirm(&q)? {
                    break (target, info, DestinationPolicy::LinkOnlyToExisting);
                }
            }
            TargetChoice::Abort => return abort(reporter, "target already exists"),
        }
    };

    if policy != DestinationPolicy::LinkOnlyToExisting {
        check_free_space(advisory, &target, &src_info, &tgt_info, policy)?;
    }
    reporter.state(State::DestinationDecided);

    let elevated = advisory.is_elevated();
    let running = advisory.matching_processes();
    info!(elevated, running = running.len(), "pre-flight checks");
    let question = Question::ConfirmAppClosed {
        elevated,
        running: running.len(),
        shown: running.into_iter().take(MAX_SHOWN_PROCESSES).collect(),
    };
    if !frontend.confirm(&question)? {
        return abort(reporter, "not confirmed");
    }

    Ok(Decision::Proceed(RelocationPlan {
        source,
        target,
        policy,
        confirmed: true,
    }))
}

/// The target volume must hold the whole source. Under overwrite the existing
/// target's bytes are freed first, so they count as available.
fn check_free_space(
    advisory: &dyn Advisory,
    target: &Path,
    src_info: &DirectoryInfo,
    tgt_info: &DirectoryInfo,
    policy: DestinationPolicy,
) -> Result<()> {
    let Some(free) = advisory.free_space(target) else {
        debug!(target = %target.display(), "free space unknown; skipping check");
        return Ok(());
    };
    let reclaimed = if policy == DestinationPolicy::OverwriteExisting {
        tgt_info.total_bytes
    } else {
        0
    };
    let available = free.saturating_add(reclaimed);
    let required = src_info.total_bytes;
    debug!(
        required = %format_bytes(required),
        available = %format_bytes(available),
        "free space check"
    );
    if required > available {
        return Err(RelocateError::InsufficientSpace {
            required,
            available,
            dest: target.to_path_buf(),
        }
        .into());
    }
    Ok(())
}
