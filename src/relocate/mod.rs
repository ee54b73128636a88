//! The directory-relocation protocol.
//!
//! A run has two stages:
//!
//! 1. **Decision** ([`prepare`]): resolve and inspect both paths, settle what to do
//!    about an existing target, gather advisory signals and collect the user's
//!    confirmations. Interactive; mutates nothing except creating a missing source
//!    directory when the user asks for it. Produces an immutable [`RelocationPlan`].
//! 2. **Execution** ([`execute`]): run the mutating phases strictly in order
//!    (clear target, copy, delete source, link) and convert the first failure into a
//!    [`Failure`] value. There is no rollback and no cancellation.
//!
//! All filesystem effects go through the [`Operations`] seam so the sequencing can
//! be exercised with a scripted double.

use std::fmt;
use std::path::PathBuf;

mod advisory;
mod execute;
mod ops;
mod prepare;

pub use advisory::{Advisory, MAX_SHOWN_PROCESSES, SystemAdvisory, matching_processes};
pub use execute::execute;
pub use ops::{Operations, SystemOps};
pub use prepare::{Decision, Frontend, Question, RelocateRequest, TargetChoice, prepare};

/// What to do about the destination directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationPolicy {
    /// Target does not exist; copy into a fresh directory.
    ProceedFresh,
    /// Delete the existing target, then copy.
    OverwriteExisting,
    /// Skip the copy; delete the source and link it to the existing target as-is.
    LinkOnlyToExisting,
    Abort,
}

/// Output of the decision stage; consumed once by [`execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    pub source: PathBuf,
    pub target: PathBuf,
    pub policy: DestinationPolicy,
    /// The user confirmed the owning application is closed.
    pub confirmed: bool,
}

impl RelocationPlan {
    /// Phases this plan will run, in order.
    pub fn phases(&self) -> Vec<Phase> {
        match self.policy {
            DestinationPolicy::ProceedFresh => {
                vec![Phase::Copy, Phase::DeleteSource, Phase::Link]
            }
            DestinationPolicy::OverwriteExisting => vec![
                Phase::ClearTarget,
                Phase::Copy,
                Phase::DeleteSource,
                Phase::Link,
            ],
            DestinationPolicy::LinkOnlyToExisting => vec![Phase::DeleteSource, Phase::Link],
            DestinationPolicy::Abort => Vec::new(),
        }
    }
}

/// A mutating step of the execution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ClearTarget,
    Copy,
    DeleteSource,
    Link,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::ClearTarget => "clear-target",
            Phase::Copy => "copy",
            Phase::DeleteSource => "delete",
            Phase::Link => "link",
        };
        f.write_str(s)
    }
}

/// Orchestrator states, reported as they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    SourceResolved,
    DestinationDecided,
    ClearingTarget,
    Copying,
    SourceDeleting,
    Linking,
    Done,
    Aborted,
    Failed(Phase),
}

impl State {
    pub(crate) fn entering(phase: Phase) -> Self {
        match phase {
            Phase::ClearTarget => State::ClearingTarget,
            Phase::Copy => State::Copying,
            Phase::DeleteSource => State::SourceDeleting,
            Phase::Link => State::Linking,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Done | State::Aborted | State::Failed(_))
    }
}

/// A phase failure, caught at the orchestrator boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub phase: Phase,
    /// Full error chain of the cause.
    pub cause: String,
    pub remediation: String,
    /// Stable code when the cause is a well-known error.
    pub code: Option<u16>,
}

impl Failure {
    /// After a link failure the source tree is gone; the target holds the only copy.
    pub fn data_only_at_target(&self) -> bool {
        self.phase == Phase::Link
    }

    /// Whether the source tree is known to still be intact.
    pub fn source_intact(&self) -> bool {
        matches!(self.phase, Phase::ClearTarget | Phase::Copy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// All phases ran. `verified` is false when the source path did not resolve to a
    /// directory afterwards (a warning, not an error).
    Done { verified: bool },
    Aborted(String),
    Failed(Failure),
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Done { .. } | Outcome::Aborted(_) => 0,
            Outcome::Failed(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(policy: DestinationPolicy) -> RelocationPlan {
        RelocationPlan {
            source: PathBuf::from("/s"),
            target: PathBuf::from("/t"),
            policy,
            confirmed: true,
        }
    }

    #[test]
    fn phase_order_per_policy() {
        assert_eq!(
            plan(DestinationPolicy::ProceedFresh).phases(),
            vec![Phase::Copy, Phase::DeleteSource, Phase::Link]
        );
        assert_eq!(
            plan(DestinationPolicy::OverwriteExisting).phases()[0],
            Phase::ClearTarget
        );
        assert!(!plan(DestinationPolicy::LinkOnlyToExisting)
            .phases()
            .contains(&Phase::Copy));
        assert!(plan(DestinationPolicy::Abort).phases().is_empty());
    }

    #[test]
    fn failure_flags_follow_phase() {
        let f = |phase| Failure {
            phase,
            cause: String::new(),
            remediation: String::new(),
            code: None,
        };
        assert!(f(Phase::Copy).source_intact());
        assert!(!f(Phase::DeleteSource).source_intact());
        assert!(f(Phase::Link).data_only_at_target());
        assert!(!f(Phase::DeleteSource).data_only_at_target());
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::ClearTarget.to_string(), "clear-target");
        assert_eq!(Phase::DeleteSource.to_string(), "delete");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Outcome::Done { verified: false }.exit_code(), 0);
        assert_eq!(Outcome::Aborted("no".into()).exit_code(), 0);
        assert!(State::Failed(Phase::Copy).is_terminal());
        assert!(!State::Linking.is_terminal());
    }
}
