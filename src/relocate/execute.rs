//! Execution stage: the mutating phases, in order, first failure wins.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use super::{DestinationPolicy, Failure, Operations, Outcome, Phase, RelocationPlan, State};
use crate::errors::{RelocateError, junction_hint};
use crate::report::{Event, Reporter};

/// Run `plan` to completion. Never panics on a phase error and never returns one:
/// every failure comes back as [`Outcome::Failed`]. A [`Event::Finished`] is always
/// the last event reported.
pub fn execute(plan: &RelocationPlan, ops: &dyn Operations, reporter: &dyn Reporter) -> Outcome {
    let outcome = run(plan, ops, reporter);
    reporter.report(Event::Finished(outcome.clone()));
    outcome
}

fn run(plan: &RelocationPlan, ops: &dyn Operations, reporter: &dyn Reporter) -> Outcome {
    if plan.policy == DestinationPolicy::Abort || !plan.confirmed {
        reporter.state(State::Aborted);
        return Outcome::Aborted("plan was not confirmed".into());
    }
    info!(
        source = %plan.source.display(),
        target = %plan.target.display(),
        policy = ?plan.policy,
        "starting relocation"
    );

    for phase in plan.phases() {
        reporter.state(State::entering(phase));
        if let Err(e) = run_phase(phase, plan, ops, reporter) {
            let failure = to_failure(phase, &e);
            error!(
                phase = %phase,
                code = failure.code,
                error = %failure.cause,
                "relocation failed"
            );
            reporter.state(State::Failed(phase));
            return Outcome::Failed(failure);
        }
    }

    let after = ops.inspect(&plan.source);
    reporter.report(Event::Status {
        title: "Source (after relocation)".into(),
        path: plan.source.clone(),
        info: after.clone(),
    });
    let verified = after.exists && after.is_directory;
    if verified {
        reporter.note(&format!(
            "Verified: {} now resolves to {}",
            plan.source.display(),
            plan.target.display()
        ));
    } else {
        warn!(source = %plan.source.display(), "could not verify the link after creation");
        reporter.note("Warning: could not verify the link; check the source path manually.");
    }
    reporter.state(State::Done);
    Outcome::Done { verified }
}

fn run_phase(
    phase: Phase,
    plan: &RelocationPlan,
    ops: &dyn Operations,
    reporter: &dyn Reporter,
) -> Result<()> {
    match phase {
        Phase::ClearTarget => {
            reporter.note(&format!("Removing existing target: {}", plan.target.display()));
            ops.remove(&plan.target)?;
            reporter.note("Existing target removed.");
        }
        Phase::Copy => {
            reporter.note(&format!(
                "Copying {} -> {}",
                plan.source.display(),
                plan.target.display()
            ));
            let method = ops.copy(&plan.source, &plan.target, reporter)?;
            debug!(?method, "copy phase finished");
        }
        Phase::DeleteSource => {
            reporter.note(&format!("Deleting source: {}", plan.source.display()));
            ops.remove(&plan.source)?;
            reporter.note("Source deleted.");
        }
        Phase::Link => ops.link(&plan.source, &plan.target, reporter)?,
    }
    Ok(())
}

fn to_failure(phase: Phase, err: &anyhow::Error) -> Failure {
    let known = err.downcast_ref::<RelocateError>();
    let remediation = known
        .map(RelocateError::remediation)
        .unwrap_or_else(|| default_remediation(phase));
    Failure {
        phase,
        cause: format!("{err:#}"),
        remediation: remediation.to_string(),
        code: known.map(RelocateError::code),
    }
}

fn default_remediation(phase: Phase) -> &'static str {
    match phase {
        Phase::ClearTarget => {
            "Close anything using the target directory and check its permissions, then re-run."
        }
        Phase::Copy => {
            "Make sure the application is closed and the target volume is writable, then re-run."
        }
        Phase::DeleteSource => {
            "Nothing was linked. Remove what is left of the source by hand, then re-run in link-only mode."
        }
        Phase::Link => junction_hint(),
    }
}
