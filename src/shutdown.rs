//! Process-wide interrupt coordination for Ctrl-C.
//!
//! The relocation cannot be cancelled once mutating phases begin, so an interrupt
//! means different things depending on where the run is:
//! - before execution: abort cleanly (nothing has changed yet);
//! - during execution: warn that it is not honoured; a second interrupt force-exits.
//!
//! Relaxed atomics are sufficient for these one-way flags.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static EXECUTING: AtomicBool = AtomicBool::new(false);
static INTERRUPTS: AtomicUsize = AtomicUsize::new(0);

/// What the signal handler should do about an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Decision stage: stop now, nothing was changed.
    Abort,
    /// First interrupt during execution: tell the user it is not honoured.
    Ignore,
    /// Repeated interrupt during execution: exit immediately, accepting the risk.
    ForceExit,
}

/// Mark the start of the mutating phases.
#[inline]
pub fn enter_execution() {
    EXECUTING.store(true, Ordering::Relaxed);
}

#[inline]
pub fn is_executing() -> bool {
    EXECUTING.load(Ordering::Relaxed)
}

/// Record an interrupt and decide what to do about it.
pub fn on_interrupt() -> InterruptAction {
    let seen_before = INTERRUPTS.fetch_add(1, Ordering::Relaxed);
    if !is_executing() {
        InterruptAction::Abort
    } else if seen_before == 0 {
        InterruptAction::Ignore
    } else {
        InterruptAction::ForceExit
    }
}

/// Check whether any interrupt has been received.
#[inline]
pub fn is_requested() -> bool {
    INTERRUPTS.load(Ordering::Relaxed) > 0
}

/// Test-only: clear all flags.
#[cfg(test)]
pub fn reset() {
    EXECUTING.store(false, Ordering::Relaxed);
    INTERRUPTS.store(0, Ordering::Relaxed);
}
