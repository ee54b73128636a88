//! Progress reporting from the relocation protocol to whichever front-end drives it.
//!
//! The protocol never prints. It emits [`Event`]s into a [`Reporter`]; a front-end
//! decides how to render them. `ChannelReporter` is the one cross-thread channel used
//! when execution runs on a worker thread.

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use tracing::debug;

use crate::fs_ops::DirectoryInfo;
use crate::relocate::{Outcome, State};

/// One item of the narration stream.
#[derive(Debug, Clone)]
pub enum Event {
    /// The state machine moved to a new state.
    State(State),
    /// Free-form progress text ("copying...", tool output, ...).
    Note(String),
    /// A freshly inspected directory worth showing to the user.
    Status {
        title: String,
        path: PathBuf,
        info: DirectoryInfo,
    },
    /// The run is over; nothing follows.
    Finished(Outcome),
}

pub trait Reporter: Send + Sync {
    fn report(&self, event: Event);

    fn note(&self, text: &str) {
        debug!(narration = %text);
        self.report(Event::Note(text.to_string()));
    }

    fn state(&self, state: State) {
        debug!(?state, "state transition");
        self.report(Event::State(state));
    }
}

/// Forwards events over an mpsc channel. Send errors mean the receiver is gone;
/// the run carries on regardless.
pub struct ChannelReporter {
    tx: Sender<Event>,
}

impl ChannelReporter {
    pub fn new(tx: Sender<Event>) -> Self {
        Self { tx }
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

/// Keeps every event in memory. Handy for tests and for callers that render afterwards.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// States visited so far, in order.
    pub fn states(&self) -> Vec<State> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// All narration lines joined with newlines.
    pub fn transcript(&self) -> String {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Note(n) => Some(n),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: Event) {
        if let Ok(mut g) = self.events.lock() {
            g.push(event);
        }
    }
}
