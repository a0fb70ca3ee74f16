use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::dedup::ledger::DedupLedger;
use crate::device::error::DeviceError;
use crate::extract::field_spec::Record;
use crate::spider::store::ResultStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Stopped,
    Interrupted,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Idle | RunState::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailurePhase {
    Connect,
    Launch,
    Extract,
    Scroll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    pub phase: FailurePhase,
    pub message: String,
}

impl RunFailure {
    pub fn new(phase: FailurePhase, error: DeviceError) -> Self {
        Self {
            phase,
            message: error.to_string(),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// Record target reached
    Completed,
    /// Too many consecutive rounds without new records; end of list
    Stopped,
    /// Cancelled from outside
    Interrupted,
    Failed(RunFailure),
}

impl RunOutcome {
    pub fn state(&self) -> RunState {
        match self {
            RunOutcome::Completed => RunState::Completed,
            RunOutcome::Stopped => RunState::Stopped,
            RunOutcome::Interrupted => RunState::Interrupted,
            RunOutcome::Failed(_) => RunState::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed (target reached)"),
            RunOutcome::Stopped => write!(f, "stopped (end of list)"),
            RunOutcome::Interrupted => write!(f, "interrupted"),
            RunOutcome::Failed(failure) => {
                write!(f, "failed during {:?}: {}", failure.phase, failure.message)
            }
        }
    }
}

/// Mutable state of one run, owned by the controller.
#[derive(Debug)]
pub struct SessionState {
    pub state: RunState,
    pub store: ResultStore,
    pub ledger: DedupLedger,
    /// Consecutive rounds that admitted nothing
    pub empty_streak: usize,
    pub rounds: usize,
}

impl SessionState {
    pub fn new(ledger: DedupLedger) -> Self {
        Self {
            state: RunState::Idle,
            store: ResultStore::new(),
            ledger,
            empty_streak: 0,
            rounds: 0,
        }
    }

    pub fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    /// Fold one round's admitted records into the session.
    pub fn absorb_round(&mut self, admitted: Vec<Record>) {
        if admitted.is_empty() {
            self.empty_streak += 1;
        } else {
            self.empty_streak = 0;
            self.store.append(admitted);
        }
    }
}
