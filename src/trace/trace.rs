use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::extract::strategy::Diagnostic;
use crate::spider::session::{RunOutcome, RunState};

/// One line of the JSONL run trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub round: usize,

    pub state: String,
    pub strategy: String,

    pub admitted: usize,
    pub duplicates: usize,
    pub total: usize,
    pub empty_streak: usize,

    pub diagnostics: Vec<String>,
    pub outcome: Option<String>,
}

impl TraceEvent {
    pub fn now(round: usize, state: RunState, strategy: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            round,
            state: format!("{:?}", state),
            strategy: strategy.to_string(),
            admitted: 0,
            duplicates: 0,
            total: 0,
            empty_streak: 0,
            diagnostics: vec![],
            outcome: None,
        }
    }

    pub fn with_counts(mut self, admitted: usize, duplicates: usize, total: usize) -> Self {
        self.admitted = admitted;
        self.duplicates = duplicates;
        self.total = total;
        self
    }

    pub fn with_empty_streak(mut self, streak: usize) -> Self {
        self.empty_streak = streak;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: &[Diagnostic]) -> Self {
        self.diagnostics = diagnostics.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_outcome(mut self, outcome: &RunOutcome) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }
}
