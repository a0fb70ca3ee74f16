use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::extract::strategy::RoundExtraction;
use crate::spider::session::{RunOutcome, SessionState};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// Display and reporting state for a single run.
///
/// Built when a run starts and dropped when it ends; nothing here is shared
/// between runs.
pub struct RunContext {
    pub title: String,
    pub target: usize,
    pub max_empty_rounds: usize,
    pub strategy: &'static str,
    started: Instant,
    trace: TraceLogger,
}

impl RunContext {
    pub fn new(
        title: &str,
        target: usize,
        max_empty_rounds: usize,
        strategy: &'static str,
        trace_path: Option<&Path>,
    ) -> Self {
        Self {
            title: title.to_string(),
            target,
            max_empty_rounds,
            strategy,
            started: Instant::now(),
            trace: trace_path.map_or_else(TraceLogger::disabled, TraceLogger::open),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    pub fn start(&self) {
        info!(
            title = %self.title,
            target = self.target,
            strategy = self.strategy,
            trace = self.trace.is_enabled(),
            "scraping started"
        );
    }

    /// Report the result of the round just absorbed into `session`.
    pub fn round(&self, session: &SessionState, admitted: usize, extraction: &RoundExtraction) {
        let total = session.store.len();

        if admitted > 0 {
            info!(
                "round {}: +{} new, {}/{} total",
                session.rounds, admitted, total, self.target
            );
        } else {
            warn!(
                "round {}: no new records ({}/{})",
                session.rounds, session.empty_streak, self.max_empty_rounds
            );
        }

        self.trace.log(
            &TraceEvent::now(session.rounds, session.state, self.strategy)
                .with_counts(admitted, extraction.duplicates, total)
                .with_empty_streak(session.empty_streak)
                .with_diagnostics(&extraction.diagnostics),
        );
    }

    pub fn finish(&self, session: &SessionState, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Completed => info!("target of {} records reached", self.target),
            RunOutcome::Stopped => warn!(
                "{} consecutive rounds without new data, reached end of list",
                self.max_empty_rounds
            ),
            RunOutcome::Interrupted => warn!("scraping interrupted by user"),
            RunOutcome::Failed(failure) => {
                tracing::error!(phase = ?failure.phase, "run failed: {}", failure.message)
            }
        }

        self.trace.log(
            &TraceEvent::now(session.rounds, outcome.state(), self.strategy)
                .with_counts(0, 0, session.store.len())
                .with_empty_streak(session.empty_streak)
                .with_outcome(outcome),
        );
    }
}
