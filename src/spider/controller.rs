use std::path::PathBuf;

use tracing::{info, warn};

use crate::dedup::ledger::DedupLedger;
use crate::device::accessor::{AppLifecycle, Connector, Device};
use crate::device::error::DeviceError;
use crate::extract::field_spec::Record;
use crate::extract::strategy::{Strategy, extract_round};
use crate::output::json::RecordSink;
use crate::report::stats::RunStats;
use crate::spider::cancel::CancelToken;
use crate::spider::config::{ConfigError, SpiderConfig};
use crate::spider::context::RunContext;
use crate::spider::hooks::RoundObserver;
use crate::spider::scroll::{ScrollConfig, ScrollPolicy};
use crate::spider::session::{FailurePhase, RunFailure, RunOutcome, RunState, SessionState};

/// Everything a finished run hands back, whatever way it ended.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub records: Vec<Record>,
    pub stats: RunStats,
    /// Where the sink stored the records, if anywhere
    pub saved_to: Option<PathBuf>,
    pub persist_error: Option<String>,
}

/// Drives the scroll → extract → accumulate loop.
pub struct Spider<P: ScrollPolicy = ScrollConfig> {
    config: SpiderConfig,
    strategy: Strategy,
    scroll: P,
    cancel: CancelToken,
    trace_path: Option<PathBuf>,
}

impl Spider<ScrollConfig> {
    /// Validate `config` and build a spider using its scroll settings.
    pub fn new(config: SpiderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            strategy: config.strategy(),
            scroll: config.scroll,
            config,
            cancel: CancelToken::new(),
            trace_path: None,
        })
    }
}

impl<P: ScrollPolicy> Spider<P> {
    /// Replace the scroll gesture policy.
    pub fn with_scroll_policy<Q: ScrollPolicy>(self, scroll: Q) -> Spider<Q> {
        Spider {
            config: self.config,
            strategy: self.strategy,
            scroll,
            cancel: self.cancel,
            trace_path: self.trace_path,
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_trace(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_path = Some(path.into());
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SpiderConfig {
        &self.config
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Run to a terminal state and hand the results to `sink`.
    ///
    /// Never panics on device trouble: connection, launch and loop failures
    /// all end in `RunOutcome::Failed`, and whatever was collected before
    /// the failure is still persisted.
    pub fn run<C, O, S>(&mut self, connector: &mut C, observer: &mut O, sink: &mut S) -> RunReport
    where
        C: Connector,
        O: RoundObserver + ?Sized,
        S: RecordSink + ?Sized,
    {
        let ctx = RunContext::new(
            &self.config.title,
            self.config.target,
            self.config.max_empty_rounds,
            self.strategy.name(),
            self.trace_path.as_deref(),
        );
        let mut session = SessionState::new(DedupLedger::new(self.config.resolved_key_fields()));

        let outcome = match self.prepare(connector) {
            Ok(mut device) => {
                session.transition(RunState::Running);
                ctx.start();
                self.drive(&mut device, &mut session, &ctx, observer)
            }
            Err(failure) => RunOutcome::Failed(failure),
        };

        self.finalize(outcome, session, ctx, sink)
    }

    /// Idle phase: connect, start the app, confirm it is in front.
    fn prepare<C: Connector>(&self, connector: &mut C) -> Result<C::Device, RunFailure> {
        info!("connecting to device");
        let mut device = connector
            .connect()
            .map_err(|e| RunFailure::new(FailurePhase::Connect, e))?;
        let name = device
            .device_name()
            .map_err(|e| RunFailure::new(FailurePhase::Connect, e))?;
        info!(device = %name, "device connected");

        self.launch(&mut device)
            .map_err(|e| RunFailure::new(FailurePhase::Launch, e))?;
        Ok(device)
    }

    fn launch<D: Device>(&self, device: &mut D) -> Result<(), DeviceError> {
        let package = &self.config.package;
        info!(package = %package, "starting app");
        device.start_app(package)?;
        // Cancellation here is picked up at the top of the first round
        self.cancel.sleep(self.config.launch_wait);

        match device.current_app()? {
            Some(current) if current == *package => {
                info!("app is in the foreground");
                Ok(())
            }
            other => Err(DeviceError::NotForeground {
                expected: package.clone(),
                actual: other.unwrap_or_else(|| "none".into()),
            }),
        }
    }

    /// Running phase. Returns the terminal outcome.
    fn drive<D, O>(
        &mut self,
        device: &mut D,
        session: &mut SessionState,
        ctx: &RunContext,
        observer: &mut O,
    ) -> RunOutcome
    where
        D: Device,
        O: RoundObserver + ?Sized,
    {
        loop {
            if self.cancel.is_cancelled() {
                return RunOutcome::Interrupted;
            }

            session.rounds += 1;
            observer.before_round();

            let mut extraction = match extract_round(
                device,
                &self.strategy,
                &self.config.fields,
                &mut session.ledger,
            ) {
                Ok(extraction) => extraction,
                Err(e) => return self.fail_or_interrupt(FailurePhase::Extract, e),
            };

            observer.after_round(&extraction.records);

            let admitted = std::mem::take(&mut extraction.records);
            let count = admitted.len();
            session.absorb_round(admitted);
            ctx.round(session, count, &extraction);

            if session.store.len() >= self.config.target {
                return RunOutcome::Completed;
            }
            if session.empty_streak >= self.config.max_empty_rounds {
                return RunOutcome::Stopped;
            }
            if self.cancel.is_cancelled() {
                return RunOutcome::Interrupted;
            }

            if let Err(e) = self.advance(device, session.rounds) {
                if e.is_fatal() {
                    return self.fail_or_interrupt(FailurePhase::Scroll, e);
                }
                warn!(error = %e, "scroll failed");
            }
            self.cancel.sleep(self.config.settle_delay);
        }
    }

    /// Device errors seen after cancellation end the run as interrupted;
    /// the same Ctrl-C may have reached the bridge.
    fn fail_or_interrupt(&self, phase: FailurePhase, error: DeviceError) -> RunOutcome {
        if self.cancel.is_cancelled() {
            warn!(error = %error, "device error after cancellation");
            return RunOutcome::Interrupted;
        }
        RunOutcome::Failed(RunFailure::new(phase, error))
    }

    fn advance<D: Device>(&mut self, device: &mut D, round: usize) -> Result<(), DeviceError> {
        let screen = device.screen_size()?;
        let gesture = self.scroll.gesture(screen, round);
        device.swipe(gesture.from, gesture.to, gesture.duration)
    }

    /// Shared by every terminal state: stats, report, persistence.
    fn finalize<S: RecordSink + ?Sized>(
        &self,
        outcome: RunOutcome,
        mut session: SessionState,
        ctx: RunContext,
        sink: &mut S,
    ) -> RunReport {
        session.transition(outcome.state());
        ctx.finish(&session, &outcome);

        let key_fields = session.ledger.key_fields().to_vec();
        let unique = session.ledger.seen_count();
        let rounds = session.rounds;
        let records = session.store.into_records();

        let stats = RunStats::compute(
            outcome.clone(),
            self.config.fields.primary(),
            rounds,
            &records,
            unique,
            &key_fields,
            ctx.elapsed_ms(),
        );

        let (saved_to, persist_error) = match sink.persist(&records) {
            Ok(path) => (path, None),
            Err(e) => {
                tracing::error!(error = %e, "failed to save records");
                (None, Some(e.to_string()))
            }
        };

        RunReport {
            outcome,
            records,
            stats,
            saved_to,
            persist_error,
        }
    }
}
