//! Poll loop.
//!
//! The [`Poller`] owns the engine, so snapshots are reconciled strictly one at
//! a time and in delivery order. Effects are handed to the runner, which
//! spawns them and returns immediately.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use locwatch_protocol::StatusIndicator;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{Effect, ReconciliationEngine};
use crate::runner::EffectRunner;
use crate::sources::StatusSource;
use crate::view::ViewContext;
use crate::workspace::status_indicator;

/// What the presentation layer renders after each tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationStatus {
    pub indicator: Option<StatusIndicator>,
    pub busy: bool,
    /// True until every location has a loaded detail.
    pub loading: bool,
    pub ticks: u64,
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub poll_succeeded: bool,
    pub first_observation: bool,
    pub effects: usize,
}

pub struct Poller {
    source: Arc<dyn StatusSource>,
    engine: ReconciliationEngine,
    runner: EffectRunner,
    interval: Duration,
    ticks: u64,
    status_tx: watch::Sender<PresentationStatus>,
    pending: Vec<JoinHandle<()>>,
}

impl Poller {
    pub fn new(
        source: Arc<dyn StatusSource>,
        runner: EffectRunner,
        view: Arc<dyn ViewContext>,
        interval: Duration,
    ) -> Self {
        let (status_tx, _) = watch::channel(PresentationStatus::default());
        Self {
            source,
            engine: ReconciliationEngine::new(view),
            runner,
            interval,
            ticks: 0,
            status_tx,
            pending: Vec::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PresentationStatus> {
        self.status_tx.subscribe()
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    pub fn runner(&self) -> &EffectRunner {
        &self.runner
    }

    /// Current presentation status computed from engine and workspace state.
    pub fn status(&self) -> PresentationStatus {
        let workspace = self.runner.workspace();
        PresentationStatus {
            indicator: status_indicator(self.engine.busy(), workspace),
            busy: self.engine.busy(),
            loading: workspace.loading(),
            ticks: self.ticks,
        }
    }

    /// Poll once, reconcile, and dispatch the resulting effects.
    ///
    /// On the first successful poll the full workspace is loaded in the
    /// background; the engine itself schedules no refetch for it.
    pub async fn tick(&mut self) -> PollReport {
        self.ticks += 1;
        self.pending.retain(|handle| !handle.is_finished());
        let first_observation = self.engine.is_first_observation();
        let poll = self.source.poll_status().await;

        let mut report = PollReport {
            poll_succeeded: poll.is_ok(),
            first_observation,
            effects: 0,
        };

        if let Ok(snapshot) = &poll {
            self.runner.workspace().track(snapshot);
            if first_observation {
                let runner = self.runner.clone();
                let snapshot = snapshot.clone();
                self.pending.push(tokio::spawn(async move {
                    runner.load_workspace(&snapshot).await;
                }));
            }
        }

        let effects: Vec<Effect> = self.engine.on_poll(poll);
        report.effects = effects.len();
        self.pending.extend(self.runner.dispatch(effects));

        self.status_tx.send_replace(self.status());
        report
    }

    /// Wait for every load and effect spawned by earlier ticks, then
    /// republish the presentation status.
    pub async fn settle(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for result in join_all(pending).await {
            if let Err(e) = result {
                warn!(event = "core.poller.task_failed", error = %e);
            }
        }
        self.status_tx.send_replace(self.status());
    }

    /// Tick on the configured interval until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            event = "core.poller.run_started",
            interval_ms = self.interval.as_millis() as u64,
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(event = "core.poller.shutdown_requested");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.tick().await;
                    debug!(
                        event = "core.poller.tick_completed",
                        tick = self.ticks,
                        poll_succeeded = report.poll_succeeded,
                        effects = report.effects,
                    );
                }
            }
        }

        info!(event = "core.poller.run_completed", ticks = self.ticks);
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl-C), then cancel `token`.
pub async fn wait_for_shutdown_signal(token: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {
                        info!(event = "core.poller.signal_received", signal = "SIGINT");
                    }
                    _ = sigterm.recv() => {
                        info!(event = "core.poller.signal_received", signal = "SIGTERM");
                    }
                }
            }
            Err(e) => {
                warn!(
                    event = "core.poller.sigterm_register_failed",
                    error = %e,
                );
                ctrl_c.await.ok();
                info!(event = "core.poller.signal_received", signal = "SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!(event = "core.poller.signal_received", signal = "SIGINT");
    }

    token.cancel();
}
