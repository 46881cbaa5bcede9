//! The control loop at the center of the pipeline.
//!
//! One task owns the running total, the in-flight accounting decisions, and
//! the termination state; everything else talks to it through the intake
//! queue, the completion channel, or the shutdown token. Fetch+score work runs
//! on spawned tasks, up to the slot ceiling at a time.

use super::intake::IntakeQueue;
use super::pipeline::TallySummary;
use super::report::ReportSink;
use super::slots::SlotPool;
use crate::fetch::{FetchClient, FetchError, Scorer};
use crate::runtime::config::ShutdownMode;
use crate::runtime::telemetry::Telemetry;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outcome of one fetch+score operation, delivered back to the control loop.
struct Completion {
    url: String,
    outcome: Result<u64, FetchError>,
}

/// Lifecycle of the control loop. `Running` accepts new work; `Draining` lets
/// in-flight operations finish without dispatching more; the total is emitted
/// exactly once on the transition to `Reported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerminationState {
    Running,
    Draining(DrainReason),
    Reported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainReason {
    InputExhausted,
    Interrupt,
}

impl TerminationState {
    fn is_running(self) -> bool {
        matches!(self, TerminationState::Running)
    }
}

pub struct DispatcherParams {
    pub intake: Arc<IntakeQueue>,
    pub slots: Arc<SlotPool>,
    pub client: Arc<dyn FetchClient>,
    pub scorer: Arc<dyn Scorer>,
    pub telemetry: Arc<Telemetry>,
    pub shutdown: CancellationToken,
    pub mode: ShutdownMode,
}

pub struct Dispatcher<R: ReportSink> {
    intake: Arc<IntakeQueue>,
    slots: Arc<SlotPool>,
    client: Arc<dyn FetchClient>,
    scorer: Arc<dyn Scorer>,
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
    mode: ShutdownMode,
    sink: R,
}

impl<R: ReportSink> Dispatcher<R> {
    pub fn new(params: DispatcherParams, sink: R) -> Self {
        let DispatcherParams {
            intake,
            slots,
            client,
            scorer,
            telemetry,
            shutdown,
            mode,
        } = params;
        Self {
            intake,
            slots,
            client,
            scorer,
            telemetry,
            shutdown,
            mode,
            sink,
        }
    }

    /// Runs the control loop until the drain completes and the total has been
    /// reported through the sink.
    ///
    /// Selects over three event classes: a queued url while a slot is free, a
    /// completion from a fetch task, and the shutdown token. End-of-input
    /// (the intake queue closed and drained) and an interrupt both move the
    /// loop to `Draining`; the final report waits for every operation that was
    /// dispatched before the drain began, except under
    /// [`ShutdownMode::ImmediateAbort`].
    pub async fn run(mut self) -> TallySummary {
        let (completion_tx, mut completion_rx) =
            mpsc::channel::<Completion>(self.slots.capacity());
        let intake = self.intake.clone();
        let shutdown = self.shutdown.clone();
        let mut total: u64 = 0;
        let mut completed: u64 = 0;
        let mut failed: u64 = 0;
        let mut discarded: usize = 0;
        let mut state = TerminationState::Running;

        loop {
            if let TerminationState::Draining(reason) = state {
                if self.slots.in_flight() == 0 {
                    tracing::debug!(?reason, "drain complete");
                    break;
                }
            }

            tokio::select! {
                item = intake.pop(), if state.is_running() && self.slots.has_capacity() => {
                    match item {
                        Some(url) => {
                            // The slot is claimed before the task exists so
                            // the in-flight ceiling holds even while
                            // completions lag behind dispatch.
                            let acquired = self.slots.try_acquire();
                            debug_assert!(acquired, "guard checked for a free slot");
                            self.launch(url, completion_tx.clone());
                        }
                        None => {
                            tracing::debug!(
                                in_flight = self.slots.in_flight(),
                                "input exhausted; draining in-flight fetches"
                            );
                            state = TerminationState::Draining(DrainReason::InputExhausted);
                        }
                    }
                }
                Some(done) = completion_rx.recv(), if self.slots.in_flight() > 0 => {
                    match done.outcome {
                        Ok(score) => {
                            total += score;
                            completed += 1;
                            self.telemetry.record_completed();
                            self.sink.completed(&done.url, score);
                        }
                        Err(error) => {
                            failed += 1;
                            self.telemetry.record_failed();
                            tracing::debug!(url = %done.url, error = %error, "fetch failed");
                            self.sink.failed(&done.url, &error);
                        }
                    }
                    self.slots.release();
                }
                _ = shutdown.cancelled(), if state.is_running() => {
                    discarded = intake.clear().await;
                    if discarded > 0 {
                        tracing::info!(discarded, "interrupt received; discarding queued urls");
                    }
                    state = TerminationState::Draining(DrainReason::Interrupt);
                    if self.mode == ShutdownMode::ImmediateAbort {
                        tracing::warn!(
                            in_flight = self.slots.in_flight(),
                            "abandoning in-flight fetches"
                        );
                        break;
                    }
                }
            }
        }

        self.sink.total(total);
        state = TerminationState::Reported;
        tracing::debug!(?state, total, completed, failed, discarded, "final total reported");

        TallySummary {
            total,
            completed,
            failed,
            discarded,
        }
    }

    fn launch(&self, url: String, completions: mpsc::Sender<Completion>) {
        let client = Arc::clone(&self.client);
        let scorer = Arc::clone(&self.scorer);
        tokio::spawn(async move {
            let outcome = match client.fetch(&url).await {
                Ok(body) => Ok(scorer.score(&body)),
                Err(error) => Err(error),
            };
            // The receiver is gone after an immediate abort; a late result
            // has nowhere to land and is dropped.
            let _ = completions.send(Completion { url, outcome }).await;
        });
    }
}
