use super::dispatcher::{Dispatcher, DispatcherParams};
use super::intake::IntakeQueue;
use super::report::ReportSink;
use super::slots::SlotPool;
use crate::fetch::{FetchClient, Scorer};
use crate::input;
use crate::runtime::config::TallyConfig;
use crate::runtime::telemetry::{self, Telemetry};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Summary of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallySummary {
    /// Sum of the scores of every fetch that completed successfully.
    pub total: u64,
    /// Number of fetches that completed successfully.
    pub completed: u64,
    /// Number of fetches that failed; each contributed zero.
    pub failed: u64,
    /// Urls that were queued but never dispatched because an interrupt
    /// arrived first.
    pub discarded: usize,
}

/// Wires the input reader, the intake queue, the slot pool, and the
/// dispatcher's control loop into one runnable pipeline.
pub struct TallyPipeline<R: ReportSink> {
    config: TallyConfig,
    intake: Arc<IntakeQueue>,
    slots: Arc<SlotPool>,
    telemetry: Arc<Telemetry>,
    client: Arc<dyn FetchClient>,
    scorer: Arc<dyn Scorer>,
    sink: R,
    shutdown_root: CancellationToken,
}

impl<R: ReportSink> TallyPipeline<R> {
    /// Creates a pipeline with its own root cancellation token. Use
    /// [`Self::with_cancellation_token`] to integrate with an existing
    /// shutdown mechanism.
    pub fn new(
        config: TallyConfig,
        client: Arc<dyn FetchClient>,
        scorer: Arc<dyn Scorer>,
        sink: R,
    ) -> Self {
        Self::with_cancellation_token(config, client, scorer, sink, CancellationToken::new())
    }

    pub fn with_cancellation_token(
        config: TallyConfig,
        client: Arc<dyn FetchClient>,
        scorer: Arc<dyn Scorer>,
        sink: R,
        shutdown_root: CancellationToken,
    ) -> Self {
        let intake = Arc::new(IntakeQueue::new(config.buffer_size()));
        let slots = Arc::new(SlotPool::new(config.max_concurrent()));
        Self {
            config,
            intake,
            slots,
            telemetry: Arc::new(Telemetry::default()),
            client,
            scorer,
            sink,
            shutdown_root,
        }
    }

    /// Returns a clone of the telemetry handle for observability.
    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// Runs the pipeline to completion over `input` and returns the final
    /// summary. The total has been reported through the sink exactly once by
    /// the time this returns, on every termination path.
    pub async fn run<I>(self, input: I) -> Result<TallySummary>
    where
        I: AsyncRead + Send + Unpin + 'static,
    {
        let run_token = self.shutdown_root.child_token();

        tracing::info!(
            max_concurrent = self.config.max_concurrent(),
            buffer_size = self.config.buffer_size(),
            "starting url tally pipeline"
        );

        let reader = input::spawn_reader(
            input,
            self.intake.clone(),
            self.telemetry.clone(),
            run_token.clone(),
        );
        let metrics = telemetry::spawn_metrics_reporter(
            self.telemetry.clone(),
            self.intake.clone(),
            self.slots.clone(),
            run_token.clone(),
            self.config.metrics_interval(),
        );

        let dispatcher = Dispatcher::new(
            DispatcherParams {
                intake: self.intake.clone(),
                slots: self.slots.clone(),
                client: self.client.clone(),
                scorer: self.scorer.clone(),
                telemetry: self.telemetry.clone(),
                shutdown: self.shutdown_root.clone(),
                mode: self.config.shutdown_mode(),
            },
            self.sink,
        );
        let summary = dispatcher.run().await;

        run_token.cancel();
        match reader.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "input reader terminated with error"),
            Err(err) => tracing::warn!(error = %err, "input reader task panicked"),
        }
        if let Err(err) = metrics.await {
            tracing::warn!(error = %err, "metrics reporter task panicked");
        }

        tracing::info!(
            total = summary.total,
            completed = summary.completed,
            failed = summary.failed,
            dropped = self.telemetry.dropped(),
            discarded = summary.discarded,
            "pipeline finished"
        );
        Ok(summary)
    }
}
