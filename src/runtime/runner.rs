use crate::dispatch::pipeline::{TallyPipeline, TallySummary};
use crate::dispatch::report::ReportSink;
use crate::fetch::{FetchClient, Scorer};
use crate::runtime::config::TallyConfig;
use anyhow::Result;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Coordinates the pipeline lifecycle and forwards a single interrupt
/// (Ctrl-C/SIGINT) into the dispatcher's drain path.
///
/// The signal listener is armed once and never re-armed; a second interrupt
/// while the drain is in progress lands on an already-cancelled token and has
/// no further effect.
pub struct Runner<R: ReportSink> {
    pipeline: TallyPipeline<R>,
    shutdown: CancellationToken,
}

impl<R: ReportSink> Runner<R> {
    /// Creates a runner and wires a root [`CancellationToken`] through the
    /// pipeline (reader, dispatcher, metrics reporter).
    pub fn new(
        config: TallyConfig,
        client: Arc<dyn FetchClient>,
        scorer: Arc<dyn Scorer>,
        sink: R,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let pipeline =
            TallyPipeline::with_cancellation_token(config, client, scorer, sink, shutdown.clone());
        Self { pipeline, shutdown }
    }

    /// Returns a clone of the root shutdown token so external callers can
    /// integrate their own signal handling or cancel programmatically.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the pipeline over `input` until it completes or an interrupt
    /// triggers the drain. Returns the summary either way; interruption is
    /// not an error.
    pub async fn run_until_ctrl_c<I>(self, input: I) -> Result<TallySummary>
    where
        I: AsyncRead + Send + Unpin + 'static,
    {
        let shutdown = self.shutdown.clone();
        let signal_task = tokio::spawn(async move {
            select_interrupt(&shutdown).await;
        });

        let summary = self.pipeline.run(input).await;

        // Input may simply have run out; release the listener either way.
        self.shutdown.cancel();
        if let Err(err) = signal_task.await {
            tracing::warn!(error = %err, "signal listener task panicked");
        }

        summary
    }
}

async fn select_interrupt(shutdown: &CancellationToken) {
    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => {
                    tracing::info!("interrupt received; draining in-flight fetches");
                    shutdown.cancel();
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to listen for interrupt signal");
                }
            }
        }
        _ = shutdown.cancelled() => {}
    }
}
