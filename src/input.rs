//! Line-oriented input reading: feeds urls from an input stream into the
//! intake queue and reports drops.

use crate::dispatch::intake::IntakeQueue;
use crate::runtime::telemetry::Telemetry;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawns the task that feeds urls from `input` into the intake queue.
///
/// Lines are trimmed and blank lines skipped. A url rejected by the queue is
/// logged and counted as dropped; reading continues. The queue is always
/// closed when the task exits, whatever the exit path, so the dispatcher sees
/// end-of-input.
pub fn spawn_reader<I>(
    input: I,
    intake: Arc<IntakeQueue>,
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
) -> JoinHandle<Result<()>>
where
    I: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let result = read_lines(input, &intake, &telemetry, &shutdown).await;
        intake.close().await;
        result
    })
}

async fn read_lines<I>(
    input: I,
    intake: &IntakeQueue,
    telemetry: &Telemetry,
    shutdown: &CancellationToken,
) -> Result<()>
where
    I: AsyncRead + Send + Unpin + 'static,
{
    let mut lines = BufReader::new(input).lines();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("input reader stopping on shutdown signal");
                return Ok(());
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from input stream")? else {
                    tracing::debug!("input stream reached end-of-file");
                    return Ok(());
                };
                let url = line.trim();
                if url.is_empty() {
                    continue;
                }
                if !intake.offer(url.to_owned()).await {
                    telemetry.record_dropped();
                    tracing::warn!(url, "url buffer is over capacity; dropping");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context as TaskContext, Poll};
    use tokio::io::{AsyncWriteExt, ReadBuf};
    use tokio::time::{timeout, Duration};

    fn setup(capacity: usize) -> (Arc<IntakeQueue>, Arc<Telemetry>, CancellationToken) {
        (
            Arc::new(IntakeQueue::new(capacity)),
            Arc::new(Telemetry::default()),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn feeds_lines_in_order_and_skips_blanks() {
        let (intake, telemetry, shutdown) = setup(10);
        let input = Cursor::new(b"u1\nu2\n\n  \nu3\n".to_vec());

        let reader = spawn_reader(input, intake.clone(), telemetry.clone(), shutdown);
        reader
            .await
            .expect("reader should not panic")
            .expect("reader should not fail");

        assert_eq!(intake.pop().await.as_deref(), Some("u1"));
        assert_eq!(intake.pop().await.as_deref(), Some("u2"));
        assert_eq!(intake.pop().await.as_deref(), Some("u3"));
        assert_eq!(intake.pop().await, None);
        assert_eq!(telemetry.dropped(), 0);
    }

    #[tokio::test]
    async fn drops_beyond_capacity_and_keeps_reading() {
        let (intake, telemetry, shutdown) = setup(1);
        let input = Cursor::new(b"u1\nu2\nu3\nu4\n".to_vec());

        let reader = spawn_reader(input, intake.clone(), telemetry.clone(), shutdown);
        reader
            .await
            .expect("reader should not panic")
            .expect("reader should not fail");

        assert_eq!(telemetry.dropped(), 3);
        assert_eq!(intake.pop().await.as_deref(), Some("u1"));
        assert_eq!(intake.pop().await, None);
    }

    #[tokio::test]
    async fn stops_on_cancellation_and_closes_the_queue() {
        let (intake, telemetry, shutdown) = setup(10);
        let (read_half, mut write_half) = tokio::io::duplex(64);

        let reader = spawn_reader(read_half, intake.clone(), telemetry, shutdown.clone());

        write_half
            .write_all(b"u1\n")
            .await
            .expect("write should succeed");
        assert_eq!(intake.pop().await.as_deref(), Some("u1"));

        // The writer stays open; only cancellation can stop the reader.
        shutdown.cancel();
        timeout(Duration::from_millis(500), reader)
            .await
            .expect("reader should stop on cancellation")
            .expect("reader should not panic")
            .expect("cancellation is not an error");

        assert_eq!(intake.pop().await, None);
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("stream torn down")))
        }
    }

    #[tokio::test]
    async fn read_error_closes_the_queue_and_surfaces() {
        let (intake, telemetry, shutdown) = setup(10);

        let reader = spawn_reader(FailingReader, intake.clone(), telemetry, shutdown);
        let result = reader.await.expect("reader should not panic");

        assert!(result.is_err(), "read errors should surface");
        assert_eq!(intake.pop().await, None);
    }
}
