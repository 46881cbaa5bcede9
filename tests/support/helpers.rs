use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use urltally::{FetchError, ReportSink};

/// Report sink that records every line for later assertions. Clones share
/// the same backing storage.
#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
    totals_reported: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("lines lock poisoned").clone()
    }

    pub fn totals_reported(&self) -> usize {
        self.totals_reported.load(Ordering::SeqCst)
    }

    fn push(&self, line: String) {
        self.lines.lock().expect("lines lock poisoned").push(line);
    }
}

impl ReportSink for RecordingSink {
    fn completed(&mut self, url: &str, score: u64) {
        self.push(format!("Count for {url}: {score}"));
    }

    fn failed(&mut self, _url: &str, error: &FetchError) {
        self.push(error.to_string());
    }

    fn total(&mut self, total: u64) {
        self.totals_reported.fetch_add(1, Ordering::SeqCst);
        self.push(format!("Total: {total}"));
    }
}

/// Polls `what` until it holds, panicking after a few seconds.
pub async fn wait_until(what: impl Fn() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !what() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
