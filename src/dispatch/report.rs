use crate::fetch::FetchError;

/// Downstream consumer of per-url results and the final total.
///
/// The dispatcher calls `completed`/`failed` as operations finish, in
/// completion order, and `total` exactly once after the drain. Implementations
/// run on the control-loop task and should not block.
pub trait ReportSink: Send + 'static {
    fn completed(&mut self, url: &str, score: u64);
    fn failed(&mut self, url: &str, error: &FetchError);
    fn total(&mut self, total: u64);
}

/// Prints results to stdout in the tool's line format.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReport;

impl ReportSink for ConsoleReport {
    fn completed(&mut self, url: &str, score: u64) {
        println!("{}", success_line(url, score));
    }

    fn failed(&mut self, _url: &str, error: &FetchError) {
        println!("{error}");
    }

    fn total(&mut self, total: u64) {
        println!("{}", total_line(total));
    }
}

pub(crate) fn success_line(url: &str, score: u64) -> String {
    format!("Count for {url}: {score}")
}

pub(crate) fn total_line(total: u64) -> String {
    format!("Total: {total}")
}
