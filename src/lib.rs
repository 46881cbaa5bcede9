pub mod dispatch;
pub mod fetch;
pub mod input;
pub mod runtime;

pub use dispatch::dispatcher::{Dispatcher, DispatcherParams};
pub use dispatch::intake::IntakeQueue;
pub use dispatch::pipeline::{TallyPipeline, TallySummary};
pub use dispatch::report::{ConsoleReport, ReportSink};
pub use dispatch::slots::SlotPool;
pub use fetch::client::{FetchClient, FetchError, HttpFetchClient};
pub use fetch::score::{LinkScorer, Scorer, SubstringScorer};
pub use runtime::config::{ShutdownMode, TallyConfig, TallyConfigBuilder};
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
