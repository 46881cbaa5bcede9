//! Dispatch core: the intake queue, the worker-slot pool, the control loop,
//! and the pipeline orchestration around them.

pub mod dispatcher;
pub mod intake;
pub mod pipeline;
pub mod report;
pub mod slots;

pub use dispatcher::{Dispatcher, DispatcherParams};
pub use intake::IntakeQueue;
pub use pipeline::{TallyPipeline, TallySummary};
pub use report::{ConsoleReport, ReportSink};
pub use slots::SlotPool;
