use crate::runtime::telemetry;
use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENT: usize = 4;
pub const DEFAULT_BUFFER_SIZE: usize = 100;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// How the dispatcher treats work still in flight when an interrupt arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownMode {
    /// Let every dispatched fetch finish and contribute before reporting.
    #[default]
    GracefulDrain,
    /// Report immediately with whatever has completed so far. In-flight
    /// fetches are abandoned, not cancelled; their results are discarded.
    ImmediateAbort,
}

/// Runtime configuration for the tally pipeline.
///
/// Construct via [`TallyConfig::builder`] so invariants are validated before
/// any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyConfig {
    max_concurrent: usize,
    buffer_size: usize,
    fetch_timeout: Duration,
    metrics_interval: Duration,
    shutdown_mode: ShutdownMode,
}

impl TallyConfig {
    /// Returns a builder to incrementally construct and validate a
    /// configuration.
    pub fn builder() -> TallyConfigBuilder {
        TallyConfigBuilder::default()
    }

    /// Ceiling on simultaneously in-flight fetches.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Capacity of the intake buffer; urls offered beyond it are dropped.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Per-request timeout applied to the HTTP client.
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Interval used by the metrics reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    pub fn shutdown_mode(&self) -> ShutdownMode {
        self.shutdown_mode
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            bail!("max_concurrent must be greater than 0");
        }
        if self.buffer_size == 0 {
            bail!("buffer_size must be greater than 0");
        }
        if self.fetch_timeout.is_zero() {
            bail!("fetch_timeout must be greater than 0");
        }
        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }
        Ok(())
    }
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            metrics_interval: telemetry::DEFAULT_METRICS_INTERVAL,
            shutdown_mode: ShutdownMode::GracefulDrain,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TallyConfigBuilder {
    max_concurrent: Option<usize>,
    buffer_size: Option<usize>,
    fetch_timeout: Option<Duration>,
    metrics_interval: Option<Duration>,
    shutdown_mode: Option<ShutdownMode>,
}

impl TallyConfigBuilder {
    pub fn max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = Some(limit);
        self
    }

    pub fn buffer_size(mut self, capacity: usize) -> Self {
        self.buffer_size = Some(capacity);
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn shutdown_mode(mut self, mode: ShutdownMode) -> Self {
        self.shutdown_mode = Some(mode);
        self
    }

    pub fn build(self) -> Result<TallyConfig> {
        let defaults = TallyConfig::default();
        let config = TallyConfig {
            max_concurrent: self.max_concurrent.unwrap_or(defaults.max_concurrent),
            buffer_size: self.buffer_size.unwrap_or(defaults.buffer_size),
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            metrics_interval: self.metrics_interval.unwrap_or(defaults.metrics_interval),
            shutdown_mode: self.shutdown_mode.unwrap_or(defaults.shutdown_mode),
        };
        config.validate()?;
        Ok(config)
    }
}
