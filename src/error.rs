use std::io;
use thiserror::Error;

/// Error type for the syspulse engine
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),

    #[error("Process {0} not found")]
    ProcessNotFound(u32),

    #[error("Access denied to process {0}")]
    AccessDenied(u32),

    #[error("Termination failed: {0}")]
    Termination(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for syspulse
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonitorError::Config(msg.into())
    }

    /// Create a metric collection error
    pub fn collection<S: Into<String>>(msg: S) -> Self {
        MonitorError::MetricCollection(msg.into())
    }

    /// Create a runtime error
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        MonitorError::Runtime(msg.into())
    }

    /// True for errors that only affect a single read and should be retried next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, MonitorError::MetricCollection(_) | MonitorError::Io(_))
    }
}
