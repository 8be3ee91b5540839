//! Pipeline error types.
//!
//! [`PipelineError`] aborts a processing cycle. Everything else is a
//! recoverable [`ProcessingError`] collected into the cycle's result.

use std::fmt;

use aquawatch_core::CoreError;
use serde::Serialize;

/// Error that aborts the current cycle and is returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input batch does not have the expected shape.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An unexpected failure outside the recoverable categories.
    #[error("Internal pipeline error: {0}")]
    Internal(String),
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedInput(msg) => PipelineError::MalformedInput(msg),
            other => PipelineError::Internal(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Recoverable errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A draft was malformed and dropped.
    Validation,
    /// A draft repeated a recent alert. Recorded for observability only.
    DuplicateSuppression,
    /// A custom stage failed; its input passed through unchanged.
    ProcessorStage,
    /// Saving the batch failed.
    Persistence,
    /// A single notification could not be delivered.
    Notification,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::DuplicateSuppression => "duplicate_suppression",
            ErrorKind::ProcessorStage => "processor_stage",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Notification => "notification",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable failure recorded during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingError {
    pub kind: ErrorKind,
    pub parameter: Option<String>,
    pub message: String,
}

impl ProcessingError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            parameter: None,
            message: message.into(),
        }
    }

    pub fn with_parameter(mut self, parameter: Option<String>) -> Self {
        self.parameter = parameter;
        self
    }
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(p) => write!(f, "[{}] {p}: {}", self.kind, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}
