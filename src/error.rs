use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IncidentError {
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Transition rejected: {0}")]
    TransitionRejected(String),

    #[error("Incident not found: {0}")]
    NotFound(String),

    #[error("Storage error at {}: {}", .path.display(), .message)]
    Storage { path: PathBuf, message: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by callers that only care about how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationFailed,
    TransitionRejected,
    NotFound,
    StorageFailure,
    MalformedInput,
    Config,
}

impl IncidentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IncidentError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            IncidentError::TransitionRejected(_) => ErrorKind::TransitionRejected,
            IncidentError::NotFound(_) => ErrorKind::NotFound,
            IncidentError::Storage { .. } | IncidentError::Io(_) | IncidentError::Json(_) => {
                ErrorKind::StorageFailure
            }
            IncidentError::MalformedInput(_) => ErrorKind::MalformedInput,
            IncidentError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        IncidentError::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<csv::Error> for IncidentError {
    fn from(err: csv::Error) -> Self {
        IncidentError::MalformedInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IncidentError>;
