//! Schedule corpus error types.

use crate::domain::{InvalidId, LineId, StopId};

/// Error converting a raw line file into a line record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// The file is not a line record
    #[error("malformed JSON: {0}")]
    Json(String),

    /// The line has no usable id
    #[error(transparent)]
    InvalidLineId(#[from] InvalidId),
}

impl From<serde_json::Error> for ConversionError {
    fn from(e: serde_json::Error) -> Self {
        ConversionError::Json(e.to_string())
    }
}

/// Errors that can occur when reading the schedule corpus.
///
/// `Clone` so that a single failed load can be shared by every caller
/// waiting on the same cache entry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    /// The corpus directory or a file in it could not be read
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// A schedule file is not a valid line record
    #[error("invalid schedule file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ConversionError,
    },

    /// No line calls at this stop
    #[error("stop not found: {0}")]
    StopNotFound(StopId),

    /// No line record has this id
    #[error("line not found: {0}")]
    LineNotFound(LineId),
}

impl ScheduleError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
