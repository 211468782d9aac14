//! Error types for the demonstration store.

use demokit_format::{EncodingError, FormatError};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{Operation, StoreStateKind};

/// Errors that can occur while recording a demonstration.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Sanitizing the requested name left nothing to use as a file stem
    #[error("Demonstration name {raw:?} contains no ASCII letters or digits")]
    InvalidName { raw: String },

    /// Directory or file could not be created or written
    #[error("Storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation not allowed in the store's current lifecycle state
    #[error("Cannot {operation} a demonstration store that is {state}")]
    InvalidState {
        operation: Operation,
        state: StoreStateKind,
    },

    /// Record data does not fit the schema
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Recorder configuration is invalid or unreadable
    #[error("Invalid recorder configuration: {message}")]
    Config { message: String },
}

impl RecorderError {
    /// Attach the output path to a codec error.
    pub(crate) fn from_format(err: FormatError, path: &Path) -> Self {
        match err {
            FormatError::Io(source) => RecorderError::StorageUnavailable {
                path: path.to_path_buf(),
                source,
            },
            FormatError::Encoding(e) => RecorderError::Encoding(e),
            // Writers never decode; surface it as corrupt data at the path.
            FormatError::Decode(e) => RecorderError::StorageUnavailable {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
            },
        }
    }
}

/// Result type for recorder operations.
pub type RecorderResult<T> = Result<T, RecorderError>;
