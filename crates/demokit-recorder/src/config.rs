//! Recorder configuration.

use demokit_format::{DEFAULT_MAX_NAME_LENGTH, FILE_EXTENSION};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{RecorderError, RecorderResult};

/// Directory under the project root that holds demonstrations by default.
pub const DEFAULT_DIRECTORY_NAME: &str = "Demonstrations";

/// Where and how demonstration files are named.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecorderConfig {
    /// Project root the output directory is relative to
    pub root: PathBuf,
    /// Output directory name under `root`
    pub directory_name: String,
    /// Maximum length of a sanitized file stem
    pub max_name_length: usize,
    /// File extension, without the dot
    pub extension: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            directory_name: DEFAULT_DIRECTORY_NAME.to_string(),
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            extension: FILE_EXTENSION.to_string(),
        }
    }
}

impl RecorderConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> RecorderResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| RecorderError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> RecorderResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| RecorderError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&json)
    }

    /// Reject configurations that cannot produce a usable file path.
    pub fn validate(&self) -> RecorderResult<()> {
        if self.max_name_length == 0 {
            return Err(RecorderError::Config {
                message: "max_name_length must be at least 1".to_string(),
            });
        }
        if self.directory_name.is_empty() {
            return Err(RecorderError::Config {
                message: "directory_name must not be empty".to_string(),
            });
        }
        if self.extension.is_empty() || self.extension.contains(['.', '/', '\\']) {
            return Err(RecorderError::Config {
                message: format!("invalid file extension {:?}", self.extension),
            });
        }
        Ok(())
    }

    /// Directory demonstrations are written into.
    pub fn output_directory(&self) -> PathBuf {
        self.root.join(&self.directory_name)
    }

    /// Full path of the demonstration with the given (sanitized) stem.
    pub fn file_path(&self, stem: &str) -> PathBuf {
        self.output_directory()
            .join(format!("{}.{}", stem, self.extension))
    }
}
