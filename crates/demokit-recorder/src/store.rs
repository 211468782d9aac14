//! The demonstration store: one output file and its recording lifecycle.
//!
//! ```text
//! Uninitialized --initialize--> Recording --record*--> Recording --close--> Closed
//!                                    |
//!                                    +--failed step write--> Failed
//! ```
//!
//! Every operation checks the current state and rejects illegal transitions
//! with [`RecorderError::InvalidState`]. A step write that fails at the I/O
//! level may leave a partial record in the stream, so the store drops the
//! handle and refuses further steps and the summary.

use demokit_format::{
    sanitize, AgentInfo, BrainParameters, DemonstrationHeader, DemonstrationSummary,
    DemonstrationWriter, FormatError, SummaryBuilder,
};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{DemoStorage, RecorderConfig, RecorderError, RecorderResult, StorageHandle};

/// Store operations, as named in lifecycle errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    Record,
    Close,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Initialize => "initialize",
            Operation::Record => "record into",
            Operation::Close => "close",
        })
    }
}

/// Lifecycle state of a store, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStateKind {
    Uninitialized,
    Recording,
    Closed,
    /// A step write failed; the file ends without a summary
    Failed,
}

impl fmt::Display for StoreStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreStateKind::Uninitialized => "uninitialized",
            StoreStateKind::Recording => "recording",
            StoreStateKind::Closed => "closed",
            StoreStateKind::Failed => "failed",
        })
    }
}

struct ActiveRecording {
    path: PathBuf,
    writer: DemonstrationWriter<StorageHandle>,
    stats: SummaryBuilder,
}

struct ClosedRecording {
    path: PathBuf,
    summary: DemonstrationSummary,
}

enum StoreState {
    Uninitialized,
    Recording(ActiveRecording),
    Closed(ClosedRecording),
    Failed(ClosedRecording),
}

impl StoreState {
    fn kind(&self) -> StoreStateKind {
        match self {
            StoreState::Uninitialized => StoreStateKind::Uninitialized,
            StoreState::Recording(_) => StoreStateKind::Recording,
            StoreState::Closed(_) => StoreStateKind::Closed,
            StoreState::Failed(_) => StoreStateKind::Failed,
        }
    }
}

/// Records one demonstration file through an injected [`DemoStorage`].
pub struct DemonstrationStore<S> {
    storage: S,
    config: RecorderConfig,
    state: StoreState,
}

impl<S: DemoStorage> DemonstrationStore<S> {
    /// Create an uninitialized store.
    pub fn new(storage: S, config: RecorderConfig) -> Self {
        Self {
            storage,
            config,
            state: StoreState::Uninitialized,
        }
    }

    /// Open `<directory>/<sanitized name>.<extension>` and write the header.
    ///
    /// On failure the store stays uninitialized, so the caller may retry with
    /// a corrected name or configuration.
    pub fn initialize(
        &mut self,
        name: &str,
        brain_parameters: BrainParameters,
        brain_name: &str,
    ) -> RecorderResult<PathBuf> {
        if !matches!(self.state, StoreState::Uninitialized) {
            return Err(RecorderError::InvalidState {
                operation: Operation::Initialize,
                state: self.state.kind(),
            });
        }
        self.config.validate()?;

        let stem = sanitize(name, self.config.max_name_length);
        if stem.is_empty() {
            return Err(RecorderError::InvalidName {
                raw: name.to_string(),
            });
        }
        brain_parameters.validate()?;

        let dir = self.config.output_directory();
        if !self.storage.directory_exists(&dir) {
            debug!(path = %dir.display(), "creating demonstration directory");
            self.storage
                .create_directory(&dir)
                .map_err(|source| RecorderError::StorageUnavailable {
                    path: dir.clone(),
                    source,
                })?;
        }

        let path = self.config.file_path(&stem);
        if self.storage.file_exists(&path) {
            warn!(path = %path.display(), "overwriting existing demonstration");
        }
        let handle = self
            .storage
            .create_file(&path)
            .map_err(|source| RecorderError::StorageUnavailable {
                path: path.clone(),
                source,
            })?;

        let header = DemonstrationHeader::new(stem, brain_name, brain_parameters);
        let writer = DemonstrationWriter::new(handle, &header)
            .map_err(|e| RecorderError::from_format(e, &path))?;

        info!(
            path = %path.display(),
            brain = brain_name,
            session = %header.session_id,
            "started demonstration recording"
        );
        self.state = StoreState::Recording(ActiveRecording {
            path: path.clone(),
            writer,
            stats: SummaryBuilder::new(),
        });
        Ok(path)
    }

    /// Append one step and fold it into the running aggregates.
    ///
    /// An I/O failure moves the store to [`StoreStateKind::Failed`] and
    /// releases the handle. An encoding failure writes nothing and leaves the
    /// store recording.
    pub fn record(&mut self, info: &AgentInfo) -> RecorderResult<()> {
        let active = match &mut self.state {
            StoreState::Recording(active) => active,
            other => {
                return Err(RecorderError::InvalidState {
                    operation: Operation::Record,
                    state: other.kind(),
                })
            }
        };

        match active.writer.append_step(info) {
            Ok(()) => {}
            Err(FormatError::Io(source)) => {
                let path = active.path.clone();
                let summary = active.stats.current();
                warn!(
                    path = %path.display(),
                    steps = summary.number_steps,
                    error = %source,
                    "step write failed; demonstration left without a summary"
                );
                // Dropping the recording releases the handle.
                self.state = StoreState::Failed(ClosedRecording {
                    path: path.clone(),
                    summary,
                });
                return Err(RecorderError::StorageUnavailable { path, source });
            }
            Err(e) => return Err(RecorderError::from_format(e, &active.path)),
        }
        active.stats.observe(info);

        debug!(
            step = active.writer.steps_written(),
            agent = info.id,
            reward = info.reward,
            done = info.done,
            "recorded demonstration step"
        );
        Ok(())
    }

    /// Write the summary trailer and release the storage handle.
    ///
    /// The store is closed and the handle dropped even when writing the
    /// trailer fails; the failure is still returned.
    pub fn close(&mut self) -> RecorderResult<DemonstrationSummary> {
        let active = match std::mem::replace(&mut self.state, StoreState::Uninitialized) {
            StoreState::Recording(active) => active,
            previous => {
                let state = previous.kind();
                self.state = previous;
                return Err(RecorderError::InvalidState {
                    operation: Operation::Close,
                    state,
                });
            }
        };

        let ActiveRecording {
            path,
            writer,
            stats,
        } = active;
        let summary = stats.current();
        self.state = StoreState::Closed(ClosedRecording {
            path: path.clone(),
            summary,
        });

        match writer.finish(&summary) {
            Ok(handle) => {
                drop(handle);
                info!(
                    path = %path.display(),
                    steps = summary.number_steps,
                    episodes = summary.number_episodes,
                    cumulative_reward = summary.cumulative_reward,
                    "closed demonstration"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write demonstration summary");
                Err(RecorderError::from_format(e, &path))
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StoreStateKind {
        self.state.kind()
    }

    /// Whether steps can currently be recorded.
    pub fn is_recording(&self) -> bool {
        matches!(self.state, StoreState::Recording(_))
    }

    /// Output file path, once initialized.
    pub fn path(&self) -> Option<&Path> {
        match &self.state {
            StoreState::Uninitialized => None,
            StoreState::Recording(active) => Some(&active.path),
            StoreState::Closed(closed) | StoreState::Failed(closed) => Some(&closed.path),
        }
    }

    /// Running aggregates while recording, final ones after close. After a
    /// failed step write, the aggregates of the steps written before it.
    pub fn summary(&self) -> Option<DemonstrationSummary> {
        match &self.state {
            StoreState::Uninitialized => None,
            StoreState::Recording(active) => Some(active.stats.current()),
            StoreState::Closed(closed) | StoreState::Failed(closed) => Some(closed.summary),
        }
    }

    /// Configuration the store was created with.
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// The injected storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S> Drop for DemonstrationStore<S> {
    fn drop(&mut self) {
        if let StoreState::Recording(active) = &self.state {
            warn!(
                path = %active.path.display(),
                steps = active.writer.steps_written(),
                "demonstration store dropped while recording; file has no summary"
            );
        }
    }
}

impl<S> fmt::Debug for DemonstrationStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemonstrationStore")
            .field("config", &self.config)
            .field("state", &self.state.kind())
            .finish()
    }
}
