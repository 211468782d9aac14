//! Filesystem capability used by the demonstration store.
//!
//! The store only ever needs four things from storage, so that is all the
//! trait exposes. [`OsStorage`] talks to the real filesystem;
//! [`MemoryStorage`] keeps everything in memory for tests.

use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A writable storage handle owned by one store.
pub type StorageHandle = Box<dyn Write + Send>;

/// Narrow filesystem interface injected into a demonstration store.
pub trait DemoStorage {
    /// Whether `path` exists and is a directory.
    fn directory_exists(&self, path: &Path) -> bool;

    /// Create `path` and any missing parents. Succeeds if it already exists.
    fn create_directory(&self, path: &Path) -> io::Result<()>;

    /// Whether `path` exists and is a file.
    fn file_exists(&self, path: &Path) -> bool;

    /// Create (or truncate) the file at `path` and open it for writing.
    fn create_file(&self, path: &Path) -> io::Result<StorageHandle>;
}

/// Storage backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsStorage;

impl DemoStorage for OsStorage {
    fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_file(&self, path: &Path) -> io::Result<StorageHandle> {
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    directories: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    open_handles: usize,
    read_only: bool,
    fail_writes: bool,
    write_budget: Option<usize>,
}

/// In-memory storage. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject directory and file creation with `PermissionDenied`.
    pub fn set_read_only(&self, read_only: bool) {
        self.state.lock().read_only = read_only;
    }

    /// Make every write through an open handle fail.
    pub fn set_fail_writes(&self, fail_writes: bool) {
        self.state.lock().fail_writes = fail_writes;
    }

    /// Accept only `budget` more bytes across all handles, then fail. A write
    /// that crosses the limit is accepted partially, leaving a torn record.
    pub fn set_write_budget(&self, budget: Option<usize>) {
        self.state.lock().write_budget = budget;
    }

    /// Bytes written to the file at `path`.
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).cloned()
    }

    /// Paths of every stored file.
    pub fn files(&self) -> Vec<PathBuf> {
        self.state.lock().files.keys().cloned().collect()
    }

    /// Handles returned by `create_file` that have not been dropped.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }
}

impl DemoStorage for MemoryStorage {
    fn directory_exists(&self, path: &Path) -> bool {
        self.state.lock().directories.contains(path)
    }

    fn create_directory(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.read_only {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage is read-only",
            ));
        }
        for dir in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            state.directories.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.state.lock().files.contains_key(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<StorageHandle> {
        let mut state = self.state.lock();
        if state.read_only {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage is read-only",
            ));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !state.directories.contains(parent) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("directory {} does not exist", parent.display()),
                ));
            }
        }

        state.files.insert(path.to_path_buf(), Vec::new());
        state.open_handles += 1;
        Ok(Box::new(MemoryFile {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
        }))
    }
}

/// Write handle into a [`MemoryStorage`] file. Unbuffered.
struct MemoryFile {
    state: Arc<Mutex<MemoryState>>,
    path: PathBuf,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated write failure"));
        }
        let accepted = match state.write_budget {
            Some(0) => {
                return Err(io::Error::new(io::ErrorKind::Other, "simulated disk full"));
            }
            Some(budget) => {
                let n = budget.min(buf.len());
                state.write_budget = Some(budget - n);
                n
            }
            None => buf.len(),
        };
        state
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.state.lock().fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated flush failure"));
        }
        Ok(())
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}
