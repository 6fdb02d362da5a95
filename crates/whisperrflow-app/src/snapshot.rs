//! Persistence of [`TaskState`] snapshots.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use whisperrflow_core::TaskState;

/// Schema tag written into every snapshot file.
pub const SNAPSHOT_SCHEMA: &str = "whisperrflow-state@1";

/// Errors that can occur while loading or saving snapshots.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// I/O operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid snapshot JSON.
    #[error("Failed to decode snapshot {path}: {source}")]
    Json {
        /// File being decoded.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The file was written by an unknown format version.
    #[error("Unsupported snapshot schema: {0}")]
    UnsupportedSchema(String),
}

/// Backend that can load and persist the whole [`TaskState`].
pub trait StateStore {
    /// Load the last saved state, or `None` when nothing was saved yet.
    ///
    /// # Errors
    /// Returns an error when a saved state exists but cannot be read.
    fn load(&self) -> Result<Option<TaskState>, SnapshotError>;

    /// Replace the saved state.
    ///
    /// # Errors
    /// Returns an error when the state cannot be written.
    fn save(&self, state: &TaskState) -> Result<(), SnapshotError>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    schema: &'static str,
    state: &'a TaskState,
}

#[derive(Deserialize)]
struct Envelope {
    schema: String,
    state: TaskState,
}

/// Stores the state as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`. Nothing is touched until the first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<TaskState>, SnapshotError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot yet");
                return Ok(None);
            }
            Err(err) => return Err(self.io_error(err)),
        };
        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Json {
                path: self.path.clone(),
                source,
            })?;
        if envelope.schema != SNAPSHOT_SCHEMA {
            return Err(SnapshotError::UnsupportedSchema(envelope.schema));
        }
        debug!(
            path = %self.path.display(),
            tasks = envelope.state.tasks.len(),
            "loaded snapshot"
        );
        Ok(Some(envelope.state))
    }

    fn save(&self, state: &TaskState) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let envelope = EnvelopeRef {
            schema: SNAPSHOT_SCHEMA,
            state,
        };
        let mut json =
            serde_json::to_vec_pretty(&envelope).map_err(|source| SnapshotError::Json {
                path: self.path.clone(),
                source,
            })?;
        json.push(b'\n');

        let temp = self.temp_path();
        fs::write(&temp, &json).map_err(|err| self.io_error(err))?;
        fs::rename(&temp, &self.path).map_err(|err| self.io_error(err))?;
        debug!(
            path = %self.path.display(),
            tasks = state.tasks.len(),
            "saved snapshot"
        );
        Ok(())
    }
}

/// In-memory store, used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<TaskState>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `state`.
    #[must_use]
    pub const fn with_state(state: TaskState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Copy of the last saved state.
    #[must_use]
    pub fn snapshot(&self) -> Option<TaskState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<TaskState>, SnapshotError> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &TaskState) -> Result<(), SnapshotError> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}
