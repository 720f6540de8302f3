//! Storage medium abstraction.
//!
//! The record store persists its entire contents as a single serialized
//! payload under one storage location. [`StorageBackend`] keeps that medium
//! swappable: a JSON file on disk for the CLI, an in-memory slot for tests.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A durable slot holding one serialized payload.
///
/// `load` returning `None` means the slot has never been written; callers
/// treat that the same as an empty store.
pub trait StorageBackend: Send + Sync {
    /// Read the current payload, if any.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the payload. Must be atomic: a concurrent or subsequent
    /// `load` observes either the previous payload or the new one in full,
    /// never a partial write.
    fn save(&self, payload: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// File Backend
// ─────────────────────────────────────────────────────────────────────────────

/// File-backed storage: one JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend writing to the given path.
    ///
    /// Parent directories are created on first save, not here.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this backend persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash mid-write leaves the old payload intact.
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Backend
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    payload: Mutex<Option<String>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with a payload.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Mutex::new(Some(payload.into())),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.payload.lock().clone())
    }

    fn save(&self, payload: &str) -> Result<()> {
        *self.payload.lock() = Some(payload.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
