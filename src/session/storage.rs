//! Durable single-slot storage for the serialized principal. Only the session
//! store reads or writes the slot; everything else goes through the store.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session slot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A synchronous key-value slot holding one serialized principal.
pub trait SessionStorage: Send + Sync {
    /// Returns the raw slot contents, or `None` when the slot is empty.
    ///
    /// # Errors
    /// Returns an error if the slot exists but cannot be read.
    fn get(&self) -> Result<Option<String>, StorageError>;

    /// # Errors
    /// Returns an error if the slot cannot be written.
    fn set(&self, value: &str) -> Result<(), StorageError>;

    /// Empties the slot. Removing an empty slot succeeds.
    ///
    /// # Errors
    /// Returns an error if the slot exists but cannot be removed.
    fn remove(&self) -> Result<(), StorageError>;
}

/// Stores the slot as a file; writes go through a sibling temp file and a rename
/// so a crash never leaves a half-written session behind.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn set(&self, value: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let temp = self.temp_path();
        if let Err(err) = write_private(&temp, value).and_then(|()| fs::rename(&temp, &self.path)) {
            if let Err(cleanup) = fs::remove_file(&temp) {
                debug!("temp session file not removed: {cleanup}");
            }
            return Err(self.io_error(err));
        }

        debug!("session slot written: {}", self.path.display());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

// The slot holds a bearer token; the file is owner-only from the moment it exists.
#[cfg(unix)]
fn write_private(path: &Path, value: &str) -> io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // a leftover temp file keeps its old mode
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, value: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

/// In-memory slot, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(value.into())),
        }
    }

    /// Current slot contents.
    #[must_use]
    pub fn snapshot(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.snapshot())
    }

    fn set(&self, value: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

impl<T: SessionStorage + ?Sized> SessionStorage for std::sync::Arc<T> {
    fn get(&self) -> Result<Option<String>, StorageError> {
        (**self).get()
    }

    fn set(&self, value: &str) -> Result<(), StorageError> {
        (**self).set(value)
    }

    fn remove(&self) -> Result<(), StorageError> {
        (**self).remove()
    }
}
