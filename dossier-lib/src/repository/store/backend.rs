//! The persistence port behind the profile store.
//!
//! A backend is a durable key-value substrate: get a text value by key, set
//! one atomically, and take a cheap fingerprint so watchers can detect
//! writes made by another process. The store owns serialization; backends
//! only ever see opaque text.

use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    io::Write,
    path::PathBuf,
    sync::Arc,
};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::repository::entities::Result;

/// Content digest of a stored value, used for cross-context change
/// detection. Two equal fingerprints mean the stored text is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(hasher.finalize().into())
    }
}

pub trait StorageBackend: Debug + Send + Sync {
    /// Fetch the stored text for `key`, or `None` if nothing was ever stored.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the stored text for `key`. Must be atomic at the key
    /// granularity: a concurrent reader sees either the old or the new
    /// value, never a torn write.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Move the current value of `key` out of the way so a fresh snapshot
    /// can be started without destroying the old data.
    fn quarantine(&self, key: &str) -> Result<()>;

    /// Fingerprint of the current value of `key`, or `None` if absent.
    fn fingerprint(&self, key: &str) -> Result<Option<Fingerprint>> {
        Ok(self.get(key)?.map(|text| Fingerprint::of(&text)))
    }
}

/// File-per-key backend rooted at a single directory.
///
/// Writes go through a temp file in the same directory followed by a
/// rename, which is the atomicity boundary the synchronization contract
/// relies on.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;
        file.write_all(value.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(self.path(key)).map_err(|err| err.error)?;

        Ok(())
    }

    fn quarantine(&self, key: &str) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let backup = self.dir.join(format!("{key}-{timestamp}.corrupt"));

        warn!(?backup, "quarantining unreadable stored data");
        fs::rename(self.path(key), backup)?;

        Ok(())
    }
}

/// Memory-backed substrate for tests. Cloning shares the underlying map, so
/// several store instances can observe each other's writes the way separate
/// processes share a file.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn quarantine(&self, key: &str) -> Result<()> {
        let mut values = self.values.write();
        if let Some(value) = values.remove(key) {
            values.insert(format!("{key}.corrupt"), value);
        }

        Ok(())
    }
}
