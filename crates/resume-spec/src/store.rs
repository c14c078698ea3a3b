//! Persistent key/value slot holding full snapshots of the wizard state.
//!
//! Every write replaces the whole value stored under a key, so there is no
//! partial-write recovery to do. Reads fail open: anything that cannot be
//! decoded is reported with a warning and treated as "no prior data".

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

/// Slot holding the serialized answer set.
pub const ANSWERS_KEY: &str = "proresAnswers";
/// Slot holding the peripheral styling settings.
pub const SETTINGS_KEY: &str = "proresSettings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("storage is read-only")]
    ReadOnly,
}

/// Minimal persistent key/value slot.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Snapshot encoding used for every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFormat {
    #[default]
    Json,
    Cbor,
}

impl StoreFormat {
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, StoreError> {
        match self {
            StoreFormat::Json => {
                serde_json::to_vec(value).map_err(|err| StoreError::Encode(err.to_string()))
            }
            StoreFormat::Cbor => {
                serde_cbor::to_vec(value).map_err(|err| StoreError::Encode(err.to_string()))
            }
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, String> {
        match self {
            StoreFormat::Json => serde_json::from_slice(bytes).map_err(|err| err.to_string()),
            StoreFormat::Cbor => serde_cbor::from_slice(bytes).map_err(|err| err.to_string()),
        }
    }
}

/// Loads the value under `key`, falling back to `T::default()` when the slot
/// is empty, unreadable or malformed.
pub fn load_or_default<T, S>(store: &S, format: StoreFormat, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!(key, error = %err, "could not read saved data; starting fresh");
            return T::default();
        }
    };
    match format.decode(&bytes) {
        Ok(value) => {
            debug!(key, bytes = bytes.len(), "loaded snapshot");
            value
        }
        Err(err) => {
            warn!(key, error = %err, "saved data is malformed; starting fresh");
            T::default()
        }
    }
}

/// Overwrites the slot under `key` with a full snapshot of `value`.
pub fn save<T, S>(store: &mut S, format: StoreFormat, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let bytes = format.encode(value)?;
    store.set(key, &bytes)?;
    debug!(key, bytes = bytes.len(), "saved snapshot");
    Ok(())
}

/// Directory-backed store: one file per key.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;
        let path = self.path_for(key);
        let staging = self.root.join(format!(".{key}.tmp"));
        fs::write(&staging, value).map_err(|source| StoreError::Io {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// In-memory store used by tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: BTreeMap<String, Vec<u8>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, for exercising persistence errors.
    pub fn read_only() -> Self {
        Self {
            slots: BTreeMap::new(),
            read_only: true,
        }
    }

    pub fn with_slot(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.slots.insert(key.to_string(), value.into());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&[u8]> {
        self.slots.get(key).map(Vec::as_slice)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.slots.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.slots.remove(key);
        Ok(())
    }
}
