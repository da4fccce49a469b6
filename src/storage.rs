//! Small string key-value persistence and the deployed-pools list kept in it.

use crate::error::StorageError;
use crate::pool::key::PoolKey;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Key under which the deployed pools list is stored.
pub const DEPLOYED_POOLS_KEY: &str = "uniswap-v4:deployed-pools";

/// String key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store; contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        // atomic replace
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

/// Store chosen from configuration: a [`FileStore`] when a path is set,
/// otherwise a [`MemoryStore`].
#[derive(Debug)]
pub enum ConfiguredStore {
    File(FileStore),
    Memory(MemoryStore),
}

impl ConfiguredStore {
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::File(FileStore::new(path)),
            None => Self::Memory(MemoryStore::new()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl KeyValueStore for ConfiguredStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::File(store) => store.get(key),
            Self::Memory(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        match self {
            Self::File(store) => store.set(key, value),
            Self::Memory(store) => store.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::File(store) => store.remove(key),
            Self::Memory(store) => store.remove(key),
        }
    }
}

/// Pools created by this client, stored as a JSON array of serialized
/// [`PoolKey`] strings under [`DEPLOYED_POOLS_KEY`].
#[derive(Debug)]
pub struct DeployedPools<S> {
    store: S,
}

impl<S: KeyValueStore> DeployedPools<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Raw entries in insertion order. Unreadable or corrupt content reads
    /// as an empty list.
    pub fn list(&self) -> Vec<String> {
        let raw = match self.store.get(DEPLOYED_POOLS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read deployed pools");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "deployed pools entry is corrupt, ignoring it");
                Vec::new()
            }
        }
    }

    /// Entries that parse as valid pool keys; the rest are skipped.
    pub fn pool_keys(&self) -> Vec<PoolKey> {
        self.list()
            .iter()
            .filter_map(|entry| match PoolKey::from_json(entry) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, entry = %entry, "skipping unparsable deployed pool");
                    None
                }
            })
            .collect()
    }

    /// Records `key`. Returns `false` when it was already present.
    pub fn add(&self, key: &PoolKey) -> Result<bool, StorageError> {
        let entry = serde_json::to_string(key)?;
        self.add_raw(entry)
    }

    /// Records a pre-serialized entry. Returns `false` when it was already
    /// present.
    pub fn add_raw(&self, entry: String) -> Result<bool, StorageError> {
        let mut entries = self.list();
        if entries.contains(&entry) {
            return Ok(false);
        }
        entries.push(entry);
        self.store
            .set(DEPLOYED_POOLS_KEY, serde_json::to_string(&entries)?)?;
        Ok(true)
    }

    pub fn contains(&self, key: &PoolKey) -> bool {
        self.pool_keys().contains(key)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(DEPLOYED_POOLS_KEY)
    }
}
