use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheReadError;

pub const MATCHDAY_SLOT: &str = "epl_matchday_predictions";
pub const CUSTOM_SLOT: &str = "epl_custom_prediction";

const CACHE_DIR: &str = "epl_predictor";

/// Key-value persistence for opaque string blobs. Each `set` replaces the slot whole.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per slot under a cache directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read slot {key}")),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).context("create cache dir")?;
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("write slot {key}"))?;
        fs::rename(&tmp, &path).with_context(|| format!("swap slot {key}"))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("remove slot {key}")),
        }
    }
}

/// In-process store. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.lock().ok()?.get(key).cloned()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        slots.remove(key);
        Ok(())
    }
}

pub(crate) fn read_slot<T: DeserializeOwned>(
    store: &impl KvStore,
    key: &'static str,
) -> Result<Option<T>, CacheReadError> {
    let raw = store
        .get(key)
        .map_err(|err| CacheReadError::Io {
            key,
            message: format!("{err:#}"),
        })?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    serde_json::from_str::<T>(&raw)
        .map(Some)
        .map_err(|source| CacheReadError::Corrupt { key, source })
}

pub(crate) fn write_slot<T: Serialize>(store: &impl KvStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).with_context(|| format!("serialize slot {key}"))?;
    store.set(key, &json)
}

/// Drops both prediction slots. Irreversible; callers confirm with the user first.
///
/// Both removals are attempted; the first failure is returned.
pub fn clear_prediction_slots(store: &impl KvStore) -> Result<()> {
    let matchday = store.remove(MATCHDAY_SLOT);
    let custom = store.remove(CUSTOM_SLOT);
    matchday.and(custom)?;
    tracing::info!("cleared matchday and custom prediction slots");
    Ok(())
}

pub fn default_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}
