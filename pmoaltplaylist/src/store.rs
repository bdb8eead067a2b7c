//! Durable key-value storage for pipeline state
//!
//! Values are opaque strings (JSON documents in practice). [`FileStore`]
//! keeps one `{key}.json` file per key in a directory; [`MemoryStore`] keeps
//! everything in memory and is used for ephemeral runs and tests.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Minimal durable store: read a value, overwrite a value
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, or None if absent
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Directory-backed store, one file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Opens a store in `directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        if !directory.exists() {
            fs::create_dir_all(&directory)?;
            info!("Created store directory: {}", directory.display());
        }

        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Format: `{directory}/{key}.json`
    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);

        if !path.exists() {
            debug!("Store file does not exist: {}", path.display());
            return Ok(None);
        }

        let value = fs::read_to_string(&path)?;
        debug!("Loaded {} bytes from {}", value.len(), path.display());
        Ok(Some(value))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        // Écriture atomique : fichier temporaire puis renommage
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!("Saved {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
