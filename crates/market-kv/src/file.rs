//! File-backed key-value store.
//!
//! Each key maps to one file in the store directory. File names are the
//! hex encoding of the key, so namespaced keys like `@GoMarketplace:cart`
//! stay portable across filesystems.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::{CacheError, KeyValueStore};

const VALUE_EXT: &str = "kv";
const TEMP_EXT: &str = "tmp";

/// Durable store that survives process restarts.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::io(dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    /// The directory holding the value files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str, ext: &str) -> Result<PathBuf, CacheError> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", encode_key(key), ext)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key, VALUE_EXT)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(path.display().to_string(), e)),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key, VALUE_EXT)?;
        let temp = self.path_for(key, TEMP_EXT)?;

        // Readers only ever see the old or the new file.
        fs::write(&temp, value)
            .await
            .map_err(|e| CacheError::io(temp.display().to_string(), e))?;
        fs::rename(&temp, &path)
            .await
            .map_err(|e| CacheError::io(path.display().to_string(), e))?;

        debug!(key, bytes = value.len(), "wrote value file");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key, VALUE_EXT)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(path.display().to_string(), e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.path_for(key, VALUE_EXT)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| CacheError::io(path.display().to_string(), e))
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let dir = self.dir.display().to_string();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| CacheError::io(dir.clone(), e))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io(dir.clone(), e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXT) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_key)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn encode_key(key: &str) -> String {
    key.bytes().map(|b| format!("{:02x}", b)).collect()
}

/// Inverse of `encode_key`. Names that are not hex pairs (stray files in the
/// directory) yield `None`.
fn decode_key(name: &str) -> Option<String> {
    let hex = name.as_bytes();
    if hex.len() % 2 != 0 {
        return None;
    }
    let bytes = hex
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}
