//! Local persistence: a string key/value store plus JSON backup export/import.
//!
//! The document and the premium record live under separate keys. Writes replace the
//! whole value atomically; imports either yield a fully valid document or nothing.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cv::models::CvDocument;
use crate::premium::gate::PremiumRecord;

pub const DOCUMENT_KEY: &str = "cv-data";
pub const PREMIUM_KEY: &str = "quickcv-premium";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Invalid JSON file")]
    InvalidImport { reason: String },
}

/// A string-valued key/value store (the browser's local storage, in effect).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(value.as_bytes())?;
        file.flush()?;
        file.persist(&path).map_err(|e| e.error)?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn load<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| PersistenceError::Corrupt {
            key: key.to_string(),
            source,
        })
}

pub fn load_document(store: &dyn KeyValueStore) -> Result<Option<CvDocument>, PersistenceError> {
    load(store, DOCUMENT_KEY)
}

pub fn save_document(store: &dyn KeyValueStore, doc: &CvDocument) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(doc).map_err(PersistenceError::Serialize)?;
    store.set(DOCUMENT_KEY, &json)
}

/// Loads the premium record. A corrupt record is treated as absent and removed.
pub fn load_premium(store: &dyn KeyValueStore) -> Result<Option<PremiumRecord>, PersistenceError> {
    match load(store, PREMIUM_KEY) {
        Err(PersistenceError::Corrupt { source, .. }) => {
            warn!(error = %source, "discarding corrupt premium record");
            store.remove(PREMIUM_KEY)?;
            Ok(None)
        }
        other => other,
    }
}

pub fn save_premium(store: &dyn KeyValueStore, record: &PremiumRecord) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(record).map_err(PersistenceError::Serialize)?;
    store.set(PREMIUM_KEY, &json)
}

pub fn clear_premium(store: &dyn KeyValueStore) -> Result<(), PersistenceError> {
    store.remove(PREMIUM_KEY)
}

/// Pretty-printed JSON backup of the whole document.
pub fn export_json(doc: &CvDocument) -> Result<String, PersistenceError> {
    serde_json::to_string_pretty(doc).map_err(PersistenceError::Serialize)
}

/// Parses and validates a backup. Nothing is returned unless the whole file is valid.
pub fn import_json(text: &str) -> Result<CvDocument, PersistenceError> {
    let mut doc: CvDocument =
        serde_json::from_str(text).map_err(|e| PersistenceError::InvalidImport {
            reason: e.to_string(),
        })?;
    doc.validate_sections()
        .map_err(|e| PersistenceError::InvalidImport {
            reason: e.to_string(),
        })?;
    doc.clear_current_end_dates();
    Ok(doc)
}
