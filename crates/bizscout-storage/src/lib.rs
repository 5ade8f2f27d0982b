use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use bizscout_core::{BusinessRecord, Dataset, DatasetError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

/// Named opaque blobs. `load` returns `Ok(None)` for an absent key.
pub trait BlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn save(&mut self, key: &str, blob: &[u8]) -> Result<(), StorageError>;
    fn keys(&self) -> Vec<String>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.blobs.remove(key).is_some()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        self.blobs.insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// One file per key, `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn save(&mut self, key: &str, blob: &[u8]) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        log::debug!("saved blob {key} ({} bytes) to {}", blob.len(), path.display());
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut keys: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|e| {
                let name = e.file_name().into_string().ok()?;
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        keys.sort();
        keys
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidInput(format!("invalid blob key: {key:?}")))
    }
}

/// Reads a JSON array of dataset rows and validates it.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset, StorageError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let records: Vec<BusinessRecord> = serde_json::from_slice(&bytes)?;
    Ok(Dataset::new(records)?)
}

/// Row counts per city, handy for sanity checks on freshly loaded files.
pub fn city_counts(dataset: &Dataset) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in dataset.iter() {
        *counts.entry(record.city.clone()).or_insert(0) += 1;
    }
    counts
}
