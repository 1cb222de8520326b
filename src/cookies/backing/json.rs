//! JSON-file backing store.
//!
//! All keys live in a single JSON object on disk; values are base64 encoded
//! since the persisted cookie blob is binary:
//!
//! ```json
//! { "cookies": "AAAAAQAAAAI..." }
//! ```
//!
//! Writes replace the file through a temporary sibling and a rename, so a
//! crash mid-write leaves the previous file intact.

use crate::base::context::IoResultExt;
use crate::base::error::Result;
use crate::cookies::backing::BackingStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type StoreFile = BTreeMap<String, String>;

/// A key/value store kept in one JSON file.
#[derive(Debug)]
pub struct JsonFileBackingStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl JsonFileBackingStore {
    /// Use the file at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<StoreFile> {
        match fs::read(&self.path) {
            Ok(contents) if contents.is_empty() => Ok(StoreFile::new()),
            Ok(contents) => Ok(serde_json::from_slice(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StoreFile::new()),
            Err(e) => Err(e).storage_context(&self.path),
        }
    }

    fn write_file(&self, file: &StoreFile) -> Result<()> {
        let contents = serde_json::to_vec_pretty(file)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents).storage_context(&tmp)?;
        fs::rename(&tmp, &self.path).storage_context(&self.path)
    }
}

impl BackingStore for JsonFileBackingStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let file = self.read_file()?;
        match file.get(key) {
            Some(encoded) => Ok(Some(STANDARD.decode(encoded)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = self.read_file()?;
        file.insert(key.to_string(), STANDARD.encode(value));
        self.write_file(&file)
    }
}
