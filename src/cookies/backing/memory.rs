use crate::base::error::Result;
use crate::cookies::backing::BackingStore;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe in-memory backing store.
///
/// Clones share the same map, so a test (or a private browsing profile) can
/// hand one clone to a cookie store and keep another to inspect or reuse
/// after the cookie store is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackingStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryBackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BackingStore for MemoryBackingStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
