//! Cookie store configuration.

use crate::cookies::persistence::DEFAULT_STORAGE_KEY;

/// Configuration options for [`CookieStore`](crate::cookies::store::CookieStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieStoreConfig {
    /// Key the cookie collection is persisted under in the backing store.
    pub storage_key: String,

    /// Whether the store starts enabled. A disabled store keeps its cookies
    /// but neither returns nor accepts any.
    pub enabled: bool,
}

impl Default for CookieStoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            enabled: true,
        }
    }
}

impl CookieStoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
