//! Durable key/value storage behind the cookie store.
//!
//! The store treats its backing medium as an opaque blob store: it reads and
//! overwrites one value under one key. Three implementations ship here:
//!
//! | Backend | Medium | Feature |
//! |---------|--------|---------|
//! | [`MemoryBackingStore`] | process memory | always |
//! | [`JsonFileBackingStore`] | one JSON file, base64 values | `json` |
//! | [`SqliteBackingStore`] | one SQLite table | `sqlite` |

mod memory;
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "sqlite")]
mod sqlite;

use crate::base::error::Result;

pub use memory::MemoryBackingStore;
#[cfg(feature = "json")]
pub use json::JsonFileBackingStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackingStore;

/// A durable key/value store holding serialized blobs.
///
/// Implementations must be `Send + Sync` and internally synchronized; both
/// methods take `&self`.
pub trait BackingStore: Send + Sync {
    /// Read the value stored under `key`. `Ok(None)` when absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}
