//! Persistent cookie storage.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`canonical_cookie`] | Single cookie representation and `Set-Cookie` wire form |
//! | [`collection`] | Ordered cookie collection, unique by `(name, domain, path)` |
//! | [`matcher`] | Domain, path and secure matching; merging incoming cookies |
//! | [`lifecycle`] | Expired and session cookie purges |
//! | [`persistence`] | Versioned binary format and load/save through a backing store |
//! | [`backing`] | Key/value stores the persisted blob lives in |
//! | [`record`] | Map-shaped cookie records for embedding callers |
//! | [`store`] | [`CookieStore`], the public jar tying the above together |
//!
//! # Example
//!
//! ```rust
//! use cookiejar::cookies::backing::MemoryBackingStore;
//! use cookiejar::cookies::record::CookieRecord;
//! use cookiejar::cookies::CookieStore;
//! use std::sync::Arc;
//!
//! let store = CookieStore::new(Arc::new(MemoryBackingStore::new()));
//! store.initialize();
//!
//! store.add_cookie_from_record(CookieRecord::new(".example.com", "theme", "dark"), None);
//! let record = store.cookie_record_by_name("theme", None).unwrap();
//! assert_eq!(record.domain.as_deref(), Some("example.com"));
//! ```

pub mod backing;
pub mod canonical_cookie;
pub mod collection;
pub mod config;
pub mod lifecycle;
pub mod matcher;
pub mod persistence;
pub mod record;
pub mod store;

pub use canonical_cookie::CanonicalCookie;
pub use config::CookieStoreConfig;
pub use record::CookieRecord;
pub use store::CookieStore;
