//! Cookie persistence - save and load the cookie collection through a
//! [`BackingStore`].
//!
//! The whole collection lives under one key as a versioned blob:
//!
//! ```text
//! u32 version | u32 count | count x (u32 length | Set-Cookie text)
//! ```
//!
//! All integers are big-endian. A length of `0xFFFF_FFFF` marks a null entry.

use crate::base::error::{CookieError, Result};
use crate::cookies::backing::BackingStore;
use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::collection::CookieCollection;
use bytes::{Buf, BufMut, BytesMut};
use std::sync::Arc;
use time::OffsetDateTime;

/// Current persisted format version.
pub const COOKIE_JAR_VERSION: u32 = 1;

/// Key the collection is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "cookies";

const NULL_ENTRY: u32 = u32::MAX;

/// Serialize `collection` into the versioned blob format.
pub fn encode(collection: &CookieCollection) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(8 + collection.len() * 64);
    buf.put_u32(COOKIE_JAR_VERSION);
    buf.put_u32(collection.len() as u32);

    for cookie in collection {
        let raw = cookie.to_raw_form();
        buf.put_u32(raw.len() as u32);
        buf.put_slice(raw.as_bytes());
    }

    buf.to_vec()
}

/// Deserialize a versioned blob.
///
/// A blob written with another format version is an error; the caller treats
/// it as an empty collection. Entries that do not parse are skipped with a
/// warning. A blob that ends early keeps whatever was read before the cut.
pub fn decode(data: &[u8], now: OffsetDateTime) -> Result<CookieCollection> {
    let mut buf = data;

    ensure_remaining(buf, 4)?;
    let version = buf.get_u32();
    if version != COOKIE_JAR_VERSION {
        return Err(CookieError::VersionMismatch {
            found: version,
            expected: COOKIE_JAR_VERSION,
        });
    }

    ensure_remaining(buf, 4)?;
    let count = buf.get_u32();

    let mut cookies = Vec::new();
    for index in 0..count {
        let entry = match read_entry(&mut buf) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(index, count, error = %e, "persisted cookies truncated");
                break;
            }
        };

        let raw = String::from_utf8_lossy(entry);
        let parsed = CanonicalCookie::parse_all(&raw, now);
        if parsed.is_empty() && !entry.is_empty() {
            tracing::warn!(
                error = %CookieError::MalformedEntry(raw.to_string()),
                "skipping persisted cookie"
            );
        }
        cookies.extend(parsed);

        if !buf.has_remaining() {
            break;
        }
    }

    Ok(cookies.into_iter().collect())
}

fn read_entry<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    ensure_remaining(buf, 4)?;
    let len = buf.get_u32();
    if len == NULL_ENTRY {
        return Ok(&[]);
    }

    let len = len as usize;
    ensure_remaining(buf, len)?;
    let (entry, rest) = buf.split_at(len);
    *buf = rest;
    Ok(entry)
}

fn ensure_remaining(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(CookieError::Truncated {
            needed,
            remaining: buf.len(),
        });
    }
    Ok(())
}

/// Loads and saves the cookie collection under a fixed key of a
/// [`BackingStore`].
///
/// Neither direction fails: problems are logged, a failed load yields an
/// empty collection and a failed save reports `false`.
#[derive(Clone)]
pub struct CookiePersistence {
    backing: Arc<dyn BackingStore>,
    key: String,
}

impl std::fmt::Debug for CookiePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookiePersistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl CookiePersistence {
    pub fn new(backing: Arc<dyn BackingStore>, key: impl Into<String>) -> Self {
        Self {
            backing,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the persisted collection. Absent, unreadable or foreign-version
    /// data all load as an empty collection.
    pub fn load(&self, now: OffsetDateTime) -> CookieCollection {
        let data = match self.backing.get(&self.key) {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no persisted cookies");
                return CookieCollection::new();
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to read persisted cookies");
                return CookieCollection::new();
            }
        };

        match decode(&data, now) {
            Ok(collection) => {
                tracing::debug!(key = %self.key, count = collection.len(), "loaded cookies");
                collection
            }
            Err(e @ CookieError::VersionMismatch { .. }) => {
                tracing::info!(key = %self.key, error = %e, "ignoring persisted cookies");
                CookieCollection::new()
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding persisted cookies");
                CookieCollection::new()
            }
        }
    }

    /// Overwrite the persisted collection with `collection`.
    pub fn save(&self, collection: &CookieCollection) -> bool {
        match self.backing.set(&self.key, &encode(collection)) {
            Ok(()) => {
                tracing::debug!(key = %self.key, count = collection.len(), "saved cookies");
                true
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "failed to save cookies");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::backing::MemoryBackingStore;
    use time::macros::datetime;

    fn now() -> OffsetDateTime {
        datetime!(2030-06-15 10:00:00 UTC)
    }

    fn sample() -> CookieCollection {
        vec![
            CanonicalCookie::new("session", "abc123", "example.com").with_http_only(true),
            CanonicalCookie::new("pref", "dark", "example.com")
                .with_path("/settings")
                .with_secure(true)
                .with_expiration(datetime!(2040-01-15 10:00:00 UTC)),
        ]
        .into_iter()
        .collect()
    }

    fn blob(version: u32, entries: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u32(version);
        buf.put_u32(entries.len() as u32);
        for entry in entries {
            buf.put_u32(entry.len() as u32);
            buf.put_slice(entry);
        }
        buf.to_vec()
    }

    #[test]
    fn test_encode_header() {
        let data = encode(&sample());
        assert_eq!(&data[0..4], &[0, 0, 0, 1]);
        assert_eq!(&data[4..8], &[0, 0, 0, 2]);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let original = sample();
        let decoded = decode(&encode(&original), now()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_version_mismatch() {
        let data = blob(2, &[b"a=1; Domain=example.com; Path=/"]);
        let err = decode(&data, now()).unwrap_err();
        assert!(matches!(
            err,
            CookieError::VersionMismatch {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_decode_skips_malformed_entry() {
        let data = blob(
            1,
            &[
                b"a=1; Domain=example.com; Path=/",
                b"this is not a cookie",
                b"",
                b"b=2; Domain=example.com; Path=/",
            ],
        );
        let decoded = decode(&data, now()).unwrap();
        let names: Vec<&str> = decoded.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_decode_truncated_keeps_prefix() {
        let mut data = blob(
            1,
            &[b"a=1; Domain=example.com; Path=/", b"b=2; Domain=example.com; Path=/"],
        );
        data.truncate(data.len() - 5);
        let decoded = decode(&data, now()).unwrap();
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_decode_huge_max_age() {
        let data = blob(1, &[b"a=1; Domain=x.com; Path=/; Max-Age=99999999999999"]);
        let decoded = decode(&data, now()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(
            decoded.as_slice()[0].expiration_time,
            Some(crate::cookies::canonical_cookie::MAX_EXPIRATION)
        );
    }

    #[test]
    fn test_decode_null_entry() {
        let mut buf = BytesMut::new();
        buf.put_u32(1);
        buf.put_u32(2);
        buf.put_u32(NULL_ENTRY);
        let entry = b"a=1; Domain=example.com; Path=/";
        buf.put_u32(entry.len() as u32);
        buf.put_slice(entry);

        let decoded = decode(&buf, now()).unwrap();
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_decode_short_header() {
        assert!(matches!(
            decode(&[0, 0], now()),
            Err(CookieError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_collapses_duplicate_keys() {
        let data = blob(
            1,
            &[b"a=1; Domain=example.com; Path=/", b"a=2; Domain=example.com; Path=/"],
        );
        let decoded = decode(&data, now()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.as_slice()[0].value, "2");
    }

    #[test]
    fn test_persistence_load_missing_is_empty() {
        let persistence = CookiePersistence::new(Arc::new(MemoryBackingStore::new()), "cookies");
        assert!(persistence.load(now()).is_empty());
    }

    #[test]
    fn test_persistence_save_load() {
        let backing = MemoryBackingStore::new();
        let persistence = CookiePersistence::new(Arc::new(backing.clone()), "cookies");

        assert!(persistence.save(&sample()));
        assert!(backing.contains_key("cookies"));
        assert_eq!(persistence.load(now()), sample());
    }

    #[test]
    fn test_persistence_foreign_version_is_empty() {
        let backing = MemoryBackingStore::new();
        backing
            .set("cookies", &blob(9, &[b"a=1; Domain=example.com"]))
            .unwrap();
        let persistence = CookiePersistence::new(Arc::new(backing), "cookies");
        assert!(persistence.load(now()).is_empty());
    }
}
