//! Expiration and session purges.
//!
//! The store runs these at fixed points:
//! - after loading persisted cookies: [`purge_expired`], saving again if it removed anything
//! - before every save: [`purge_expired`]
//! - on shutdown: [`purge_session_cookies`], then a save

use crate::cookies::collection::CookieCollection;
use time::OffsetDateTime;

/// Remove every persistent cookie that expired before `now`.
///
/// Session cookies are never removed here, whatever `now` is.
pub fn purge_expired(
    collection: &CookieCollection,
    now: OffsetDateTime,
) -> (CookieCollection, usize) {
    if collection.is_empty() {
        return (CookieCollection::new(), 0);
    }
    collection.retained(|c| c.is_session_cookie() || !c.is_expired(now))
}

/// Remove every session cookie.
pub fn purge_session_cookies(collection: &CookieCollection) -> (CookieCollection, usize) {
    if collection.is_empty() {
        return (CookieCollection::new(), 0);
    }
    collection.retained(|c| !c.is_session_cookie())
}
