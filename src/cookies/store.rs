//! The persistent cookie store.
//!
//! [`CookieStore`] owns the cookie collection for one profile. Reads go
//! through the [matcher](crate::cookies::matcher); every write goes through a
//! single replace-or-append-then-persist path; the
//! [lifecycle](crate::cookies::lifecycle) purges run on load, on every save
//! and at shutdown.
//!
//! # Lifecycle
//!
//! ```rust
//! use cookiejar::cookies::backing::MemoryBackingStore;
//! use cookiejar::cookies::canonical_cookie::CanonicalCookie;
//! use cookiejar::cookies::store::CookieStore;
//! use std::sync::Arc;
//! use url::Url;
//!
//! let backing = MemoryBackingStore::new();
//!
//! let store = CookieStore::new(Arc::new(backing.clone()));
//! store.initialize(); // loads persisted cookies; the constructor does no I/O
//!
//! let url = Url::parse("https://www.example.com/").unwrap();
//! store.set_cookies_from_url(vec![CanonicalCookie::new("sid", "42", "")], &url);
//! assert_eq!(store.cookies_for_url(&url).len(), 1);
//!
//! // Dropping the store purges session cookies and saves the rest.
//! drop(store);
//! ```
//!
//! # Concurrency
//!
//! The collection and the enabled flag sit behind one mutex that each public
//! operation holds for its whole duration. Persistence I/O happens while the
//! lock is held.

use crate::base::error::CookieError;
use crate::cookies::backing::BackingStore;
use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::collection::CookieCollection;
use crate::cookies::config::CookieStoreConfig;
use crate::cookies::lifecycle::{purge_expired, purge_session_cookies};
use crate::cookies::matcher;
use crate::cookies::persistence::CookiePersistence;
use crate::cookies::record::CookieRecord;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use url::Url;

/// A browser-style cookie jar persisted to a [`BackingStore`].
pub struct CookieStore {
    persistence: CookiePersistence,
    state: Mutex<StoreState>,
}

#[derive(Debug)]
struct StoreState {
    cookies: CookieCollection,
    enabled: bool,
    /// Set once the persisted collection has been read. Nothing is written
    /// back before that, so an uninitialized store cannot clobber saved state.
    loaded: bool,
}

impl std::fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CookieStore")
            .field("persistence", &self.persistence)
            .field("cookie_count", &state.cookies.len())
            .field("enabled", &state.enabled)
            .field("loaded", &state.loaded)
            .finish()
    }
}

impl CookieStore {
    /// Create a store with the default configuration.
    ///
    /// No I/O happens here; call [`initialize`](Self::initialize) once before
    /// using the store.
    pub fn new(backing: Arc<dyn BackingStore>) -> Self {
        Self::with_config(backing, CookieStoreConfig::default())
    }

    /// Create a store with an explicit configuration. Also does no I/O.
    pub fn with_config(backing: Arc<dyn BackingStore>, config: CookieStoreConfig) -> Self {
        Self {
            persistence: CookiePersistence::new(backing, config.storage_key),
            state: Mutex::new(StoreState {
                cookies: CookieCollection::new(),
                enabled: config.enabled,
                loaded: false,
            }),
        }
    }

    /// Load the persisted cookies and purge those that expired since the last
    /// run, saving straight away if any were removed.
    ///
    /// Only the first call does anything.
    pub fn initialize(&self) {
        let mut state = self.lock();
        if state.loaded {
            return;
        }

        let now = OffsetDateTime::now_utc();
        let loaded = self.persistence.load(now);
        let (cookies, removed) = purge_expired(&loaded, now);
        state.cookies = cookies;
        state.loaded = true;

        tracing::debug!(
            key = self.persistence.key(),
            count = state.cookies.len(),
            expired = removed,
            "cookie store initialized"
        );

        if removed > 0 {
            self.save_locked(&mut state);
        }
    }

    /// Cookies to attach to a request for `url`. Empty while disabled.
    pub fn cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        let state = self.lock();
        if !state.enabled {
            return Vec::new();
        }
        matcher::cookies_for_url(&state.cookies, url, OffsetDateTime::now_utc())
    }

    /// Store `cookies` received for `url` and persist the result.
    ///
    /// Returns whether any cookie was added or replaced; always `false` while
    /// disabled.
    pub fn set_cookies_from_url(&self, cookies: Vec<CanonicalCookie>, url: &Url) -> bool {
        let mut state = self.lock();
        if !state.enabled {
            return false;
        }
        self.set_locked(&mut state, cookies, url)
    }

    /// Store a single cookie.
    ///
    /// Without a `url`, one is made up from the cookie itself: `https` when
    /// secure, `www` prepended to a dotted domain, and the cookie's path.
    pub fn add_cookie(&self, cookie: CanonicalCookie, url: Option<&Url>) -> bool {
        let mut state = self.lock();
        if !state.enabled {
            return false;
        }
        self.add_locked(&mut state, cookie, url)
    }

    /// Store a cookie described by a record. Invalid records are dropped.
    pub fn add_cookie_from_record(&self, record: CookieRecord, url: Option<&Url>) -> bool {
        let mut state = self.lock();
        if !state.enabled {
            return false;
        }
        match CanonicalCookie::try_from(record) {
            Ok(cookie) => self.add_locked(&mut state, cookie, url),
            Err(e) => {
                tracing::debug!(error = %e, "dropping cookie record");
                false
            }
        }
    }

    /// Store several cookies in input order; a later cookie with the same
    /// `(name, domain, path)` replaces an earlier one.
    pub fn add_cookies<I>(&self, cookies: I, url: Option<&Url>) -> bool
    where
        I: IntoIterator<Item = CanonicalCookie>,
    {
        let mut state = self.lock();
        if !state.enabled {
            return false;
        }

        let mut changed = false;
        for cookie in cookies {
            changed |= self.merge_locked(&mut state, cookie, url);
        }
        if changed {
            self.save_locked(&mut state);
        }
        changed
    }

    /// Record variant of [`add_cookies`](Self::add_cookies). Invalid records
    /// are skipped.
    pub fn add_cookies_from_records<I>(&self, records: I, url: Option<&Url>) -> bool
    where
        I: IntoIterator<Item = CookieRecord>,
    {
        let cookies: Vec<CanonicalCookie> = records
            .into_iter()
            .filter_map(|record| match CanonicalCookie::try_from(record) {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    tracing::debug!(error = %e, "dropping cookie record");
                    None
                }
            })
            .collect();
        self.add_cookies(cookies, url)
    }

    /// All live cookies when `url` is `None`, else the cookies matching `url`.
    /// Empty while disabled.
    pub fn cookies(&self, url: Option<&Url>) -> Vec<CanonicalCookie> {
        let state = self.lock();
        Self::visible_locked(&state, url)
    }

    /// [`cookies`](Self::cookies) as records.
    pub fn all_cookies_as_records(&self, url: Option<&Url>) -> Vec<CookieRecord> {
        self.cookies(url).iter().map(CookieRecord::from).collect()
    }

    /// Look up a cookie by name among [`cookies`](Self::cookies). When
    /// several match, the last one in storage order wins.
    pub fn cookie_by_name(&self, name: &str, url: Option<&Url>) -> Option<CanonicalCookie> {
        let state = self.lock();
        Self::find_by_name(Self::visible_locked(&state, url), name)
    }

    /// [`cookie_by_name`](Self::cookie_by_name) as a record.
    pub fn cookie_record_by_name(&self, name: &str, url: Option<&Url>) -> Option<CookieRecord> {
        self.cookie_by_name(name, url).map(CookieRecord::from)
    }

    /// Expire the cookie called `name` (among those visible to `url`, or all
    /// cookies) and write it back; the purge on save then removes it.
    ///
    /// Returns whether a cookie was found.
    pub fn delete_cookie_by_name(&self, name: &str, url: Option<&Url>) -> bool {
        let mut state = self.lock();
        if !state.enabled || name.is_empty() {
            return false;
        }

        let Some(mut cookie) = Self::find_by_name(Self::visible_locked(&state, url), name) else {
            return false;
        };

        cookie.set_expiration(Some(OffsetDateTime::UNIX_EPOCH));
        self.add_locked(&mut state, cookie, url)
    }

    /// Remove every cookie when `url` is `None`, else the cookies visible to
    /// `url`. Returns whether anything was removed.
    pub fn delete_all_cookies(&self, url: Option<&Url>) -> bool {
        let mut state = self.lock();
        if !state.enabled {
            return false;
        }

        let (remaining, removed) = match url {
            None => (CookieCollection::new(), state.cookies.len()),
            Some(url) => state.cookies.retained(|c| !matcher::matches_url(c, url)),
        };

        if removed == 0 {
            return false;
        }
        state.cookies = remaining;
        tracing::debug!(removed, "deleted cookies");
        self.save_locked(&mut state);
        true
    }

    pub fn enable(&self) {
        self.lock().enabled = true;
        tracing::debug!("cookie store enabled");
    }

    pub fn disable(&self) {
        self.lock().enabled = false;
        tracing::debug!("cookie store disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Number of stored cookies, whether or not the store is enabled.
    pub fn len(&self) -> usize {
        self.lock().cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cookies.is_empty()
    }

    /// Purge expired cookies and write the collection to the backing store.
    ///
    /// Returns `false` when disabled, not yet initialized, or the write failed.
    pub fn save(&self) -> bool {
        let mut state = self.lock();
        self.save_locked(&mut state)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn visible_locked(state: &StoreState, url: Option<&Url>) -> Vec<CanonicalCookie> {
        if !state.enabled {
            return Vec::new();
        }

        let now = OffsetDateTime::now_utc();
        match url {
            Some(url) => matcher::cookies_for_url(&state.cookies, url, now),
            None => state
                .cookies
                .iter()
                .filter(|c| !c.is_expired(now))
                .cloned()
                .collect(),
        }
    }

    fn find_by_name(cookies: Vec<CanonicalCookie>, name: &str) -> Option<CanonicalCookie> {
        cookies.into_iter().rev().find(|c| c.name == name)
    }

    fn set_locked(
        &self,
        state: &mut StoreState,
        cookies: Vec<CanonicalCookie>,
        url: &Url,
    ) -> bool {
        let (next, changed) = matcher::set_cookies_from_url(&state.cookies, cookies, url);
        if changed {
            state.cookies = next;
            self.save_locked(state);
        }
        changed
    }

    fn add_locked(&self, state: &mut StoreState, cookie: CanonicalCookie, url: Option<&Url>) -> bool {
        let changed = self.merge_locked(state, cookie, url);
        if changed {
            self.save_locked(state);
        }
        changed
    }

    /// Merge one cookie into the collection without persisting.
    fn merge_locked(&self, state: &mut StoreState, cookie: CanonicalCookie, url: Option<&Url>) -> bool {
        let url = match url {
            Some(url) => url.clone(),
            None => match synthesize_url(&cookie) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(name = %cookie.name, error = %e, "dropping cookie");
                    return false;
                }
            },
        };

        let (next, changed) = matcher::set_cookies_from_url(&state.cookies, [cookie], &url);
        if changed {
            state.cookies = next;
        }
        changed
    }

    fn save_locked(&self, state: &mut StoreState) -> bool {
        if !state.enabled {
            return false;
        }
        if !state.loaded {
            tracing::debug!("cookie store not initialized, skipping save");
            return false;
        }

        let (cookies, removed) = purge_expired(&state.cookies, OffsetDateTime::now_utc());
        if removed > 0 {
            tracing::debug!(removed, "purged expired cookies");
        }
        state.cookies = cookies;
        self.persistence.save(&state.cookies)
    }
}

impl Drop for CookieStore {
    /// Session cookies end with the store: purge them, then save.
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if !state.enabled || !state.loaded {
            return;
        }

        let (cookies, removed) = purge_session_cookies(&state.cookies);
        state.cookies = cookies;
        tracing::debug!(removed, "purged session cookies at shutdown");

        let mut state = std::mem::replace(
            state,
            StoreState {
                cookies: CookieCollection::new(),
                enabled: false,
                loaded: false,
            },
        );
        self.save_locked(&mut state);
    }
}

/// Build a URL a cookie would plausibly have come from.
fn synthesize_url(cookie: &CanonicalCookie) -> Result<Url, CookieError> {
    let scheme = if cookie.secure { "https" } else { "http" };
    let host = if cookie.domain.starts_with('.') {
        format!("www{}", cookie.domain)
    } else {
        cookie.domain.clone()
    };
    let path = match cookie.path.as_str() {
        "" => "/".to_string(),
        p if p.starts_with('/') => p.to_string(),
        p => format!("/{p}"),
    };

    let raw = format!("{scheme}://{host}{path}");
    Url::parse(&raw).map_err(|e| CookieError::InvalidUrl(format!("{raw}: {e}")))
}
