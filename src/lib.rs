//! # cookiejar
//!
//! A browser-style persistent cookie store.
//!
//! Cookies are kept in memory, matched against request URLs with RFC 6265
//! domain and path rules, and written to a pluggable key/value backing store
//! in a versioned binary format after every change.
//!
//! ## Features
//!
//! - **Matching**: domain-suffix, path-prefix and secure-scheme scoping
//! - **Uniqueness**: one cookie per `(name, domain, path)`; newer replaces older
//! - **Lifecycle**: expired cookies purged on load and save, session cookies
//!   dropped at shutdown
//! - **Backing stores**: in-memory, JSON file (`json` feature), SQLite
//!   (`sqlite` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cookiejar::cookies::backing::SqliteBackingStore;
//! use cookiejar::cookies::{CanonicalCookie, CookieStore};
//! use std::sync::Arc;
//! use url::Url;
//!
//! let backing = SqliteBackingStore::open("profile/cookies.sqlite")?;
//! let store = CookieStore::new(Arc::new(backing));
//! store.initialize();
//!
//! let url = Url::parse("https://example.com/account").unwrap();
//! store.set_cookies_from_url(vec![CanonicalCookie::new("sid", "42", "")], &url);
//! for cookie in store.cookies_for_url(&url) {
//!     println!("{}={}", cookie.name, cookie.value);
//! }
//! # Ok::<(), cookiejar::base::error::CookieError>(())
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error type and I/O helpers
//! - [`cookies`] - Cookie model, matching, persistence and the store

pub mod base;
pub mod cookies;
