//! Cookie matching: which stored cookies apply to a URL, and how incoming
//! cookies merge into a collection.
//!
//! Both entry points are pure functions over a [`CookieCollection`]; the
//! matcher holds no state of its own.

use crate::cookies::canonical_cookie::{normalize_domain, CanonicalCookie};
use crate::cookies::collection::CookieCollection;
use time::OffsetDateTime;
use url::Url;

/// Get cookies matching the URL.
///
/// A cookie matches when its domain matches the URL host, its path matches
/// the URL path, it is not `Secure` or the scheme is secure, and it has not
/// expired at `now`.
///
/// Results are sorted longest path first; cookies with equal path length
/// keep their storage order.
pub fn cookies_for_url(
    collection: &CookieCollection,
    url: &Url,
    now: OffsetDateTime,
) -> Vec<CanonicalCookie> {
    let mut result: Vec<CanonicalCookie> = collection
        .iter()
        .filter(|cookie| matches_url(cookie, url) && !cookie.is_expired(now))
        .cloned()
        .collect();

    result.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
    result
}

/// Check domain, path and secure scoping of `cookie` against `url`.
pub fn matches_url(cookie: &CanonicalCookie, url: &Url) -> bool {
    let host = url.host_str().unwrap_or("");

    if !domain_matches(&cookie.domain, host) {
        return false;
    }

    if !path_matches(&cookie.path, request_path(url)) {
        return false;
    }

    !cookie.secure || is_secure_scheme(url)
}

/// Merge `new_cookies` into `collection`.
///
/// Cookies without a domain take the URL host; cookies without a path take
/// the URL's default path. Each cookie then replaces the stored cookie with
/// the same `(name, domain, path)` or is appended.
///
/// Returns the updated collection and whether anything was added or replaced.
pub fn set_cookies_from_url(
    collection: &CookieCollection,
    new_cookies: impl IntoIterator<Item = CanonicalCookie>,
    url: &Url,
) -> (CookieCollection, bool) {
    let host = url.host_str().unwrap_or("");
    let mut next = collection.clone();
    let mut changed = false;

    for mut cookie in new_cookies {
        if cookie.domain.is_empty() {
            cookie.domain = host.to_string();
        }
        cookie.domain = normalize_domain(&cookie.domain);

        if cookie.path.is_empty() {
            cookie.path = default_path(url).to_string();
        }

        next.upsert(cookie);
        changed = true;
    }

    (next, changed)
}

/// Check if cookie domain matches request host.
///
/// The cookie domain matches when it equals the host, or when it is a suffix
/// of the host preceded by a dot. A leading dot on the cookie domain is
/// ignored, so `.example.com` matches both `example.com` and
/// `www.example.com`.
pub fn domain_matches(cookie_domain: &str, request_host: &str) -> bool {
    let cookie_domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);

    if cookie_domain.is_empty() {
        return request_host.is_empty();
    }

    if request_host.eq_ignore_ascii_case(cookie_domain) {
        return true;
    }

    if request_host.len() > cookie_domain.len() {
        let split = request_host.len() - cookie_domain.len();
        // Hosts are ASCII after IDNA processing by `url`; bail out on anything else.
        if !request_host.is_char_boundary(split) {
            return false;
        }
        let suffix = &request_host[split..];
        if suffix.eq_ignore_ascii_case(cookie_domain) {
            return request_host.as_bytes()[split - 1] == b'.';
        }
    }

    false
}

/// Check if request path matches cookie path.
/// Implements RFC 6265 path matching.
pub fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if cookie_path.is_empty() || cookie_path == "/" {
        return true;
    }

    if request_path == cookie_path {
        return true;
    }

    if let Some(rest) = request_path.strip_prefix(cookie_path) {
        // Cookie path is a prefix
        if cookie_path.ends_with('/') {
            return true;
        }
        // Check that the next character in request_path is '/'
        return rest.starts_with('/');
    }

    false
}

/// RFC 6265 default-path: the directory of the URL path.
pub fn default_path(url: &Url) -> &str {
    let path = request_path(url);
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

pub fn is_secure_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "https" | "wss")
}

fn request_path(url: &Url) -> &str {
    match url.path() {
        "" => "/",
        path => path,
    }
}
