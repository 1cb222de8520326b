use crate::base::error::CookieError;
use time::macros::datetime;
use time::OffsetDateTime;

/// Latest expiration a cookie can carry; `Max-Age` beyond it is clamped.
pub const MAX_EXPIRATION: OffsetDateTime = datetime!(9999-12-31 23:59:59 UTC);

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
///
/// A cookie without an `expiration_time` is a session cookie: it is never
/// purged for being expired, and it does not survive a store shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expiration_time: Option<OffsetDateTime>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

/// Identity of a stored cookie: `(name, domain, path)`.
///
/// The domain is compared in its normalized form, so `.example.com` and
/// `Example.com` share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CookieKey {
    pub name: String,
    pub domain: String,
    pub path: String,
}

impl CanonicalCookie {
    /// Create a session cookie scoped to `domain` with the default path `/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            expiration_time: None,
            secure: false,
            http_only: false,
            same_site: SameSite::Unspecified,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Set the expiration. The wire form only carries whole seconds in UTC,
    /// so the timestamp is truncated accordingly.
    pub fn with_expiration(mut self, expiration_time: OffsetDateTime) -> Self {
        self.set_expiration(Some(expiration_time));
        self
    }

    pub fn set_expiration(&mut self, expiration_time: Option<OffsetDateTime>) {
        self.expiration_time = expiration_time.map(whole_seconds);
    }

    pub fn is_session_cookie(&self) -> bool {
        self.expiration_time.is_none()
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        match self.expiration_time {
            Some(expiry) => expiry < current_time,
            None => false,
        }
    }

    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: normalize_domain(&self.domain),
            path: self.path.clone(),
        }
    }

    /// Whether `other` would replace `self` in a collection.
    pub fn same_key(&self, other: &CanonicalCookie) -> bool {
        self.name == other.name
            && self.path == other.path
            && normalize_domain(&self.domain) == normalize_domain(&other.domain)
    }

    /// Render the cookie in its `Set-Cookie` textual form. Name and value are
    /// percent-encoded so that `;`, whitespace and quotes survive a reparse.
    pub fn to_raw_form(&self) -> String {
        let mut builder = cookie::Cookie::build((self.name.clone(), self.value.clone()))
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);

        if !self.domain.is_empty() {
            builder = builder.domain(self.domain.clone());
        }
        if let Some(expiry) = self.expiration_time {
            builder = builder.expires(expiry);
        }
        builder = match self.same_site {
            SameSite::Unspecified => builder,
            SameSite::NoRestriction => builder.same_site(cookie::SameSite::None),
            SameSite::Lax => builder.same_site(cookie::SameSite::Lax),
            SameSite::Strict => builder.same_site(cookie::SameSite::Strict),
        };

        builder.build().encoded().to_string()
    }

    /// Parse a single `Set-Cookie` line.
    ///
    /// Name and value are percent-decoded. `Max-Age` is resolved against `now`
    /// into an absolute expiration, clamped to [`MAX_EXPIRATION`]; when both
    /// attributes are present `Max-Age` takes precedence.
    pub fn parse(line: &str, now: OffsetDateTime) -> Result<Self, CookieError> {
        let parsed = cookie::Cookie::parse_encoded(line)
            .map_err(|e| CookieError::MalformedEntry(format!("{line}: {e}")))?;

        let expiration_time = match parsed.max_age() {
            Some(max_age) => Some(
                now.checked_add(max_age)
                    .filter(|t| *t <= MAX_EXPIRATION)
                    .unwrap_or(if max_age.is_negative() {
                        OffsetDateTime::UNIX_EPOCH
                    } else {
                        MAX_EXPIRATION
                    }),
            ),
            None => parsed.expires_datetime(),
        };

        let same_site = match parsed.same_site() {
            Some(cookie::SameSite::Lax) => SameSite::Lax,
            Some(cookie::SameSite::Strict) => SameSite::Strict,
            Some(cookie::SameSite::None) => SameSite::NoRestriction,
            None => SameSite::Unspecified,
        };

        let mut c = CanonicalCookie {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain: parsed.domain().unwrap_or("").to_string(),
            path: parsed.path().unwrap_or("").to_string(),
            expiration_time: None,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            same_site,
        };
        c.set_expiration(expiration_time);
        Ok(c)
    }

    /// Parse every cookie line in `raw`, one per line. Lines that fail to
    /// parse are dropped; the caller decides whether an empty result for a
    /// non-empty input is worth reporting.
    pub fn parse_all(raw: &str, now: OffsetDateTime) -> Vec<Self> {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| Self::parse(line, now).ok())
            .collect()
    }
}

/// Lower-case `domain` and strip a single leading dot.
pub fn normalize_domain(domain: &str) -> String {
    domain.strip_prefix('.').unwrap_or(domain).to_ascii_lowercase()
}

fn whole_seconds(t: OffsetDateTime) -> OffsetDateTime {
    let utc = t.to_offset(time::UtcOffset::UTC);
    utc.replace_nanosecond(0).unwrap_or(utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn now() -> OffsetDateTime {
        datetime!(2030-06-15 10:00:00 UTC)
    }

    #[test]
    fn test_new_is_session_cookie_with_root_path() {
        let c = CanonicalCookie::new("a", "1", "example.com");
        assert_eq!(c.path, "/");
        assert!(c.is_session_cookie());
        assert!(!c.is_expired(now()));
        assert!(!c.secure);
        assert!(!c.http_only);
    }

    #[test]
    fn test_is_expired() {
        let past = CanonicalCookie::new("a", "1", "example.com")
            .with_expiration(datetime!(2000-01-01 10:00:00 UTC));
        let future = CanonicalCookie::new("b", "1", "example.com")
            .with_expiration(datetime!(2099-12-31 10:00:00 UTC));

        assert!(past.is_expired(now()));
        assert!(!future.is_expired(now()));
    }

    #[test]
    fn test_expiration_truncated_to_seconds() {
        let c = CanonicalCookie::new("a", "1", "example.com")
            .with_expiration(datetime!(2040-01-15 10:00:00.750 +02:00));
        assert_eq!(
            c.expiration_time,
            Some(datetime!(2040-01-15 08:00:00 UTC))
        );
    }

    #[test]
    fn test_key_normalizes_domain() {
        let dotted = CanonicalCookie::new("a", "1", ".Example.com");
        let plain = CanonicalCookie::new("a", "2", "example.com");
        assert_eq!(dotted.key(), plain.key());
        assert!(dotted.same_key(&plain));

        let other_path = CanonicalCookie::new("a", "1", "example.com").with_path("/app");
        assert!(!plain.same_key(&other_path));
    }

    #[test]
    fn test_raw_form_roundtrip() {
        let original = CanonicalCookie::new("session", "abc123", "example.com")
            .with_path("/app")
            .with_secure(true)
            .with_http_only(true)
            .with_same_site(SameSite::Lax)
            .with_expiration(datetime!(2040-01-15 10:00:00 UTC));

        let raw = original.to_raw_form();
        assert!(raw.starts_with("session=abc123"));
        assert!(raw.contains("Expires=Sun, 15 Jan 2040 10:00:00 GMT"));

        let parsed = CanonicalCookie::parse(&raw, now()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_max_age() {
        let c = CanonicalCookie::parse("a=1; Max-Age=60; Domain=example.com", now()).unwrap();
        assert_eq!(c.expiration_time, Some(datetime!(2030-06-15 10:01:00 UTC)));
        assert_eq!(c.domain, "example.com");
    }

    #[test]
    fn test_parse_huge_max_age_is_clamped() {
        let c = CanonicalCookie::parse("a=1; Max-Age=99999999999999", now()).unwrap();
        assert_eq!(c.expiration_time, Some(MAX_EXPIRATION));
        assert!(!c.is_expired(now()));
    }

    #[test]
    fn test_value_with_separators_roundtrips() {
        let original = CanonicalCookie::new("a", "1;2 3\"q\"", "example.com");
        let raw = original.to_raw_form();
        assert!(raw.starts_with("a=1%3B2%203"));

        let parsed = CanonicalCookie::parse(&raw, now()).unwrap();
        assert_eq!(parsed.value, "1;2 3\"q\"");
    }

    #[test]
    fn test_parse_without_attributes() {
        let c = CanonicalCookie::parse("a=1", now()).unwrap();
        assert_eq!(c.domain, "");
        assert_eq!(c.path, "");
        assert!(c.is_session_cookie());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = CanonicalCookie::parse("no equals sign here", now()).unwrap_err();
        assert!(matches!(err, CookieError::MalformedEntry(_)));
    }

    #[test]
    fn test_parse_all_skips_blank_lines() {
        let cookies = CanonicalCookie::parse_all("a=1; Path=/\n\nb=2; Path=/x\n", now());
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[1].path, "/x");
    }
}
