//! Structured cookie records.
//!
//! A [`CookieRecord`] is the map-shaped view of a cookie that embedding
//! callers (scripts, automation drivers) exchange with the store:
//!
//! ```json
//! {
//!   "domain": "example.com",
//!   "name": "session",
//!   "value": "abc123",
//!   "path": "/",
//!   "httponly": true,
//!   "secure": false,
//!   "expires": "Sun, 15 Jan 2040 10:00:00 GMT"
//! }
//! ```
//!
//! Incoming records are validated by `TryFrom<CookieRecord> for CanonicalCookie`;
//! outgoing records are built with `From<&CanonicalCookie>`.

use crate::base::error::CookieError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// `ddd, dd MMM yyyy hh:mm:ss`, always followed by ` GMT` in records.
const EXPIRES_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second]"
);

const GMT_SUFFIX: &str = " GMT";

/// A cookie as a record of optional fields.
///
/// Defaults applied when converting into a cookie: `path` = `/`,
/// `httponly` = `false`, `secure` = `false`, no `expires` = session cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub httponly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl CookieRecord {
    /// A record carrying the three required fields.
    pub fn new(
        domain: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            domain: Some(domain.into()),
            name: Some(name.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_httponly(mut self, httponly: bool) -> Self {
        self.httponly = Some(httponly);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn with_expires(mut self, expires: impl Into<String>) -> Self {
        self.expires = Some(expires.into());
        self
    }
}

impl TryFrom<CookieRecord> for CanonicalCookie {
    type Error = CookieError;

    /// Requires a non-empty `domain` and `name` and a present (possibly empty)
    /// `value`. An `expires` that does not parse leaves a session cookie.
    fn try_from(record: CookieRecord) -> Result<Self, Self::Error> {
        let domain = record
            .domain
            .filter(|d| !d.is_empty())
            .ok_or(CookieError::InvalidRecord("missing domain"))?;
        let name = record
            .name
            .filter(|n| !n.is_empty())
            .ok_or(CookieError::InvalidRecord("missing name"))?;
        let value = record
            .value
            .ok_or(CookieError::InvalidRecord("missing value"))?;

        let mut cookie = CanonicalCookie::new(name, value, domain)
            .with_http_only(record.httponly.unwrap_or(false))
            .with_secure(record.secure.unwrap_or(false));

        if let Some(path) = record.path.filter(|p| !p.is_empty()) {
            cookie = cookie.with_path(path);
        }

        if let Some(expires) = record.expires.as_deref().and_then(parse_expires) {
            cookie = cookie.with_expiration(expires);
        }

        Ok(cookie)
    }
}

impl From<&CanonicalCookie> for CookieRecord {
    fn from(cookie: &CanonicalCookie) -> Self {
        let path = if cookie.path.is_empty() {
            "/".to_string()
        } else {
            cookie.path.clone()
        };

        CookieRecord {
            domain: Some(cookie.domain.clone()),
            name: Some(cookie.name.clone()),
            value: Some(cookie.value.clone()),
            path: Some(path),
            httponly: Some(cookie.http_only),
            secure: Some(cookie.secure),
            expires: cookie.expiration_time.and_then(format_expires),
        }
    }
}

impl From<CanonicalCookie> for CookieRecord {
    fn from(cookie: CanonicalCookie) -> Self {
        CookieRecord::from(&cookie)
    }
}

/// Parse `ddd, dd MMM yyyy hh:mm:ss GMT` as a UTC timestamp. The trailing
/// ` GMT` is optional.
pub fn parse_expires(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    let s = s.strip_suffix(GMT_SUFFIX).unwrap_or(s);
    PrimitiveDateTime::parse(s, EXPIRES_FORMAT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Format a timestamp as `ddd, dd MMM yyyy hh:mm:ss GMT`.
pub fn format_expires(t: OffsetDateTime) -> Option<String> {
    let utc = t.to_offset(time::UtcOffset::UTC);
    match utc.format(EXPIRES_FORMAT) {
        Ok(s) => Some(s + GMT_SUFFIX),
        Err(e) => {
            tracing::debug!(error = %e, "cookie expiration not representable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_minimal_record_defaults() {
        let cookie = CanonicalCookie::try_from(CookieRecord::new("x.com", "a", "1")).unwrap();
        assert_eq!(cookie.path, "/");
        assert!(!cookie.http_only);
        assert!(!cookie.secure);
        assert!(cookie.is_session_cookie());

        let record = CookieRecord::from(&cookie);
        assert_eq!(record.path.as_deref(), Some("/"));
        assert_eq!(record.httponly, Some(false));
        assert_eq!(record.secure, Some(false));
        assert_eq!(record.expires, None);
    }

    #[test]
    fn test_required_fields() {
        let missing_domain = CookieRecord {
            domain: Some(String::new()),
            ..CookieRecord::new("", "a", "1")
        };
        assert!(matches!(
            CanonicalCookie::try_from(missing_domain),
            Err(CookieError::InvalidRecord("missing domain"))
        ));

        let missing_name = CookieRecord {
            name: None,
            ..CookieRecord::new("x.com", "a", "1")
        };
        assert!(matches!(
            CanonicalCookie::try_from(missing_name),
            Err(CookieError::InvalidRecord("missing name"))
        ));

        let missing_value = CookieRecord {
            value: None,
            ..CookieRecord::new("x.com", "a", "1")
        };
        assert!(matches!(
            CanonicalCookie::try_from(missing_value),
            Err(CookieError::InvalidRecord("missing value"))
        ));

        // An empty value is still a value.
        assert!(CanonicalCookie::try_from(CookieRecord::new("x.com", "a", "")).is_ok());
    }

    #[test]
    fn test_expires_roundtrip() {
        let record = CookieRecord::new("x.com", "a", "1")
            .with_path("/app")
            .with_httponly(true)
            .with_secure(true)
            .with_expires("Sun, 15 Jan 2040 10:00:00 GMT");

        let cookie = CanonicalCookie::try_from(record.clone()).unwrap();
        assert_eq!(cookie.expiration_time, Some(datetime!(2040-01-15 10:00:00 UTC)));
        assert_eq!(CookieRecord::from(&cookie), record);
    }

    #[test]
    fn test_invalid_expires_is_session() {
        let record = CookieRecord::new("x.com", "a", "1").with_expires("next tuesday");
        let cookie = CanonicalCookie::try_from(record).unwrap();
        assert!(cookie.is_session_cookie());
    }

    #[test]
    fn test_format_expires() {
        assert_eq!(
            format_expires(datetime!(2000-01-01 10:00:00 UTC)).as_deref(),
            Some("Sat, 01 Jan 2000 10:00:00 GMT")
        );
        assert_eq!(
            parse_expires("Sat, 01 Jan 2000 10:00:00"),
            Some(datetime!(2000-01-01 10:00:00 UTC))
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_shape() {
        let record = CookieRecord::from(&CanonicalCookie::new("a", "1", "x.com"));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "domain": "x.com",
                "name": "a",
                "value": "1",
                "path": "/",
                "httponly": false,
                "secure": false
            })
        );

        let parsed: CookieRecord =
            serde_json::from_str(r#"{"domain": "x.com", "name": "a", "value": "1"}"#).unwrap();
        assert_eq!(parsed, CookieRecord::new("x.com", "a", "1"));
    }
}
