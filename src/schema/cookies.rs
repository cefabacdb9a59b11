//! Cookie model and cookie-jar-like sources.
//!
//! A cookie jar record distinguishes attributes that were explicitly set
//! (`Domain=`, `Path=`, `Port=`) from values inherited from the request URL.
//! `CookieModel` keeps that distinction: inherited values are left out.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::secret::Secret;
use crate::error_handling::ValidationError;

/// Read access to the attributes of a cookie-jar record.
///
/// Rarely used attributes have defaults so that simple sources only need to
/// describe name, value, domain, path and flags.
pub trait HasCookieAttributes {
    fn version(&self) -> Option<i64> {
        None
    }
    fn name(&self) -> Option<&str>;
    fn value(&self) -> Option<&str>;
    fn domain(&self) -> Option<&str>;
    fn domain_specified(&self) -> bool;
    /// Port list as written in the cookie
    fn port(&self) -> Option<&str> {
        None
    }
    fn port_specified(&self) -> bool {
        false
    }
    fn path(&self) -> Option<&str>;
    fn path_specified(&self) -> bool;
    fn secure(&self) -> bool;
    fn discard(&self) -> bool;
    /// Expiry as seconds since the Unix epoch
    fn expires(&self) -> Option<i64>;
    fn comment(&self) -> Option<&str> {
        None
    }
    fn comment_url(&self) -> Option<&str> {
        None
    }
    /// Non-standard attributes such as `HttpOnly` or `SameSite`
    fn rest(&self) -> IndexMap<String, Value> {
        IndexMap::new()
    }
}

/// A parsed `Set-Cookie` header, as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<SystemTime>,
    pub max_age: Option<Duration>,
    pub secure: bool,
    pub http_only: bool,
    /// `Lax` or `Strict`, when present
    pub same_site: Option<String>,
}

impl From<&reqwest::cookie::Cookie<'_>> for SetCookie {
    fn from(cookie: &reqwest::cookie::Cookie<'_>) -> Self {
        let same_site = if cookie.same_site_strict() {
            Some("Strict".to_string())
        } else if cookie.same_site_lax() {
            Some("Lax".to_string())
        } else {
            None
        };
        SetCookie {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
            expires: cookie.expires(),
            max_age: cookie.max_age(),
            secure: cookie.secure(),
            http_only: cookie.http_only(),
            same_site,
        }
    }
}

/// A cookie-jar record.
///
/// Holds the effective `domain` and `path` together with flags telling
/// whether each was explicitly specified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCookie {
    pub version: Option<i64>,
    pub name: String,
    pub value: Option<String>,
    pub domain: String,
    pub domain_specified: bool,
    pub port: Option<String>,
    pub port_specified: bool,
    pub path: String,
    pub path_specified: bool,
    pub secure: bool,
    pub discard: bool,
    pub expires: Option<i64>,
    pub comment: Option<String>,
    pub comment_url: Option<String>,
    pub rest: IndexMap<String, Value>,
}

impl RawCookie {
    /// Builds a jar record from a `Set-Cookie` received for `request_url`.
    ///
    /// Follows Netscape cookie rules: an explicit domain gains a leading dot,
    /// a missing domain falls back to the request host, a missing path falls
    /// back to the request path up to (not including) its last `/`, and
    /// `Max-Age` takes precedence over `Expires`. Cookies without an expiry
    /// are session cookies and get `discard` set.
    pub fn from_set_cookie(cookie: &SetCookie, request_url: &Url) -> Self {
        let (domain, domain_specified) = match cookie.domain.as_deref() {
            Some(d) if d.starts_with('.') => (d.to_string(), true),
            Some(d) => (format!(".{d}"), true),
            None => (request_url.host_str().unwrap_or_default().to_string(), false),
        };

        let (path, path_specified) = match cookie.path.as_deref() {
            Some(p) => (p.to_string(), true),
            None => (default_cookie_path(request_url), false),
        };

        let expires = match (cookie.max_age, cookie.expires) {
            (Some(max_age), _) => {
                let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
                Some(Utc::now().timestamp().saturating_add(max_age))
            }
            (None, Some(at)) => Some(system_time_to_secs(at)),
            (None, None) => None,
        };

        let mut rest = IndexMap::new();
        if cookie.http_only {
            rest.insert("HttpOnly".to_string(), Value::Null);
        }
        if let Some(same_site) = &cookie.same_site {
            rest.insert("SameSite".to_string(), Value::String(same_site.clone()));
        }

        RawCookie {
            version: Some(0),
            name: cookie.name.clone(),
            value: Some(cookie.value.clone()),
            domain,
            domain_specified,
            path,
            path_specified,
            secure: cookie.secure,
            discard: expires.is_none(),
            expires,
            rest,
            ..Default::default()
        }
    }

    /// Builds jar records from a `Cookie` request header sent to `url`.
    ///
    /// The header only carries names and values, so domain and path are the
    /// request's own and marked as not specified.
    pub fn from_cookie_header(header: &str, url: &Url) -> Vec<Self> {
        header
            .split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = match pair.split_once('=') {
                    Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
                    None => (pair, None),
                };
                RawCookie {
                    version: Some(0),
                    name: name.to_string(),
                    value,
                    domain: url.host_str().unwrap_or_default().to_string(),
                    path: default_cookie_path(url),
                    ..Default::default()
                }
            })
            .collect()
    }
}

fn default_cookie_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(i) if i > 0 => path[..i].to_string(),
        _ => "/".to_string(),
    }
}

fn system_time_to_secs(at: SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

impl HasCookieAttributes for RawCookie {
    fn version(&self) -> Option<i64> {
        self.version
    }
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
    fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
    fn domain(&self) -> Option<&str> {
        Some(&self.domain)
    }
    fn domain_specified(&self) -> bool {
        self.domain_specified
    }
    fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }
    fn port_specified(&self) -> bool {
        self.port_specified
    }
    fn path(&self) -> Option<&str> {
        Some(&self.path)
    }
    fn path_specified(&self) -> bool {
        self.path_specified
    }
    fn secure(&self) -> bool {
        self.secure
    }
    fn discard(&self) -> bool {
        self.discard
    }
    fn expires(&self) -> Option<i64> {
        self.expires
    }
    fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
    fn comment_url(&self) -> Option<&str> {
        self.comment_url.as_deref()
    }
    fn rest(&self) -> IndexMap<String, Value> {
        self.rest.clone()
    }
}

/// Structured representation of an HTTP cookie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CookieModel {
    pub version: Option<i64>,
    pub name: String,
    pub value: Option<Secret>,
    /// Present only when the cookie set it explicitly
    pub domain: Option<String>,
    /// Present only when the cookie set it explicitly
    pub port: Option<u16>,
    /// Present only when the cookie set it explicitly
    pub path: Option<String>,
    pub secure: bool,
    pub discard: bool,
    /// Absent for session cookies
    pub expires: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub comment_url: Option<String>,
    pub rest: IndexMap<String, Value>,
}

impl CookieModel {
    /// Creates a `CookieModel` from a cookie-jar record.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the name is missing, the specified port
    /// is not an integer in `0..=65535`, or the expiry is not a representable
    /// instant.
    pub fn from_cookiejar_cookie<C>(cookie: &C) -> Result<Self, ValidationError>
    where
        C: HasCookieAttributes + ?Sized,
    {
        let name = cookie
            .name()
            .ok_or_else(|| ValidationError::new("name", "field required"))?
            .to_string();

        let domain = if cookie.domain_specified() {
            cookie.domain().map(str::to_string)
        } else {
            None
        };

        let port = match (cookie.port_specified(), cookie.port()) {
            (true, Some(port)) => Some(parse_port(port)?),
            _ => None,
        };

        let path = if cookie.path_specified() {
            cookie.path().map(str::to_string)
        } else {
            None
        };

        let expires = cookie
            .expires()
            .map(|ts| {
                DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| {
                    ValidationError::new("expires", format!("timestamp {ts} is out of range"))
                })
            })
            .transpose()?;

        Ok(CookieModel {
            version: cookie.version(),
            name,
            value: cookie.value().map(Secret::new),
            domain,
            port,
            path,
            secure: cookie.secure(),
            discard: cookie.discard(),
            expires,
            comment: cookie.comment().map(str::to_string),
            comment_url: cookie.comment_url().map(str::to_string),
            rest: cookie.rest(),
        })
    }
}

fn parse_port(port: &str) -> Result<u16, ValidationError> {
    port.trim()
        .parse::<u16>()
        .map_err(|_| ValidationError::new("port", format!("'{port}' is not an integer between 0 and 65535")))
}
