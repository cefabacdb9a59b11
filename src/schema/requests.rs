//! HTTP request model and request sources.
//!
//! A `RawRequest` is what a caller asks for. Preparing it resolves the final
//! URL, merges headers, and serializes the body into a `PreparedRequest`,
//! which is what goes on the wire and what `RequestModel` snapshots.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;

use super::cookies::{CookieModel, HasCookieAttributes, RawCookie};
use super::files::{encode_multipart, Attachments, Content};
use super::headers::normalize_headers;
use super::urls::{HttpUrl, UrlModel};
use crate::error_handling::ValidationError;

/// Standard HTTP method tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIterMacro)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Actor name under which the method is exposed to scenarios.
    pub fn actor_name(&self) -> &'static str {
        match self {
            HttpMethod::Connect => "connect",
            HttpMethod::Delete => "delete",
            HttpMethod::Get => "get",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Patch => "patch",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Trace => "trace",
        }
    }

    /// One `(actor name, method)` pair per standard method.
    pub fn actors() -> Vec<(&'static str, HttpMethod)> {
        HttpMethod::iter().map(|m| (m.actor_name(), m)).collect()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(HttpMethod::Connect),
            "DELETE" => Ok(HttpMethod::Delete),
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "PATCH" => Ok(HttpMethod::Patch),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(ValidationError::new(
                "method",
                format!("'{other}' is not a standard HTTP method"),
            )),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Connect => reqwest::Method::CONNECT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Trace => reqwest::Method::TRACE,
        }
    }
}

/// Read access to a prepared request.
pub trait HasRequestAttributes {
    type Cookie: HasCookieAttributes;

    fn method(&self) -> Option<&str>;
    fn url(&self) -> Option<&str>;
    fn header_pairs(&self) -> Vec<(&str, &str)>;
    fn body(&self) -> Option<&Content>;
    /// Cookies attached to the request, when the source tracks them
    fn cookie_jar(&self) -> Option<&[Self::Cookie]>;
}

/// A request as sent: final URL, merged headers, serialized body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedRequest {
    pub method: Option<String>,
    pub url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Content>,
    pub cookies: Option<Vec<RawCookie>>,
}

impl PreparedRequest {
    /// Returns the first header value whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        set_header(&mut self.headers, name, value.into());
    }

    /// Removes every header with the given name.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }
}

impl HasRequestAttributes for PreparedRequest {
    type Cookie = RawCookie;

    fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn header_pairs(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    fn body(&self) -> Option<&Content> {
        self.body.as_ref()
    }

    fn cookie_jar(&self) -> Option<&[RawCookie]> {
        self.cookies.as_deref()
    }
}

/// Replaces the header case-insensitively in place, or appends it.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
        Some(entry) => *entry = (name.to_string(), value),
        None => headers.push((name.to_string(), value)),
    }
}

/// A request before preparation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    /// Method token; upper-cased during preparation
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the URL
    pub params: Vec<(String, String)>,
    pub data: Option<Content>,
    pub files: Option<Attachments>,
}

impl RawRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        RawRequest {
            method: method.as_str().to_string(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Prepares the request without session defaults.
    pub fn prepare(&self) -> Result<PreparedRequest, ValidationError> {
        self.prepare_with_defaults(&[])
    }

    /// Prepares the request on top of session default headers.
    ///
    /// Request headers override defaults with the same name (compared
    /// case-insensitively). Query parameters are appended to any query the
    /// URL already has. Attachments are encoded as `multipart/form-data`.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the URL is not an absolute http/https
    /// URL, or if both `data` and `files` are set.
    pub fn prepare_with_defaults(
        &self,
        defaults: &[(String, String)],
    ) -> Result<PreparedRequest, ValidationError> {
        let method = Some(self.method.trim().to_ascii_uppercase()).filter(|m| !m.is_empty());

        let mut url = HttpUrl::parse(&self.url)?.into_url();
        if !self.params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut headers = Vec::with_capacity(defaults.len() + self.headers.len());
        for (name, value) in defaults.iter().chain(self.headers.iter()) {
            set_header(&mut headers, name, value.clone());
        }

        let body = match (&self.data, &self.files) {
            (Some(_), Some(_)) => {
                return Err(ValidationError::new(
                    "data",
                    "raw data cannot be combined with files",
                ))
            }
            (None, Some(files)) if !files.is_empty() => {
                let (body, content_type) = encode_multipart(files);
                if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
                    headers.push(("Content-Type".to_string(), content_type));
                }
                Some(Content::Bytes(body))
            }
            (data, _) => data.clone(),
        };

        match &body {
            Some(content) => set_header(&mut headers, "Content-Length", content.len().to_string()),
            None => {
                let bodyless = matches!(method.as_deref(), Some("GET") | Some("HEAD") | None);
                let has_length = headers
                    .iter()
                    .any(|(k, _)| k.eq_ignore_ascii_case("content-length"));
                if !bodyless && !has_length {
                    headers.push(("Content-Length".to_string(), "0".to_string()));
                }
            }
        }

        Ok(PreparedRequest {
            method,
            url: Some(url.to_string()),
            headers,
            body,
            cookies: None,
        })
    }
}

/// Serializes optional bytes as standard base64.
pub(crate) mod base64_body {
    use base64::engine::general_purpose::STANDARD as B64;
    use base64::Engine;
    use serde::Serializer;

    pub fn serialize<S>(body: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match body {
            Some(bytes) => serializer.serialize_str(&B64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }
}

/// Structured snapshot of an HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestModel {
    pub method: HttpMethod,
    pub url_string: HttpUrl,
    pub url: UrlModel,
    /// Header names lower-cased
    pub headers: IndexMap<String, String>,
    pub cookies: Vec<CookieModel>,
    #[serde(with = "base64_body")]
    pub body: Option<Vec<u8>>,
    /// Set only when the body was provided as text
    pub text: Option<String>,
}

impl RequestModel {
    /// Creates a `RequestModel` from a prepared request.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the method is not a standard token, the
    /// URL is missing or invalid, or an attached cookie fails validation.
    pub fn from_request<R>(request: &R) -> Result<Self, ValidationError>
    where
        R: HasRequestAttributes + ?Sized,
    {
        let method = request.method().unwrap_or("GET").parse::<HttpMethod>()?;

        let url_string = match request.url() {
            Some(url) => HttpUrl::parse(url).map_err(|e| e.nested("url_string"))?,
            None => return Err(ValidationError::new("url_string", "field required")),
        };
        let url = UrlModel::from(&url_string);

        let headers = normalize_headers(request.header_pairs());

        let (body, text) = match request.body() {
            Some(Content::Text(text)) => (Some(text.as_bytes().to_vec()), Some(text.clone())),
            Some(Content::Bytes(bytes)) => (Some(bytes.clone()), None),
            None => (None, None),
        };

        let cookies = match request.cookie_jar() {
            Some(jar) => jar
                .iter()
                .enumerate()
                .map(|(i, cookie)| {
                    CookieModel::from_cookiejar_cookie(cookie)
                        .map_err(|e| e.nested(format!("cookies.{i}")))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(RequestModel {
            method,
            url_string,
            url,
            headers,
            cookies,
            body,
            text,
        })
    }

    /// Prepares an unprepared request, then snapshots it.
    pub fn from_raw_request(request: &RawRequest) -> Result<Self, ValidationError> {
        let prepared = request.prepare()?;
        Self::from_request(&prepared)
    }
}
