//! HTTP response model and response sources.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use url::Url;

use super::cookies::{CookieModel, HasCookieAttributes, RawCookie, SetCookie};
use super::headers::{header_pairs, normalize_headers};
use super::requests::{base64_body, HasRequestAttributes, PreparedRequest, RequestModel};
use crate::error_handling::ValidationError;

/// A status code with a registered reason phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatus(u16);

impl HttpStatus {
    pub fn code(&self) -> u16 {
        self.0
    }

    /// Canonical reason phrase, e.g. `Not Found` for 404.
    pub fn reason(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.0)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.0)
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = ValidationError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        let known = reqwest::StatusCode::from_u16(code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .is_some();
        if known {
            Ok(HttpStatus(code))
        } else {
            Err(ValidationError::new(
                "status",
                format!("{code} is not a standard HTTP status"),
            ))
        }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}

impl Serialize for HttpStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u16(self.0)
    }
}

/// Read access to a received response.
pub trait HasResponseAttributes {
    type Request: HasRequestAttributes;
    type Cookie: HasCookieAttributes;

    fn status_code(&self) -> u16;
    fn header_pairs(&self) -> Vec<(&str, &str)>;
    fn content(&self) -> &[u8];
    /// Cookies set by this response
    fn cookies(&self) -> &[Self::Cookie];
    /// The request that produced this response
    fn request(&self) -> Option<&Self::Request>;
    /// Earlier responses in a redirect chain, oldest first
    fn history(&self) -> &[Self]
    where
        Self: Sized;

    /// Body decoded as text. Invalid UTF-8 sequences are replaced.
    fn text(&self) -> String {
        String::from_utf8_lossy(self.content()).into_owned()
    }
}

/// A response as received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub content: Vec<u8>,
    /// URL the response was received from
    pub url: Option<Url>,
    pub cookies: Vec<RawCookie>,
    pub request: Option<PreparedRequest>,
    pub history: Vec<RawResponse>,
}

impl RawResponse {
    /// Reads a `reqwest` response to completion.
    ///
    /// Cookies come from the response's `Set-Cookie` headers, resolved
    /// against the response URL.
    pub async fn capture(
        response: reqwest::Response,
        request: PreparedRequest,
    ) -> Result<Self, reqwest::Error> {
        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());
        let url = response.url().clone();
        let cookies = response
            .cookies()
            .map(|cookie| RawCookie::from_set_cookie(&SetCookie::from(&cookie), &url))
            .collect();
        let content = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            content,
            url: Some(url),
            cookies,
            request: Some(request),
            history: Vec::new(),
        })
    }

    /// Returns the first header value whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl HasResponseAttributes for RawResponse {
    type Request = PreparedRequest;
    type Cookie = RawCookie;

    fn status_code(&self) -> u16 {
        self.status
    }

    fn header_pairs(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    fn content(&self) -> &[u8] {
        &self.content
    }

    fn cookies(&self) -> &[RawCookie] {
        &self.cookies
    }

    fn request(&self) -> Option<&PreparedRequest> {
        self.request.as_ref()
    }

    fn history(&self) -> &[RawResponse] {
        &self.history
    }
}

/// Structured snapshot of an HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseModel {
    pub status: HttpStatus,
    /// Header names lower-cased
    pub headers: IndexMap<String, String>,
    pub cookies: Vec<CookieModel>,
    #[serde(with = "base64_body")]
    pub body: Option<Vec<u8>>,
    pub text: Option<String>,
    pub request: RequestModel,
    /// Redirect responses that preceded this one, oldest first
    pub history: Vec<ResponseModel>,
}

impl ResponseModel {
    /// Creates a `ResponseModel` from a received response.
    ///
    /// `body` and `text` are set only when the response has content. History
    /// entries are converted recursively and keep their order.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the status is not standard, the
    /// originating request is missing or invalid, or any cookie or history
    /// entry fails validation.
    pub fn from_response<R>(response: &R) -> Result<Self, ValidationError>
    where
        R: HasResponseAttributes,
    {
        let status = HttpStatus::try_from(response.status_code())?;
        let headers = normalize_headers(response.header_pairs());

        let cookies = response
            .cookies()
            .iter()
            .enumerate()
            .map(|(i, cookie)| {
                CookieModel::from_cookiejar_cookie(cookie)
                    .map_err(|e| e.nested(format!("cookies.{i}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (body, text) = if response.content().is_empty() {
            (None, None)
        } else {
            (Some(response.content().to_vec()), Some(response.text()))
        };

        let request = match response.request() {
            Some(request) => RequestModel::from_request(request).map_err(|e| e.nested("request"))?,
            None => return Err(ValidationError::new("request", "field required")),
        };

        let history = response
            .history()
            .iter()
            .enumerate()
            .map(|(i, hop)| Self::from_response(hop).map_err(|e| e.nested(format!("history.{i}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResponseModel {
            status,
            headers,
            cookies,
            body,
            text,
            request,
            history,
        })
    }
}
