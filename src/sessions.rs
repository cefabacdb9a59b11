//! Named HTTP sessions.
//!
//! A `Session` owns a transport client, default headers (the identification
//! header) and a cookie jar shared by every request made through it. The jar
//! decides which cookies go with a request; the session also keeps the full
//! record of each stored cookie so requests report its attributes. The `SessionManager` maps session names to sessions, creating each on
//! first use and returning the same instance afterwards.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error_handling::{HttpError, InitializationError, ValidationError};
use crate::initialization::init_session_client;
use crate::schema::{PreparedRequest, RawCookie, RawRequest, RawResponse};
use crate::user_agent::build_user_agent;

/// Certificate verification policy for a call.
///
/// Deserializes from either a boolean or a path to a PEM CA bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TlsVerify {
    Enabled(bool),
    CaBundle(PathBuf),
}

impl Default for TlsVerify {
    fn default() -> Self {
        TlsVerify::Enabled(true)
    }
}

/// A reusable HTTP client context.
#[derive(Debug)]
pub struct Session {
    name: String,
    client: reqwest::Client,
    headers: Vec<(String, String)>,
    jar: Arc<Jar>,
    records: Mutex<Vec<RawCookie>>,
}

impl Session {
    /// Creates a session that identifies itself with `user_agent`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the transport client
    /// cannot be built.
    pub fn new(name: impl Into<String>, user_agent: &str) -> Result<Self, InitializationError> {
        let client = init_session_client(&TlsVerify::default())?;
        Ok(Session {
            name: name.into(),
            client,
            headers: vec![("User-Agent".to_string(), user_agent.to_string())],
            jar: Arc::new(Jar::default()),
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default headers applied to every request, before request headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("user-agent"))
            .map(|(_, v)| v.as_str())
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The `Cookie` header value the jar holds for `url`, if any.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Prepares `request` with this session's default headers and cookies.
    pub fn prepare(&self, request: &RawRequest) -> Result<PreparedRequest, ValidationError> {
        let mut prepared = request.prepare_with_defaults(&self.headers)?;
        self.attach_cookies(&mut prepared);
        Ok(prepared)
    }

    /// Adds the jar's cookies for the request URL.
    ///
    /// An explicit `Cookie` header on the request is left as is. The cookie
    /// records always mirror whatever `Cookie` header ends up being sent:
    /// a pair the session stored keeps its full record, any other pair only
    /// has a name and value.
    pub(crate) fn attach_cookies(&self, prepared: &mut PreparedRequest) {
        let Some(url) = prepared.url.as_deref().and_then(|u| Url::parse(u).ok()) else {
            return;
        };
        if prepared.header("cookie").is_none() {
            if let Some(header) = self.cookie_header(&url) {
                prepared.set_header("Cookie", header);
            }
        }
        let sent = prepared
            .header("cookie")
            .map(|header| RawCookie::from_cookie_header(header, &url))
            .unwrap_or_default();
        let records = self.lock_records();
        let cookies = sent
            .into_iter()
            .map(|pair| {
                records
                    .iter()
                    .rev()
                    .find(|stored| stored.name == pair.name && stored.value == pair.value)
                    .cloned()
                    .unwrap_or(pair)
            })
            .collect();
        prepared.cookies = Some(cookies);
    }

    /// Stores cookies set by a response received from `url`.
    ///
    /// `set_cookies` are the raw `Set-Cookie` lines, which fill the jar.
    /// `records` are the same cookies as parsed jar records.
    pub(crate) fn store_cookies(
        &self,
        url: &Url,
        set_cookies: &[HeaderValue],
        records: &[RawCookie],
    ) {
        if set_cookies.is_empty() {
            return;
        }
        debug!(
            "Session '{}' stored {} cookie(s) from {}",
            self.name,
            set_cookies.len(),
            url
        );
        self.jar.set_cookies(&mut set_cookies.iter(), url);

        let now = chrono::Utc::now().timestamp();
        let mut stored = self.lock_records();
        for record in records {
            stored.retain(|c| {
                !(c.name == record.name && c.domain == record.domain && c.path == record.path)
            });
            if record.expires.map_or(true, |at| at > now) {
                stored.push(record.clone());
            }
        }
    }

    fn lock_records(&self) -> MutexGuard<'_, Vec<RawCookie>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The client to use under `verify`.
    ///
    /// The session's own client verifies certificates against the system
    /// roots. Any other policy gets a dedicated client for the call.
    pub(crate) fn client_for(
        &self,
        verify: &TlsVerify,
    ) -> Result<Cow<'_, reqwest::Client>, InitializationError> {
        match verify {
            TlsVerify::Enabled(true) => Ok(Cow::Borrowed(&self.client)),
            other => init_session_client(other).map(Cow::Owned),
        }
    }

    /// Sends one request without following redirects.
    ///
    /// Cookies set by the response are stored in the jar before returning.
    pub(crate) async fn send(
        &self,
        client: &reqwest::Client,
        prepared: &PreparedRequest,
        timeout: Option<Duration>,
    ) -> Result<RawResponse, HttpError> {
        let request = to_transport_request(client, prepared, timeout)?;
        let response = client.execute(request).await?;
        let url = response.url().clone();
        let set_cookies: Vec<HeaderValue> =
            response.headers().get_all(SET_COOKIE).iter().cloned().collect();
        let raw = RawResponse::capture(response, prepared.clone()).await?;
        self.store_cookies(&url, &set_cookies, &raw.cookies);
        Ok(raw)
    }
}

/// Converts a prepared request into a `reqwest` request, byte for byte.
fn to_transport_request(
    client: &reqwest::Client,
    prepared: &PreparedRequest,
    timeout: Option<Duration>,
) -> Result<reqwest::Request, HttpError> {
    let method = prepared.method.as_deref().unwrap_or("GET");
    let method = reqwest::Method::from_bytes(method.as_bytes())
        .map_err(|_| ValidationError::new("method", format!("invalid method token '{method}'")))?;

    let url = prepared
        .url
        .as_deref()
        .ok_or_else(|| ValidationError::new("url", "field required"))?;
    let url = Url::parse(url).map_err(|e| ValidationError::new("url", e.to_string()))?;

    let mut headers = HeaderMap::new();
    for (name, value) in &prepared.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ValidationError::new(format!("headers.{name}"), e.to_string()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| ValidationError::new(format!("headers.{name}"), e.to_string()))?;
        headers.append(header_name, header_value);
    }

    let mut builder = client.request(method, url).headers(headers);
    if let Some(body) = &prepared.body {
        builder = builder.body(body.as_bytes().to_vec());
    }
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Registry of named sessions.
///
/// Lookup and creation happen under one lock, so concurrent first use of a
/// name still yields exactly one session.
#[derive(Debug)]
pub struct SessionManager {
    user_agent: String,
    sessions: Mutex<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    /// Creates an empty registry whose sessions identify as `user_agent`.
    pub fn new(user_agent: impl Into<String>) -> Self {
        SessionManager {
            user_agent: user_agent.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an empty registry using the host framework named in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(build_user_agent(
            &config.framework_name,
            &config.framework_version,
        ))
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the session registered under `name`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an `InitializationError` if a new session's client cannot be
    /// built. Nothing is registered in that case.
    pub fn get_session(&self, name: &str) -> Result<Arc<Session>, InitializationError> {
        let mut sessions = self.lock();
        if let Some(session) = sessions.get(name) {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(Session::new(name, &self.user_agent)?);
        debug!("Created session '{}'", name);
        sessions.insert(name.to_string(), Arc::clone(&session));
        Ok(session)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registered session names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drops every registered session.
    ///
    /// Sessions still held by callers stay usable; the next lookup of their
    /// name creates a fresh one.
    pub fn reset(&self) {
        let mut sessions = self.lock();
        debug!("Dropping {} session(s)", sessions.len());
        sessions.clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
