//! Request parameters as supplied by the scenario runtime.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use serde_json::{Map, Value};

use crate::config::{
    PARAMS_ALIASES, PARAM_DATA, PARAM_FILES, PARAM_HEADERS, PARAM_PARAMS, PARAM_SESSION,
    PARAM_TIMEOUT, PARAM_URL, PARAM_VERIFY, VERIFY_ALIASES,
};
use crate::error_handling::ValidationError;
use crate::schema::{Content, FilesModel, HttpMethod, HttpUrl, RawRequest};
use crate::sessions::TlsVerify;

/// Validated parameters for one HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    /// Session name; the executor's default session when unset
    pub session: Option<String>,
    pub url: HttpUrl,
    pub headers: Vec<(String, String)>,
    /// Query parameters, repeated keys allowed
    pub params: Vec<(String, String)>,
    pub data: Option<Content>,
    pub timeout: Option<Duration>,
    pub files: FilesModel,
    pub verify: TlsVerify,
}

impl RequestParams {
    pub fn new(url: HttpUrl) -> Self {
        RequestParams {
            session: None,
            url,
            headers: Vec::new(),
            params: Vec::new(),
            data: None,
            timeout: None,
            files: FilesModel::default(),
            verify: TlsVerify::default(),
        }
    }

    /// Validates a resolved parameter mapping.
    ///
    /// Unrecognized keys are dropped. `query`/`queryParams` are accepted for
    /// `params`, `sslVerify`/`caBundle` for `verify`. A `null` value counts
    /// as not given.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first parameter that has the
    /// wrong type or fails its constraint, or `url` when it is missing.
    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut url = None;
        let mut session = None;
        let mut headers = Vec::new();
        let mut query = Vec::new();
        let mut data = None;
        let mut timeout = None;
        let mut files = FilesModel::default();
        let mut verify = TlsVerify::default();

        for (key, value) in mapping {
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                PARAM_SESSION => session = Some(parse_session(value)?),
                PARAM_URL => url = Some(parse_url(value)?),
                PARAM_HEADERS => headers = parse_headers(value)?,
                PARAM_DATA => data = Some(parse_data(value)?),
                PARAM_TIMEOUT => timeout = Some(parse_timeout(value)?),
                PARAM_FILES => {
                    files = serde_json::from_value(value.clone())
                        .map_err(|e| ValidationError::new(PARAM_FILES, e.to_string()))?
                }
                k if k == PARAM_PARAMS || PARAMS_ALIASES.contains(&k) => {
                    query.extend(parse_query(k, value)?)
                }
                k if k == PARAM_VERIFY || VERIFY_ALIASES.contains(&k) => {
                    verify = parse_verify(k, value)?
                }
                other => debug!("Dropping unrecognized request parameter '{}'", other),
            }
        }

        let url = url.ok_or_else(|| ValidationError::new(PARAM_URL, "field required"))?;
        Ok(RequestParams {
            session,
            url,
            headers,
            params: query,
            data,
            timeout,
            files,
            verify,
        })
    }

    /// Builds the unprepared transport request for `method`.
    pub fn to_raw_request(&self, method: HttpMethod) -> RawRequest {
        RawRequest {
            method: method.as_str().to_string(),
            url: self.url.to_string(),
            headers: self.headers.clone(),
            params: self.params.clone(),
            data: self.data.clone(),
            files: self.files.to_requests(),
        }
    }
}

fn parse_session(value: &Value) -> Result<String, ValidationError> {
    match value.as_str() {
        Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
        Some(_) => Err(ValidationError::new(PARAM_SESSION, "must not be empty")),
        None => Err(ValidationError::new(PARAM_SESSION, "expected a string")),
    }
}

fn parse_url(value: &Value) -> Result<HttpUrl, ValidationError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ValidationError::new(PARAM_URL, "expected a string"))?;
    HttpUrl::parse(raw).map_err(|e| ValidationError::new(PARAM_URL, e.to_string()))
}

/// Renders a scalar as its string form. `None` for anything else.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_headers(value: &Value) -> Result<Vec<(String, String)>, ValidationError> {
    let object = value
        .as_object()
        .ok_or_else(|| ValidationError::new(PARAM_HEADERS, "expected a mapping"))?;
    let mut headers = Vec::with_capacity(object.len());
    for (name, value) in object {
        if value.is_null() {
            continue;
        }
        let value = scalar_to_string(value).ok_or_else(|| {
            ValidationError::new(format!("{PARAM_HEADERS}.{name}"), "expected a scalar value")
        })?;
        headers.push((name.clone(), value));
    }
    Ok(headers)
}

fn parse_query(key: &str, value: &Value) -> Result<Vec<(String, String)>, ValidationError> {
    let object = value
        .as_object()
        .ok_or_else(|| ValidationError::new(key, "expected a mapping"))?;
    let mut pairs = Vec::with_capacity(object.len());
    for (name, value) in object {
        let invalid = || ValidationError::new(format!("{key}.{name}"), "expected a scalar or a list of scalars");
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    pairs.push((name.clone(), scalar_to_string(item).ok_or_else(invalid)?));
                }
            }
            other => pairs.push((name.clone(), scalar_to_string(other).ok_or_else(invalid)?)),
        }
    }
    Ok(pairs)
}

fn parse_data(value: &Value) -> Result<Content, ValidationError> {
    match value {
        Value::String(text) => Ok(Content::Text(text.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(Content::Bytes)
            .ok_or_else(|| ValidationError::new(PARAM_DATA, "byte values must be integers in 0..=255")),
        _ => Err(ValidationError::new(PARAM_DATA, "expected text or bytes")),
    }
}

fn parse_timeout(value: &Value) -> Result<Duration, ValidationError> {
    let seconds = value
        .as_f64()
        .ok_or_else(|| ValidationError::new(PARAM_TIMEOUT, "expected an integer or a float"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ValidationError::new(PARAM_TIMEOUT, "must be greater than 0"));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| ValidationError::new(PARAM_TIMEOUT, e.to_string()))
}

fn parse_verify(key: &str, value: &Value) -> Result<TlsVerify, ValidationError> {
    match value {
        Value::Bool(enabled) => Ok(TlsVerify::Enabled(*enabled)),
        Value::String(path) => {
            let path = PathBuf::from(path);
            if path.is_file() {
                Ok(TlsVerify::CaBundle(path))
            } else {
                Err(ValidationError::new(
                    key,
                    format!("CA bundle '{}' does not exist", path.display()),
                ))
            }
        }
        _ => Err(ValidationError::new(key, "expected a boolean or a file path")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test mapping must be an object"),
        }
    }

    #[test]
    fn test_minimal_mapping() {
        let params = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/"}))).unwrap();
        assert_eq!(params.url.as_str(), "https://example.com/");
        assert!(params.session.is_none());
        assert!(params.headers.is_empty());
        assert_eq!(params.verify, TlsVerify::Enabled(true));
        assert!(params.files.is_empty());
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let err = RequestParams::from_mapping(&mapping(json!({"headers": {}}))).unwrap_err();
        assert_eq!(err.field, "url");
        assert_eq!(err.message, "field required");
    }

    #[test]
    fn test_disallowed_scheme_is_rejected() {
        let err = RequestParams::from_mapping(&mapping(json!({"url": "ftp://example.com/"}))).unwrap_err();
        assert_eq!(err.field, "url");
        assert!(err.message.contains("ftp"));
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let params = RequestParams::from_mapping(&mapping(json!({
            "url": "https://example.com/",
            "retries": 3,
            "proxy": "http://proxy"
        })))
        .unwrap();
        assert_eq!(params, RequestParams::new(HttpUrl::parse("https://example.com/").unwrap()));
    }

    #[test]
    fn test_scalars_are_stringified() {
        let params = RequestParams::from_mapping(&mapping(json!({
            "url": "https://example.com/",
            "headers": {"X-Count": 3, "X-Flag": true, "X-Skip": null},
            "query": {"page": 2, "tag": ["a", "b"]}
        })))
        .unwrap();
        assert_eq!(
            params.headers,
            vec![
                ("X-Count".to_string(), "3".to_string()),
                ("X-Flag".to_string(), "true".to_string())
            ]
        );
        assert_eq!(
            params.params,
            vec![
                ("page".to_string(), "2".to_string()),
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string())
            ]
        );
    }

    #[test]
    fn test_nested_header_value_is_rejected() {
        let err = RequestParams::from_mapping(&mapping(json!({
            "url": "https://example.com/",
            "headers": {"X-Obj": {"a": 1}}
        })))
        .unwrap_err();
        assert_eq!(err.field, "headers.X-Obj");
    }

    #[test]
    fn test_timeout_accepts_int_and_float() {
        let int = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "timeout": 5}))).unwrap();
        assert_eq!(int.timeout, Some(Duration::from_secs(5)));
        let float = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "timeout": 0.25}))).unwrap();
        assert_eq!(float.timeout, Some(Duration::from_millis(250)));
        let err = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "timeout": "5"}))).unwrap_err();
        assert_eq!(err.field, "timeout");
        let err = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "timeout": 0}))).unwrap_err();
        assert_eq!(err.field, "timeout");
    }

    #[test]
    fn test_data_text_or_bytes() {
        let text = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "data": "hi"}))).unwrap();
        assert_eq!(text.data, Some(Content::Text("hi".to_string())));
        let bytes = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "data": [0, 255]}))).unwrap();
        assert_eq!(bytes.data, Some(Content::Bytes(vec![0, 255])));
        let err = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "data": [256]}))).unwrap_err();
        assert_eq!(err.field, "data");
    }

    #[test]
    fn test_files_are_validated() {
        let params = RequestParams::from_mapping(&mapping(json!({
            "url": "https://example.com/",
            "files": [{"name": "doc", "content": "hello"}]
        })))
        .unwrap();
        assert_eq!(params.files.files().len(), 1);

        let err = RequestParams::from_mapping(&mapping(json!({
            "url": "https://example.com/",
            "files": [{"name": "bad name", "content": "hello"}]
        })))
        .unwrap_err();
        assert_eq!(err.field, "files");
    }

    #[test]
    fn test_verify_aliases() {
        let off = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "sslVerify": false}))).unwrap();
        assert_eq!(off.verify, TlsVerify::Enabled(false));

        let mut bundle = tempfile::NamedTempFile::new().unwrap();
        writeln!(bundle, "-----BEGIN CERTIFICATE-----").unwrap();
        let path = bundle.path().to_string_lossy().into_owned();
        let ca = RequestParams::from_mapping(&mapping(json!({"url": "https://example.com/", "caBundle": path}))).unwrap();
        assert_eq!(ca.verify, TlsVerify::CaBundle(bundle.path().to_path_buf()));

        let err = RequestParams::from_mapping(&mapping(json!({
            "url": "https://example.com/",
            "verify": "/nonexistent/ca.pem"
        })))
        .unwrap_err();
        assert_eq!(err.field, "verify");
    }

    #[test]
    fn test_to_raw_request_carries_everything() {
        let params = RequestParams::from_mapping(&mapping(json!({
            "url": "https://example.com/upload",
            "params": {"a": 1},
            "headers": {"X-Id": "7"},
            "files": [{"name": "doc", "content": "hello", "mimetype": "text/csv"}]
        })))
        .unwrap();
        let raw = params.to_raw_request(HttpMethod::Post);
        assert_eq!(raw.method, "POST");
        assert_eq!(raw.url, "https://example.com/upload");
        assert_eq!(raw.params, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(raw.files.unwrap()["doc"].content_type, "text/csv");
    }
}
