//! HTTP redirect chain following.
//!
//! Session clients have automatic redirects disabled. This module follows the
//! chain itself so every hop is kept as a response in the final history.

use std::time::Duration;

use log::debug;
use url::Url;

use crate::error_handling::{HttpError, ValidationError};
use crate::schema::{PreparedRequest, RawResponse};
use crate::sessions::Session;

/// Status codes that carry a `Location` to follow.
const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Sends `request` and follows redirects up to `max_hops` times.
///
/// The returned response is the first non-redirect one, with every redirect
/// response that led to it in `history`, oldest first. The redirect
/// responses themselves keep an empty `history`.
///
/// # Errors
///
/// Returns `HttpError::TooManyRedirects` when the chain is longer than
/// `max_hops`, a `Validation` error for an unusable `Location`, and any
/// transport failure unchanged.
pub async fn send_following_redirects(
    session: &Session,
    client: &reqwest::Client,
    request: PreparedRequest,
    timeout: Option<Duration>,
    max_hops: usize,
) -> Result<RawResponse, HttpError> {
    let mut history: Vec<RawResponse> = Vec::new();
    let mut current = request;

    loop {
        let response = session.send(client, &current, timeout).await?;

        let Some(mut next) = next_hop(&response, &current)? else {
            let mut response = response;
            response.history = history;
            return Ok(response);
        };

        if history.len() >= max_hops {
            return Err(HttpError::TooManyRedirects(max_hops));
        }

        debug!(
            "Redirect {} -> {} ({})",
            current.url.as_deref().unwrap_or_default(),
            next.url.as_deref().unwrap_or_default(),
            response.status
        );

        next.remove_header("cookie");
        session.attach_cookies(&mut next);
        history.push(response);
        current = next;
    }
}

/// Builds the request for the next hop, or `None` if `response` ends the chain.
fn next_hop(
    response: &RawResponse,
    previous: &PreparedRequest,
) -> Result<Option<PreparedRequest>, ValidationError> {
    if !REDIRECT_STATUSES.contains(&response.status) {
        return Ok(None);
    }
    let Some(location) = response.header("location") else {
        log::warn!(
            "Redirect status {} for {} but no Location header",
            response.status,
            previous.url.as_deref().unwrap_or_default()
        );
        return Ok(None);
    };

    let base = match &response.url {
        Some(url) => url.clone(),
        None => Url::parse(previous.url.as_deref().unwrap_or_default())
            .map_err(|e| ValidationError::new("url", e.to_string()))?,
    };
    let mut target = base.join(location).map_err(|e| {
        ValidationError::new("location", format!("cannot follow '{location}': {e}"))
    })?;
    if target.fragment().is_none() {
        target.set_fragment(base.fragment());
    }
    if !matches!(target.scheme(), "http" | "https") {
        return Err(ValidationError::new(
            "location",
            format!("refusing to follow redirect to '{target}'"),
        ));
    }

    let mut next = previous.clone();
    let method = previous.method.as_deref().unwrap_or("GET");
    let switch_to_get = match response.status {
        302 | 303 => method != "HEAD",
        301 => method == "POST",
        _ => false,
    };
    if switch_to_get {
        next.method = Some("GET".to_string());
    }

    // only 307/308 replay the body
    if !matches!(response.status, 307 | 308) {
        next.body = None;
        next.remove_header("content-length");
        next.remove_header("content-type");
        next.remove_header("transfer-encoding");
    }

    let same_host = Url::parse(previous.url.as_deref().unwrap_or_default())
        .map(|prev| prev.host_str() == target.host_str())
        .unwrap_or(false);
    if !same_host {
        next.remove_header("authorization");
    }

    next.url = Some(target.to_string());
    next.cookies = None;
    Ok(Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Content;

    fn redirect(status: u16, from: &str, location: &str) -> RawResponse {
        RawResponse {
            status,
            headers: vec![("location".to_string(), location.to_string())],
            content: Vec::new(),
            url: Url::parse(from).ok(),
            cookies: Vec::new(),
            request: None,
            history: Vec::new(),
        }
    }

    fn post(url: &str) -> PreparedRequest {
        PreparedRequest {
            method: Some("POST".to_string()),
            url: Some(url.to_string()),
            headers: vec![
                ("Content-Type".to_string(), "text/plain".to_string()),
                ("Content-Length".to_string(), "4".to_string()),
                ("Authorization".to_string(), "Bearer t".to_string()),
            ],
            body: Some(Content::from("data")),
            cookies: None,
        }
    }

    #[test]
    fn test_non_redirect_ends_chain() {
        let mut response = redirect(200, "https://example.com/a", "/b");
        assert!(next_hop(&response, &post("https://example.com/a")).unwrap().is_none());
        response.status = 304;
        assert!(next_hop(&response, &post("https://example.com/a")).unwrap().is_none());
    }

    #[test]
    fn test_missing_location_ends_chain() {
        let mut response = redirect(302, "https://example.com/a", "/b");
        response.headers.clear();
        assert!(next_hop(&response, &post("https://example.com/a")).unwrap().is_none());
    }

    #[test]
    fn test_see_other_switches_to_get_and_drops_body() {
        let response = redirect(303, "https://example.com/form", "/done");
        let next = next_hop(&response, &post("https://example.com/form")).unwrap().unwrap();
        assert_eq!(next.method.as_deref(), Some("GET"));
        assert_eq!(next.url.as_deref(), Some("https://example.com/done"));
        assert!(next.body.is_none());
        assert!(next.header("content-type").is_none());
        assert!(next.header("content-length").is_none());
        assert_eq!(next.header("authorization"), Some("Bearer t"));
    }

    #[test]
    fn test_found_switches_any_method_but_head_to_get() {
        let response = redirect(302, "https://example.com/a", "/b");
        let mut put = post("https://example.com/a");
        put.method = Some("PUT".to_string());
        let next = next_hop(&response, &put).unwrap().unwrap();
        assert_eq!(next.method.as_deref(), Some("GET"));
        assert!(next.body.is_none());

        let mut head = post("https://example.com/a");
        head.method = Some("HEAD".to_string());
        let next = next_hop(&response, &head).unwrap().unwrap();
        assert_eq!(next.method.as_deref(), Some("HEAD"));
    }

    #[test]
    fn test_moved_permanently_only_rewrites_post() {
        let response = redirect(301, "https://example.com/a", "/b");
        let next = next_hop(&response, &post("https://example.com/a")).unwrap().unwrap();
        assert_eq!(next.method.as_deref(), Some("GET"));

        let mut put = post("https://example.com/a");
        put.method = Some("PUT".to_string());
        let next = next_hop(&response, &put).unwrap().unwrap();
        assert_eq!(next.method.as_deref(), Some("PUT"));
    }

    #[test]
    fn test_temporary_redirect_replays_method_and_body() {
        let response = redirect(307, "https://example.com/a", "https://example.com/b");
        let next = next_hop(&response, &post("https://example.com/a")).unwrap().unwrap();
        assert_eq!(next.method.as_deref(), Some("POST"));
        assert_eq!(next.body, Some(Content::from("data")));
        assert_eq!(next.header("content-length"), Some("4"));
    }

    #[test]
    fn test_cross_host_redirect_drops_authorization() {
        let response = redirect(308, "https://example.com/a", "https://other.example.org/b");
        let next = next_hop(&response, &post("https://example.com/a")).unwrap().unwrap();
        assert!(next.header("authorization").is_none());
    }

    #[test]
    fn test_non_http_location_is_rejected() {
        let response = redirect(302, "https://example.com/a", "ftp://example.com/file");
        let err = next_hop(&response, &post("https://example.com/a")).unwrap_err();
        assert_eq!(err.field, "location");
    }
}
