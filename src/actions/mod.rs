//! HTTP request execution.
//!
//! This module provides:
//! - Parameter validation for scenario-supplied mappings
//! - The executor that runs one HTTP call through a named session
//! - Redirect following with per-hop history

mod params;
mod redirects;

use std::sync::Arc;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error_handling::{HttpError, ValidationError};
use crate::schema::{HttpMethod, ResponseModel};
use crate::sessions::SessionManager;

// Re-export public API
pub use params::RequestParams;
pub use redirects::send_following_redirects;

/// Runs HTTP calls on behalf of scenario steps.
///
/// Cloning is cheap; clones share the session registry.
#[derive(Debug, Clone)]
pub struct Executor {
    sessions: Arc<SessionManager>,
    config: Config,
}

impl Executor {
    /// Creates an executor with its own session registry.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if `config` does not validate.
    pub fn new(config: Config) -> Result<Self, ValidationError> {
        let sessions = Arc::new(SessionManager::from_config(&config));
        Self::with_sessions(config, sessions)
    }

    /// Creates an executor on top of an existing session registry.
    pub fn with_sessions(
        config: Config,
        sessions: Arc<SessionManager>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Executor { sessions, config })
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs `method` with a resolved parameter mapping and returns the
    /// response as a plain mapping.
    ///
    /// Secrets in the result are masked.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Validation` for bad parameters or an invalid
    /// response, and the transport, redirect or session error otherwise.
    pub async fn request(
        &self,
        method: HttpMethod,
        params: &Map<String, Value>,
    ) -> Result<Value, HttpError> {
        let params = RequestParams::from_mapping(params)?;
        let response = self.execute(method, params).await?;
        Ok(serde_json::to_value(&response)?)
    }

    /// Runs `method` with validated parameters.
    pub async fn execute(
        &self,
        method: HttpMethod,
        params: RequestParams,
    ) -> Result<ResponseModel, HttpError> {
        let session_name = params
            .session
            .as_deref()
            .unwrap_or(self.config.default_session.as_str());
        let session = self.sessions.get_session(session_name)?;
        let client = session.client_for(&params.verify)?;
        let prepared = session.prepare(&params.to_raw_request(method))?;
        let timeout = params.timeout.or(self.config.timeout);

        debug!("{} {} (session '{}')", method, params.url, session_name);

        let raw = send_following_redirects(
            &session,
            &client,
            prepared,
            timeout,
            self.config.max_redirects,
        )
        .await
        .inspect_err(|e| match e {
            HttpError::Transport { kind, source } => {
                warn!("{} {} failed ({}): {}", method, params.url, kind, source)
            }
            other => warn!("{} {} failed: {}", method, params.url, other),
        })?;

        debug!(
            "{} {} -> {} after {} redirect(s)",
            method,
            params.url,
            raw.status,
            raw.history.len()
        );

        Ok(ResponseModel::from_response(&raw)?)
    }
}
