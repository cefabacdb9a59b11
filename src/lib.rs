//! loco_http library: HTTP actors for the loco scenario DSL
//!
//! This library runs HTTP calls through named, reusable client sessions and
//! returns every exchange as a validated, serializable model: the response,
//! the request that produced it, cookies, and the redirect history. Secrets
//! (cookie values, URL passwords) are masked when serialized.
//!
//! # Example
//!
//! ```no_run
//! use loco_http::{Config, Executor, HttpMethod};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = Executor::new(Config::default())?;
//!
//! let params = json!({
//!     "url": "https://example.com/api/items",
//!     "query": {"page": 2},
//!     "headers": {"Accept": "application/json"},
//! });
//! let response = executor
//!     .request(HttpMethod::Get, params.as_object().unwrap())
//!     .await?;
//! println!("{} {}", response["status"], response["request"]["url_string"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod actions;
pub mod config;
mod error_handling;
pub mod initialization;
pub mod instructions;
pub mod schema;
pub mod sessions;
mod user_agent;

// Re-export public API
pub use actions::{Executor, RequestParams};
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{
    categorize_reqwest_error, HttpError, InitializationError, InstructionError, SourceLocation,
    TransportErrorKind, ValidationError,
};
pub use initialization::{init_logger, init_logger_with};
pub use instructions::{UrlJoin, VariableLookup, URLJOIN_INSTRUCTION};
pub use schema::{
    CookieModel, FileModel, FilesModel, HttpMethod, HttpStatus, HttpUrl, RequestModel,
    ResponseModel, Secret, UrlModel,
};
pub use sessions::{Session, SessionManager, TlsVerify};
pub use user_agent::build_user_agent;

/// Namespace under which the plugin's actors and instructions are exposed.
pub const PLUGIN_NAMESPACE: &str = "http";
