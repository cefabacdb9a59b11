//! Configuration constants.
//!
//! This module defines the constants used throughout the crate: session
//! defaults, redirect limits, content-type fallbacks, validation patterns and
//! the recognized request parameter names.

/// Name of the session used when a call does not select one.
pub const DEFAULT_SESSION_NAME: &str = "default";

/// Maximum number of redirect hops followed before giving up.
pub const MAX_REDIRECT_HOPS: usize = 30;

/// Name of the host framework reported in the identification header.
pub const DEFAULT_FRAMEWORK_NAME: &str = "loco";

/// Version of the host framework reported when the host does not supply one.
pub const DEFAULT_FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of this plugin, as reported in the identification header.
pub const PLUGIN_NAME: &str = env!("CARGO_PKG_NAME");

/// Version of this plugin, as reported in the identification header.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the transport library, as reported in the identification header.
pub const TRANSPORT_NAME: &str = "reqwest";

/// Version line of the transport library. Keep in sync with Cargo.toml.
pub const TRANSPORT_VERSION: &str = "0.12";

/// Placeholder rendered instead of a secret value.
pub const SECRET_MASK: &str = "**********";

// Content types
/// Content type used for byte attachments without an explicit mimetype.
pub const OCTET_STREAM: &str = "application/octet-stream";
/// Content type used for text attachments without an explicit mimetype.
pub const TEXT_PLAIN: &str = "text/plain";

// Validation patterns
/// Characters allowed in multipart field names and filenames.
pub const SIMPLE_CHARS: &str = r"[a-zA-Z0-9_\-\.]+";

// Recognized request parameters
pub const PARAM_SESSION: &str = "session";
pub const PARAM_URL: &str = "url";
pub const PARAM_HEADERS: &str = "headers";
pub const PARAM_PARAMS: &str = "params";
pub const PARAM_DATA: &str = "data";
pub const PARAM_TIMEOUT: &str = "timeout";
pub const PARAM_FILES: &str = "files";
pub const PARAM_VERIFY: &str = "verify";

/// Accepted aliases for the query parameter mapping.
pub const PARAMS_ALIASES: &[&str] = &["query", "queryParams"];

/// Accepted aliases for the TLS verification setting.
pub const VERIFY_ALIASES: &[&str] = &["sslVerify", "caBundle"];
