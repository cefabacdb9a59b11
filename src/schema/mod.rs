//! Data models for HTTP requests and responses.
//!
//! Each model is built from a source object through an adapter trait
//! (`HasCookieAttributes`, `HasRequestAttributes`, `HasResponseAttributes`)
//! and validated on construction. Models serialize to JSON with secrets
//! masked and bodies base64-encoded.

mod cookies;
mod files;
mod headers;
mod requests;
mod responses;
mod secret;
mod urls;

// Re-export public API
pub use cookies::{CookieModel, HasCookieAttributes, RawCookie, SetCookie};
pub use files::{encode_multipart, Attachment, Attachments, Content, FileModel, FilesModel};
pub use headers::normalize_headers;
pub use requests::{HasRequestAttributes, HttpMethod, PreparedRequest, RawRequest, RequestModel};
pub use responses::{HasResponseAttributes, HttpStatus, RawResponse, ResponseModel};
pub use secret::Secret;
pub use urls::{HttpUrl, Scheme, UrlModel};
