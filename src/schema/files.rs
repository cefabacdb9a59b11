//! Multipart file attachment models.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{OCTET_STREAM, SIMPLE_CHARS, TEXT_PLAIN};
use crate::error_handling::ValidationError;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{SIMPLE_CHARS}$")).expect("valid name pattern"));
static MIMETYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{SIMPLE_CHARS}/{SIMPLE_CHARS}$")).expect("valid mimetype pattern")
});

/// Text or raw bytes.
///
/// Used for file contents and request bodies, where the distinction decides
/// the default content type and whether a decoded `text` is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
}

impl Content {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Bytes(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Content::Text(text) => text.into_bytes(),
            Content::Bytes(bytes) => bytes,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Content::Text(_))
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::Bytes(value)
    }
}

/// Unvalidated file descriptor, as found in a parameter mapping.
#[derive(Debug, Clone, Deserialize)]
struct FileEntry {
    name: String,
    content: Content,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    mimetype: Option<String>,
}

/// One multipart file field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FileEntry")]
pub struct FileModel {
    name: String,
    content: Content,
    filename: Option<String>,
    mimetype: Option<String>,
}

impl FileModel {
    /// Creates a validated file field.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if `name` or `filename` contain characters
    /// outside `[A-Za-z0-9_.-]`, or `mimetype` is not of the form
    /// `type/subtype`.
    pub fn new(
        name: impl Into<String>,
        content: impl Into<Content>,
        filename: Option<String>,
        mimetype: Option<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if !NAME_PATTERN.is_match(&name) {
            return Err(ValidationError::new(
                "name",
                format!("'{name}' does not match pattern ^{SIMPLE_CHARS}$"),
            ));
        }
        if let Some(filename) = &filename {
            if !NAME_PATTERN.is_match(filename) {
                return Err(ValidationError::new(
                    "filename",
                    format!("'{filename}' does not match pattern ^{SIMPLE_CHARS}$"),
                ));
            }
        }
        if let Some(mimetype) = &mimetype {
            if !MIMETYPE_PATTERN.is_match(mimetype) {
                return Err(ValidationError::new(
                    "mimetype",
                    format!("'{mimetype}' is not a type/subtype pair"),
                ));
            }
        }
        Ok(FileModel {
            name,
            content: content.into(),
            filename,
            mimetype,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn mimetype(&self) -> Option<&str> {
        self.mimetype.as_deref()
    }

    /// Resolves the content type: explicit mimetype, then
    /// `application/octet-stream` for bytes, then `text/plain` for text.
    pub fn content_type(&self) -> &str {
        if let Some(mimetype) = &self.mimetype {
            return mimetype;
        }
        match self.content {
            Content::Bytes(_) => OCTET_STREAM,
            Content::Text(_) => TEXT_PLAIN,
        }
    }

    /// Filename reported in the multipart payload.
    pub fn effective_filename(&self) -> &str {
        self.filename.as_deref().unwrap_or(&self.name)
    }
}

impl TryFrom<FileEntry> for FileModel {
    type Error = ValidationError;

    fn try_from(entry: FileEntry) -> Result<Self, Self::Error> {
        FileModel::new(entry.name, entry.content, entry.filename, entry.mimetype)
    }
}

/// A file ready for the multipart encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Content,
    pub content_type: String,
}

/// Attachments keyed by form field name.
pub type Attachments = IndexMap<String, Attachment>;

/// Ordered collection of file fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FilesModel(Vec<FileModel>);

impl FilesModel {
    pub fn new(files: Vec<FileModel>) -> Self {
        FilesModel(files)
    }

    pub fn files(&self) -> &[FileModel] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the files into transport attachments.
    ///
    /// Returns `None` for an empty collection so no multipart body is sent.
    /// A field name used twice keeps the later file.
    pub fn to_requests(&self) -> Option<Attachments> {
        if self.0.is_empty() {
            return None;
        }
        Some(
            self.0
                .iter()
                .map(|file| {
                    (
                        file.name.clone(),
                        Attachment {
                            filename: file.effective_filename().to_string(),
                            content: file.content.clone(),
                            content_type: file.content_type().to_string(),
                        },
                    )
                })
                .collect(),
        )
    }
}

impl Serialize for FilesModel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.0.is_empty() {
            serializer.serialize_none()
        } else {
            self.0.serialize(serializer)
        }
    }
}

/// Encodes attachments as a `multipart/form-data` body.
///
/// Returns the body and the matching `Content-Type` header value.
pub fn encode_multipart(attachments: &Attachments) -> (Vec<u8>, String) {
    let boundary = format!("{:032x}", rand::random::<u128>());
    let mut body = Vec::new();
    for (name, attachment) in attachments {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
                attachment.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", attachment.content_type).as_bytes());
        body.extend_from_slice(attachment.content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (body, format!("multipart/form-data; boundary={boundary}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_type_resolution_order() {
        let explicit = FileModel::new("f", b"\x00\x01".to_vec(), None, Some("image/png".into())).unwrap();
        assert_eq!(explicit.content_type(), "image/png");

        let bytes = FileModel::new("f", b"\x00\x01".to_vec(), None, None).unwrap();
        assert_eq!(bytes.content_type(), OCTET_STREAM);

        let text = FileModel::new("f", "hello", None, None).unwrap();
        assert_eq!(text.content_type(), TEXT_PLAIN);
    }

    #[test]
    fn test_empty_files_convert_to_none() {
        assert!(FilesModel::default().to_requests().is_none());
        assert_eq!(serde_json::to_value(FilesModel::default()).unwrap(), json!(null));
    }

    #[test]
    fn test_filename_defaults_to_field_name() {
        let files = FilesModel::new(vec![FileModel::new("report", "a,b", None, None).unwrap()]);
        let attachments = files.to_requests().unwrap();
        let attachment = &attachments["report"];
        assert_eq!(attachment.filename, "report");
        assert_eq!(attachment.content, Content::Text("a,b".to_string()));
        assert_eq!(attachment.content_type, TEXT_PLAIN);
    }

    #[test]
    fn test_explicit_filename_is_used() {
        let files = FilesModel::new(vec![FileModel::new(
            "upload",
            "a,b",
            Some("data.csv".to_string()),
            Some("text/csv".to_string()),
        )
        .unwrap()]);
        let attachments = files.to_requests().unwrap();
        assert_eq!(attachments["upload"].filename, "data.csv");
        assert_eq!(attachments["upload"].content_type, "text/csv");
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let err = FileModel::new("bad name", "x", None, None).unwrap_err();
        assert_eq!(err.field, "name");
        let err = FileModel::new("etc", "x", Some("a/b".to_string()), None).unwrap_err();
        assert_eq!(err.field, "filename");
    }

    #[test]
    fn test_invalid_mimetype_is_rejected() {
        let err = FileModel::new("f", "x", None, Some("textplain".to_string())).unwrap_err();
        assert_eq!(err.field, "mimetype");
        let err = FileModel::new("f", "x", None, Some("text/plain; charset=utf-8".to_string())).unwrap_err();
        assert_eq!(err.field, "mimetype");
    }

    #[test]
    fn test_deserialize_validates_and_ignores_unknown_fields() {
        let files: FilesModel = serde_json::from_value(json!([
            {"name": "a", "content": "text", "extra": true},
            {"name": "b", "content": [1, 2, 3], "filename": "b.bin"}
        ]))
        .unwrap();
        assert_eq!(files.files().len(), 2);
        assert_eq!(files.files()[1].content(), &Content::Bytes(vec![1, 2, 3]));
        assert_eq!(files.files()[1].content_type(), OCTET_STREAM);

        let bad = serde_json::from_value::<FilesModel>(json!([{"name": "a b", "content": "x"}]));
        assert!(bad.is_err());
    }

    #[test]
    fn test_encode_multipart() {
        let files = FilesModel::new(vec![FileModel::new("doc", "hello", Some("doc.txt".into()), None).unwrap()]);
        let (body, content_type) = encode_multipart(&files.to_requests().unwrap());
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap();
        let body = String::from_utf8(body).unwrap();
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.contains("Content-Disposition: form-data; name=\"doc\"; filename=\"doc.txt\"\r\n"));
        assert!(body.contains("Content-Type: text/plain\r\n\r\nhello\r\n"));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }
}
