//! Scenario instructions provided by the plugin.
//!
//! `urljoin` composes a URL when the step runs: it reads a base URL from the
//! execution context and joins a literal postfix onto it. The instruction
//! text is `<variable path> <postfix>`, e.g. `config.base_url v1/items`.

use serde_json::{Map, Value};
use url::{ParseError, Position, Url};

use crate::error_handling::{InstructionError, SourceLocation, ValidationError};

/// Name under which the URL-join instruction is registered.
pub const URLJOIN_INSTRUCTION: &str = "urljoin";

/// Stand-in origin for joining onto a relative base.
const RELATIVE_ANCHOR: &str = "http://relative.invalid/";

/// A dotted path into the execution context, e.g. `env.hosts.0.url`.
///
/// Numeric segments index into lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLookup {
    path: String,
    segments: Vec<String>,
}

impl VariableLookup {
    /// Parses a dotted path.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the path is empty or has an empty or
    /// non-identifier segment.
    pub fn parse(path: &str) -> Result<Self, ValidationError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        let valid = segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });
        if !valid {
            return Err(ValidationError::new(
                "path",
                format!("'{path}' is not a valid variable path"),
            ));
        }
        Ok(VariableLookup {
            path: path.to_string(),
            segments,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolves the path in `context`. `None` if any segment is missing.
    pub fn lookup<'a>(&self, context: &'a Map<String, Value>) -> Option<&'a Value> {
        let (first, rest) = self.segments.split_first()?;
        rest.iter()
            .try_fold(context.get(first)?, |value, segment| match value {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }
}

/// Whether a looked-up value counts as present.
///
/// `null`, `false`, zero, and empty strings or collections do not.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// A parsed `urljoin` instruction, resolved lazily against a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlJoin {
    lookup: VariableLookup,
    postfix: String,
    location: SourceLocation,
}

impl UrlJoin {
    /// Parses the instruction text found at `location`.
    ///
    /// # Errors
    ///
    /// Returns `InstructionError::Schema` if the text is not a variable path
    /// followed by a space and a postfix.
    pub fn parse(scalar: &str, location: SourceLocation) -> Result<Self, InstructionError> {
        let (path, postfix) = scalar.split_once(' ').ok_or_else(|| InstructionError::Schema {
            location,
            message: "Invalid variable".to_string(),
        })?;
        let lookup = VariableLookup::parse(path).map_err(|e| InstructionError::Schema {
            location,
            message: format!("Invalid variable: {}", e.message),
        })?;
        Ok(UrlJoin {
            lookup,
            postfix: postfix.to_string(),
            location,
        })
    }

    pub fn variable(&self) -> &str {
        self.lookup.path()
    }

    pub fn postfix(&self) -> &str {
        &self.postfix
    }

    pub fn location(&self) -> SourceLocation {
        self.location
    }

    /// Joins the base URL held in `context` with the postfix.
    ///
    /// Returns `Ok(None)` when the base variable is missing or empty. An
    /// absolute postfix replaces the base. A relative base such as `/api/`
    /// yields a relative result (`/api/v1`).
    ///
    /// # Errors
    ///
    /// Returns `InstructionError::Runtime` if the base is not a string or the
    /// join fails.
    pub fn resolve(&self, context: &Map<String, Value>) -> Result<Option<String>, InstructionError> {
        let base = match self.lookup.lookup(context) {
            Some(value) if is_truthy(value) => value,
            _ => return Ok(None),
        };
        let joined = base
            .as_str()
            .and_then(|base| join_url(base, &self.postfix))
            .ok_or_else(|| InstructionError::Runtime {
                location: self.location,
                message: "bad urljoin arguments".to_string(),
            })?;
        Ok(Some(joined))
    }
}

fn join_url(base: &str, postfix: &str) -> Option<String> {
    match Url::parse(base) {
        Ok(base) => base.join(postfix).ok().map(String::from),
        Err(ParseError::RelativeUrlWithoutBase) => {
            let anchor = Url::parse(RELATIVE_ANCHOR).ok()?;
            let joined = anchor.join(base).ok()?.join(postfix).ok()?;
            if joined.origin() != anchor.origin() {
                return Some(joined.into());
            }
            let relative = &joined[Position::BeforePath..];
            if base.starts_with('/') {
                Some(relative.to_string())
            } else {
                Some(relative.trim_start_matches('/').to_string())
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    fn join(scalar: &str) -> UrlJoin {
        UrlJoin::parse(scalar, SourceLocation::new(3, 5)).unwrap()
    }

    #[test]
    fn test_relative_postfix_resolves_against_base() {
        let ctx = context(json!({"base": "https://example.com/api/"}));
        assert_eq!(
            join("base v1/items").resolve(&ctx).unwrap().as_deref(),
            Some("https://example.com/api/v1/items")
        );
    }

    #[test]
    fn test_base_without_trailing_slash_replaces_last_segment() {
        let ctx = context(json!({"base": "https://example.com/api"}));
        assert_eq!(
            join("base v1").resolve(&ctx).unwrap().as_deref(),
            Some("https://example.com/v1")
        );
    }

    #[test]
    fn test_absolute_postfix_replaces_base() {
        let ctx = context(json!({"base": "https://example.com/api/"}));
        assert_eq!(
            join("base https://other.com/x").resolve(&ctx).unwrap().as_deref(),
            Some("https://other.com/x")
        );
    }

    #[test]
    fn test_missing_or_empty_base_is_no_value() {
        let instruction = join("env.base v1");
        assert_eq!(instruction.resolve(&context(json!({}))).unwrap(), None);
        assert_eq!(instruction.resolve(&context(json!({"env": {"base": ""}}))).unwrap(), None);
        assert_eq!(instruction.resolve(&context(json!({"env": {"base": null}}))).unwrap(), None);
    }

    #[test]
    fn test_nested_path_with_index() {
        let ctx = context(json!({"hosts": [{"url": "http://a.test/"}, {"url": "http://b.test/"}]}));
        assert_eq!(
            join("hosts.1.url health").resolve(&ctx).unwrap().as_deref(),
            Some("http://b.test/health")
        );
    }

    #[test]
    fn test_non_string_base_is_runtime_error_with_location() {
        let ctx = context(json!({"base": 42}));
        let err = join("base v1").resolve(&ctx).unwrap_err();
        assert!(matches!(err, InstructionError::Runtime { .. }));
        assert_eq!(err.location(), SourceLocation::new(3, 5));
        assert_eq!(err.to_string(), "line 3, column 5: bad urljoin arguments");
    }

    #[test]
    fn test_relative_base_gives_relative_result() {
        let ctx = context(json!({"root": "/api/", "dir": "api/", "page": "/docs/index.html"}));
        assert_eq!(
            join("root v1").resolve(&ctx).unwrap().as_deref(),
            Some("/api/v1")
        );
        assert_eq!(
            join("dir v1?x=1").resolve(&ctx).unwrap().as_deref(),
            Some("api/v1?x=1")
        );
        assert_eq!(
            join("page ../img/a.png").resolve(&ctx).unwrap().as_deref(),
            Some("/img/a.png")
        );
        assert_eq!(
            join("root https://other.com/x").resolve(&ctx).unwrap().as_deref(),
            Some("https://other.com/x")
        );
    }

    #[test]
    fn test_malformed_instruction_is_schema_error() {
        let err = UrlJoin::parse("justapath", SourceLocation::new(1, 1)).unwrap_err();
        assert!(matches!(err, InstructionError::Schema { .. }));
        let err = UrlJoin::parse("a..b v1", SourceLocation::new(1, 1)).unwrap_err();
        assert!(matches!(err, InstructionError::Schema { .. }));
    }

    #[test]
    fn test_parts_are_kept() {
        let instruction = join("config.base_url v1/items");
        assert_eq!(instruction.variable(), "config.base_url");
        assert_eq!(instruction.postfix(), "v1/items");
        assert_eq!(instruction.location(), SourceLocation::new(3, 5));
    }
}
