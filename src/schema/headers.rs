//! Header normalization shared by the request and response models.

use indexmap::IndexMap;

/// Lower-cases header names.
///
/// Names that collide after lower-casing keep the value seen last, at the
/// position of the first occurrence.
pub fn normalize_headers<'a, I>(pairs: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut headers = IndexMap::new();
    for (name, value) in pairs {
        headers.insert(name.to_ascii_lowercase(), value.to_string());
    }
    headers
}

/// Collects a `reqwest` header map into owned `(name, value)` pairs.
///
/// Repeated lines of one header are folded into a single value joined with
/// `", "`. Values that are not visible ASCII are decoded lossily.
pub(crate) fn header_pairs(headers: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    headers
        .keys()
        .map(|name| {
            let values: Vec<String> = headers
                .get_all(name)
                .iter()
                .map(|value| match value.to_str() {
                    Ok(v) => v.to_string(),
                    Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
                })
                .collect();
            (name.as_str().to_string(), values.join(", "))
        })
        .collect()
}
