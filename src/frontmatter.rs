//! YAML front matter.
//!
//! A document that starts with `---` is cut at the first two `---` markers:
//! the text between them is the front matter, everything after the second
//! marker is the body. Markers are matched anywhere in the text, not only on
//! their own line, the same way the site generator's data scripts always have.

use serde_yaml::{Mapping, Value};

/// Split a document into its front matter mapping and body.
///
/// Without front matter, or when it is not a YAML mapping, the mapping is
/// empty and the body is the whole document.
pub fn split(content: &str) -> (Mapping, &str) {
    if !content.starts_with("---") {
        return (Mapping::new(), content);
    }
    let mut parts = content.splitn(3, "---");
    let (Some(_), Some(yaml), Some(body)) = (parts.next(), parts.next(), parts.next()) else {
        return (Mapping::new(), content);
    };
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(map)) => (map, body),
        Ok(Value::Null) => (Mapping::new(), body),
        Ok(_) => (Mapping::new(), content),
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable front matter; treating it as body");
            (Mapping::new(), content)
        }
    }
}

/// Read a scalar front matter value as a string.
///
/// Numbers and booleans are rendered the way YAML wrote them; sequences and
/// mappings yield `None`.
pub fn get_str(map: &Mapping, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_mapping_and_body() {
        let (fm, body) = split("---\ntitle: Hello\ndate: 2024-03-01 10:00:00\n---\nBody text\n");
        assert_eq!(get_str(&fm, "title").as_deref(), Some("Hello"));
        assert_eq!(get_str(&fm, "date").as_deref(), Some("2024-03-01 10:00:00"));
        assert_eq!(body, "\nBody text\n");
    }

    #[test]
    fn no_front_matter() {
        let (fm, body) = split("Just text\n---\n");
        assert!(fm.is_empty());
        assert_eq!(body, "Just text\n---\n");
    }

    #[test]
    fn unclosed_front_matter_is_body() {
        let (fm, body) = split("---\ntitle: x\n");
        assert!(fm.is_empty());
        assert_eq!(body, "---\ntitle: x\n");
    }

    #[test]
    fn invalid_yaml_is_body() {
        let content = "---\ntitle: [unclosed\n---\nBody\n";
        let (fm, body) = split(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn empty_front_matter_keeps_body() {
        let (fm, body) = split("---\n---\nBody\n");
        assert!(fm.is_empty());
        assert_eq!(body, "\nBody\n");
    }

    #[test]
    fn non_string_scalars() {
        let (fm, _) = split("---\nyear: 2024\ndraft: false\ntags: [a]\n---\n");
        assert_eq!(get_str(&fm, "year").as_deref(), Some("2024"));
        assert_eq!(get_str(&fm, "draft").as_deref(), Some("false"));
        assert_eq!(get_str(&fm, "tags"), None);
        assert_eq!(get_str(&fm, "missing"), None);
    }
}
