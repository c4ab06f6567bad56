//! Content type to tag namespace resolution.
//!
//! The namespace decides which field tag supplies a parameter's external
//! name (`json:"heartbeat"` vs `form:"heartbeat"`) and which decoder the
//! binder uses.

use std::fmt;

pub const MIME_JSON: &str = "application/json";
pub const MIME_XML: &str = "application/xml";
pub const MIME_XML2: &str = "text/xml";
pub const MIME_HTML: &str = "text/html";
pub const MIME_PLAIN: &str = "text/plain";
pub const MIME_POST_FORM: &str = "application/x-www-form-urlencoded";
pub const MIME_MULTIPART_FORM: &str = "multipart/form-data";
pub const MIME_YAML: &str = "application/x-yaml";
pub const MIME_YAML2: &str = "application/yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagNamespace {
    Json,
    Xml,
    Form,
    Html,
    Plain,
    Yaml,
}

impl TagNamespace {
    /// Resolve a raw `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored and matching is
    /// case-insensitive. An empty content type means form.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let media_type = media_type(content_type);
        match media_type.as_str() {
            MIME_JSON => Some(TagNamespace::Json),
            MIME_XML | MIME_XML2 => Some(TagNamespace::Xml),
            "" | MIME_MULTIPART_FORM | MIME_POST_FORM => Some(TagNamespace::Form),
            MIME_HTML => Some(TagNamespace::Html),
            MIME_PLAIN => Some(TagNamespace::Plain),
            MIME_YAML | MIME_YAML2 => Some(TagNamespace::Yaml),
            _ => None,
        }
    }

    /// Tag key holding the external field name.
    pub fn as_str(self) -> &'static str {
        match self {
            TagNamespace::Json => "json",
            TagNamespace::Xml => "xml",
            TagNamespace::Form => "form",
            TagNamespace::Html => "html",
            TagNamespace::Plain => "plain",
            TagNamespace::Yaml => "yaml",
        }
    }
}

impl fmt::Display for TagNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased media type without parameters.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_table() {
        let cases = [
            ("application/json", Some(TagNamespace::Json)),
            ("application/xml", Some(TagNamespace::Xml)),
            ("text/xml", Some(TagNamespace::Xml)),
            ("", Some(TagNamespace::Form)),
            ("multipart/form-data; boundary=xyz", Some(TagNamespace::Form)),
            ("application/x-www-form-urlencoded", Some(TagNamespace::Form)),
            ("text/html", Some(TagNamespace::Html)),
            ("text/plain", Some(TagNamespace::Plain)),
            ("application/x-yaml", Some(TagNamespace::Yaml)),
            ("application/msgpack", None),
            ("image/png", None),
        ];
        for (content_type, expected) in cases {
            assert_eq!(TagNamespace::from_content_type(content_type), expected, "{content_type}");
        }
    }

    #[test]
    fn test_parameters_and_case_ignored() {
        assert_eq!(
            TagNamespace::from_content_type("Application/JSON; charset=utf-8"),
            Some(TagNamespace::Json)
        );
    }
}
