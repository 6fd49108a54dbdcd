//! Struct field tags: `key:"value" other:"value"`.
//!
//! The syntax is the conventional Go one. Keys are non-empty runs of
//! characters other than space, quote, colon and control characters; values
//! are double-quoted Go string literals. Anything else is a hard error.

use crate::error::GenerateError;
use crate::syntax::lexer::unescape;
use serde::Serialize;

/// Seeds the constructor with a value for the field.
pub const DEFAULT_KEY: &str = "default";

/// Overrides the name stem of the option function; `-` suppresses it.
pub const OPTION_KEY: &str = "option";

/// One `key:"value"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// Part of the value before the first comma.
    pub fn name(&self) -> &str {
        self.value.split(',').next().unwrap_or_default()
    }
}

/// Tags of one field, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The `default` value, taken verbatim (commas included).
    pub fn default_value(&self) -> Option<&str> {
        self.get(DEFAULT_KEY).map(|t| t.value.as_str())
    }

    /// The `option` override, if any.
    pub fn option_name(&self) -> Option<&str> {
        self.get(OPTION_KEY).map(Tag::name).filter(|name| !name.is_empty())
    }

    /// Whether `option:"-"` asks for no option function.
    pub fn option_suppressed(&self) -> bool {
        self.option_name() == Some("-")
    }
}

/// Parse a raw tag. `field` labels errors.
pub fn parse_tags(field: &str, raw: &str) -> Result<TagSet, GenerateError> {
    let malformed = |reason: &str| GenerateError::MalformedTag {
        field: field.to_string(),
        tag: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut tags: Vec<Tag> = Vec::new();
    let mut rest = raw;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        let key_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\x7f')
            .unwrap_or(rest.len());
        if key_len == 0 {
            return Err(malformed("bad syntax for tag key"));
        }
        let key = &rest[..key_len];
        rest = &rest[key_len..];

        let Some(after_colon) = rest.strip_prefix(':') else {
            return Err(malformed("bad syntax for tag pair"));
        };
        let Some(body) = after_colon.strip_prefix('"') else {
            return Err(malformed("bad syntax for tag value"));
        };

        let end = closing_quote(body).ok_or_else(|| malformed("unterminated tag value"))?;
        let value = unescape(&body[..end]).map_err(|reason| malformed(&reason))?;
        rest = &body[end + 1..];

        if tags.iter().any(|t| t.key == key) {
            return Err(malformed(&format!("duplicate tag key {key:?}")));
        }
        tags.push(Tag {
            key: key.to_string(),
            value,
        });

        if !rest.is_empty() && !rest.starts_with(' ') {
            return Err(malformed("tag pairs must be separated by spaces"));
        }
    }

    Ok(TagSet { tags })
}

/// Byte index of the first unescaped `"`.
fn closing_quote(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(idx),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> TagSet {
        parse_tags("F", raw).unwrap()
    }

    fn reason(raw: &str) -> String {
        match parse_tags("F", raw).unwrap_err() {
            GenerateError::MalformedTag { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_tag_is_empty_set() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
    }

    #[test]
    fn keeps_declaration_order() {
        let tags = parse(r#"json:"profiles,omitempty" default:"n/a""#);
        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["json", "default"]);
        assert_eq!(tags.default_value(), Some("n/a"));
        let json = tags.get("json").unwrap();
        assert_eq!(json.name(), "profiles");
        assert_eq!(json.value, "profiles,omitempty");
    }

    #[test]
    fn default_value_keeps_commas_and_escapes() {
        let tags = parse(r#"default:"jen.Id(\"lol\", 2)""#);
        assert_eq!(tags.default_value(), Some(r#"jen.Id("lol", 2)"#));
    }

    #[test]
    fn option_override_and_suppression() {
        assert_eq!(parse(r#"option:"Nickname""#).option_name(), Some("Nickname"));
        assert!(parse(r#"option:"-""#).option_suppressed());
        assert_eq!(parse(r#"option:"""#).option_name(), None);
    }

    #[test]
    fn unterminated_value_is_malformed() {
        assert_eq!(reason(r#"default:"abc"#), "unterminated tag value");
    }

    #[test]
    fn duplicate_key_is_malformed() {
        assert!(reason(r#"default:"a" default:"b""#).contains("duplicate"));
    }

    #[test]
    fn missing_colon_or_quote_is_malformed() {
        assert_eq!(reason("default"), "bad syntax for tag pair");
        assert_eq!(reason("default:abc"), "bad syntax for tag value");
        assert_eq!(reason(r#":"x""#), "bad syntax for tag key");
    }

    #[test]
    fn pairs_need_separators() {
        assert!(reason(r#"a:"1"b:"2""#).contains("separated"));
    }
}
