//! Structured-tag parsing.
//!
//! Field tags and annotation parameters share one grammar: a sequence of
//! `key:"value"` pairs separated by whitespace, e.g.
//! `env:"ADDRESS" default:"localhost" required:"true"`. Values may escape
//! embedded quotes with `\"`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("malformed tag near offset {offset}: {message}")]
    Malformed { offset: usize, message: String },
}

/// Parsed `key:"value"` pairs, preserving source order.
///
/// Duplicate keys keep their first occurrence, matching the lookup rules of
/// the tag grammar this is derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap {
    pairs: Vec<(String, String)>,
}

impl TagMap {
    pub fn parse(raw: &str) -> Result<TagMap, TagError> {
        let bytes = raw.as_bytes();
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }

            let key_start = i;
            while i < bytes.len() && is_key_byte(bytes[i]) {
                i += 1;
            }
            if i == key_start {
                return Err(TagError::Malformed {
                    offset: i,
                    message: format!("expected tag key, found {:?}", raw[i..].chars().next()),
                });
            }
            let key = raw[key_start..i].to_string();

            if i >= bytes.len() || bytes[i] != b':' {
                return Err(TagError::Malformed {
                    offset: i,
                    message: format!("expected ':' after key '{key}'"),
                });
            }
            i += 1;

            if i >= bytes.len() || bytes[i] != b'"' {
                return Err(TagError::Malformed {
                    offset: i,
                    message: format!("expected quoted value for key '{key}'"),
                });
            }
            i += 1;

            let mut value = String::new();
            let mut closed = false;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' if i + 1 < bytes.len() && (bytes[i + 1] == b'"' || bytes[i + 1] == b'\\') => {
                        value.push(bytes[i + 1] as char);
                        i += 2;
                    }
                    b'"' => {
                        i += 1;
                        closed = true;
                        break;
                    }
                    _ => {
                        // Values are UTF-8; copy char-wise to stay on boundaries.
                        let ch = raw[i..].chars().next().unwrap_or('\u{fffd}');
                        value.push(ch);
                        i += ch.len_utf8();
                    }
                }
            }
            if !closed {
                return Err(TagError::Malformed {
                    offset: i,
                    message: format!("unterminated value for key '{key}'"),
                });
            }

            if !pairs.iter().any(|(k, _)| k == &key) {
                pairs.push((key, value));
            }
        }

        Ok(TagMap { pairs })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `true` only for an explicit `key:"true"`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tag() {
        let tags = TagMap::parse("").unwrap();
        assert!(tags.is_empty());
        assert_eq!(tags.get("anything"), None);
    }

    #[test]
    fn test_single_pair() {
        let tags = TagMap::parse(r#"default:"localhost""#).unwrap();
        assert_eq!(tags.get("default"), Some("localhost"));
    }

    #[test]
    fn test_multiple_pairs() {
        let tags = TagMap::parse(r#"env:"ADDRESS" default:"some-address" required:"true""#).unwrap();
        assert_eq!(tags.get("env"), Some("ADDRESS"));
        assert_eq!(tags.get("default"), Some("some-address"));
        assert!(tags.get_bool("required"));
    }

    #[test]
    fn test_required_must_be_literal_true() {
        let tags = TagMap::parse(r#"required:"yes""#).unwrap();
        assert!(!tags.get_bool("required"));
    }

    #[test]
    fn test_escaped_quote_in_value() {
        let tags = TagMap::parse(r#"default:"say \"hi\"""#).unwrap();
        assert_eq!(tags.get("default"), Some(r#"say "hi""#));
    }

    #[test]
    fn test_empty_value() {
        let tags = TagMap::parse(r#"ctor_name:"""#).unwrap();
        assert_eq!(tags.get("ctor_name"), Some(""));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let tags = TagMap::parse(r#"default:"first" default:"second""#).unwrap();
        assert_eq!(tags.get("default"), Some("first"));
    }

    #[test]
    fn test_missing_colon() {
        let err = TagMap::parse(r#"default"localhost""#).unwrap_err();
        assert!(matches!(err, TagError::Malformed { .. }));
    }

    #[test]
    fn test_unquoted_value() {
        assert!(TagMap::parse("default:localhost").is_err());
    }

    #[test]
    fn test_unterminated_value() {
        assert!(TagMap::parse(r#"default:"localhost"#).is_err());
    }

    #[test]
    fn test_leading_whitespace() {
        let tags = TagMap::parse(r#"   prefix:"SS"  ctor_name:"ctor1" "#).unwrap();
        assert_eq!(tags.get("prefix"), Some("SS"));
        assert_eq!(tags.get("ctor_name"), Some("ctor1"));
    }
}
