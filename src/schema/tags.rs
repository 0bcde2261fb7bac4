//! Raw field tag text: `name:"value" other:"value"`.

/// Parsed tag text of one field, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    /// Parse raw tag text. Values are double-quoted and may contain `\"`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut entries = Vec::new();
        let mut rest = raw.trim_start();
        while !rest.is_empty() {
            let colon = rest
                .find(':')
                .ok_or_else(|| format!("expected ':' after '{rest}'"))?;
            let name = &rest[..colon];
            if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == '"') {
                return Err(format!("invalid tag name '{name}'"));
            }
            let quoted = rest[colon + 1..]
                .strip_prefix('"')
                .ok_or_else(|| format!("value of '{name}' must be quoted"))?;

            let mut value = String::new();
            let mut chars = quoted.char_indices();
            let mut end = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some((_, escaped)) => value.push(escaped),
                        None => break,
                    },
                    '"' => {
                        end = Some(i);
                        break;
                    }
                    c => value.push(c),
                }
            }
            let end = end.ok_or_else(|| format!("unterminated value of '{name}'"))?;
            entries.push((name.to_string(), value));
            rest = quoted[end + 1..].trim_start();
        }
        Ok(Self { entries })
    }

    /// Value of the first entry named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A tag value split into its key and comma-separated options:
/// `"u,required"` has key `u` and option `required`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagValue<'a> {
    raw: &'a str,
}

impl<'a> TagValue<'a> {
    #[must_use]
    pub fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    /// First segment; empty when the tag only carries options.
    #[must_use]
    pub fn key(&self) -> &'a str {
        self.raw.split(',').next().unwrap_or_default().trim()
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.raw.split(',').skip(1).any(|o| o.trim() == option)
    }
}

/// `user_name` → `userName`; a leading `r#` is dropped.
#[must_use]
pub fn lower_camel(field: &str) -> String {
    let field = field.strip_prefix("r#").unwrap_or(field);
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else if out.is_empty() {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let tags = TagSet::parse(r#"body:"text" code:"403""#).unwrap();
        assert_eq!(tags.get("body"), Some("text"));
        assert_eq!(tags.get("code"), Some("403"));
        assert_eq!(tags.get("header"), None);
    }

    #[test]
    fn test_parse_empty_value_and_escapes() {
        let tags = TagSet::parse(r#"header:"" query:"a\"b""#).unwrap();
        assert!(tags.has("header"));
        assert_eq!(tags.get("header"), Some(""));
        assert_eq!(tags.get("query"), Some("a\"b"));
        assert!(TagSet::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(TagSet::parse("query").is_err());
        assert!(TagSet::parse("query:u").is_err());
        assert!(TagSet::parse(r#"query:"u"#).is_err());
    }

    #[test]
    fn test_tag_value_options() {
        let value = TagValue::new("u,required");
        assert_eq!(value.key(), "u");
        assert!(value.has_option("required"));
        let bare = TagValue::new(",required");
        assert_eq!(bare.key(), "");
        assert!(bare.has_option("required"));
        assert!(!TagValue::new("required").has_option("required"));
    }

    #[test]
    fn test_lower_camel() {
        assert_eq!(lower_camel("user_name"), "userName");
        assert_eq!(lower_camel("Id"), "id");
        assert_eq!(lower_camel("r#type"), "type");
        assert_eq!(lower_camel("_private_x"), "privateX");
    }
}
