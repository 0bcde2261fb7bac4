use crate::error::PathError;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;

/// Values bound to one key. Almost always exactly one.
pub type Values = SmallVec<[String; 1]>;

/// A whole segment of the form `{name}`, whitespace allowed inside the braces.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{[[:space:]]*([[:alnum:]_\-]*)[[:space:]]*\}$")
        .expect("placeholder regex should be valid")
});

/// Characters a captured path segment may contain.
const CAPTURE: &str = r"([[:alnum:]_\-]+)";

/// A compiled path template such as `/users/{id}/posts/{post}`.
///
/// Matching is anchored: the URL must have the same number of segments as
/// the template, and every literal segment must match exactly.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// Compile a template.
    ///
    /// # Errors
    ///
    /// [`PathError::EmptyTemplate`] for `""`, [`PathError::EmptyPlaceholder`]
    /// for a `{}` segment.
    pub fn compile(template: &str) -> Result<Self, PathError> {
        if template.is_empty() {
            return Err(PathError::EmptyTemplate);
        }
        let trimmed = template.strip_prefix('/').unwrap_or(template);

        let mut expression = String::with_capacity(template.len() + 16);
        expression.push('^');
        let mut names = Vec::with_capacity(template.matches('{').count());

        for segment in trimmed.split('/') {
            expression.push('/');
            match PLACEHOLDER.captures(segment) {
                Some(caps) => {
                    let name = caps.get(1).map_or("", |m| m.as_str());
                    if name.is_empty() {
                        return Err(PathError::EmptyPlaceholder {
                            template: template.to_string(),
                        });
                    }
                    expression.push_str(CAPTURE);
                    names.push(name.to_string());
                }
                None => expression.push_str(&regex::escape(segment)),
            }
        }
        expression.push('$');

        let regex = Regex::new(&expression).map_err(|e| PathError::InvalidExpression {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            raw: template.to_string(),
            regex,
            names,
        })
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in template order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Extract placeholder values from `url`.
    ///
    /// `url` is a path without query string. Each placeholder yields exactly
    /// one value.
    pub fn matches(&self, url: &str) -> Result<HashMap<String, Values>, PathError> {
        let caps = self.regex.captures(url).ok_or_else(|| PathError::Mismatch {
            url: url.to_string(),
            template: self.raw.clone(),
        })?;
        Ok(self
            .names
            .iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(name, m)| m.map(|m| (name.clone(), smallvec![m.as_str().to_string()])))
            .collect())
    }
}
