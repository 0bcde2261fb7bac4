//! # Configuration Module
//!
//! Settings for [`RequestBinder`](crate::binder::RequestBinder) and
//! [`ResponseWriter`](crate::writer::ResponseWriter).
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! standard tag vocabulary and status codes. Configuration can be loaded from
//! YAML and then overridden from the environment.
//!
//! ## YAML
//!
//! ```yaml
//! binder:
//!   tags:
//!     query: q
//! writer:
//!   default_content_kind: xml
//!   error_status: 422
//!   content_types:
//!     json: application/json
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `TAGBIND_QUERY_TAG` | query tag name (binder) |
//! | `TAGBIND_PATH_TAG` | path tag name (binder) |
//! | `TAGBIND_HEADER_TAG` | header tag name (binder and writer) |
//! | `TAGBIND_BODY_TAG` | body tag name (binder and writer) |
//! | `TAGBIND_CODE_TAG` | status code tag name (writer) |
//! | `TAGBIND_DEFAULT_CONTENT_KIND` | `json`, `xml` or `text` |
//! | `TAGBIND_SUCCESS_STATUS` | default status of non-error fields |
//! | `TAGBIND_ERROR_STATUS` | default status of `Failure` fields |
//!
//! Unparseable values are ignored with a warning.

use crate::codec::ContentKind;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_JSON_CONTENT_TYPE: &str = "application/json;charset-UTF8";
pub const DEFAULT_XML_CONTENT_TYPE: &str = "application/xml;charset-UTF8";
pub const DEFAULT_TEXT_CONTENT_TYPE: &str = "text/plain";

/// Names of the tags recognised on struct fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TagNames {
    pub query: String,
    pub path: String,
    pub header: String,
    pub body: String,
    pub code: String,
}

impl Default for TagNames {
    fn default() -> Self {
        Self {
            query: "query".to_string(),
            path: "path".to_string(),
            header: "header".to_string(),
            body: "body".to_string(),
            code: "code".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    pub tags: TagNames,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub tags: TagNames,
    /// Kind used by `body:""`
    pub default_content_kind: ContentKind,
    /// Content-Type overrides, keyed by content kind name
    pub content_types: HashMap<String, String>,
    /// Status of fields without a `code` tag
    pub success_status: u16,
    /// Status of `Failure` fields without a `code` tag
    pub error_status: u16,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            tags: TagNames::default(),
            default_content_kind: ContentKind::Json,
            content_types: HashMap::new(),
            success_status: 200,
            error_status: 400,
        }
    }
}

impl WriterConfig {
    /// Full Content-Type for a body kind.
    #[must_use]
    pub fn content_type(&self, kind: ContentKind) -> &str {
        if let Some(custom) = self.content_types.get(kind.as_str()) {
            return custom;
        }
        match kind {
            ContentKind::Json => DEFAULT_JSON_CONTENT_TYPE,
            ContentKind::Xml => DEFAULT_XML_CONTENT_TYPE,
            ContentKind::Text | ContentKind::Form => DEFAULT_TEXT_CONTENT_TYPE,
        }
    }
}

/// Binder and writer settings together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub binder: BinderConfig,
    pub writer: WriterConfig,
}

impl Config {
    /// Defaults overridden from `TAGBIND_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse tagbind config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("TAGBIND_QUERY_TAG") {
            self.binder.tags.query = v;
        }
        if let Some(v) = lookup("TAGBIND_PATH_TAG") {
            self.binder.tags.path = v;
        }
        if let Some(v) = lookup("TAGBIND_HEADER_TAG") {
            self.binder.tags.header.clone_from(&v);
            self.writer.tags.header = v;
        }
        if let Some(v) = lookup("TAGBIND_BODY_TAG") {
            self.binder.tags.body.clone_from(&v);
            self.writer.tags.body = v;
        }
        if let Some(v) = lookup("TAGBIND_CODE_TAG") {
            self.writer.tags.code = v;
        }
        if let Some(v) = lookup("TAGBIND_DEFAULT_CONTENT_KIND") {
            match ContentKind::parse(&v.to_lowercase()) {
                Some(kind @ (ContentKind::Json | ContentKind::Xml | ContentKind::Text)) => {
                    self.writer.default_content_kind = kind;
                }
                _ => warn!(value = %v, "Ignoring invalid TAGBIND_DEFAULT_CONTENT_KIND"),
            }
        }
        if let Some(code) = status_override(&lookup, "TAGBIND_SUCCESS_STATUS") {
            self.writer.success_status = code;
        }
        if let Some(code) = status_override(&lookup, "TAGBIND_ERROR_STATUS") {
            self.writer.error_status = code;
        }
    }

    /// Reject settings no response could be written with.
    pub fn validate(&self) -> Result<()> {
        for (name, code) in [
            ("success_status", self.writer.success_status),
            ("error_status", self.writer.error_status),
        ] {
            if !(100..=999).contains(&code) {
                bail!("writer.{name} must be between 100 and 999, got {code}");
            }
        }
        if self.writer.default_content_kind == ContentKind::Form {
            bail!("writer.default_content_kind cannot be 'form'");
        }
        Ok(())
    }
}

fn status_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u16> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u16>() {
        Ok(code) if (100..=999).contains(&code) => Some(code),
        _ => {
            warn!(variable = key, value = %raw, "Ignoring invalid status override");
            None
        }
    }
}

/// Load a YAML config file and apply environment overrides on top.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let mut config = Config::from_yaml_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    config.apply_overrides(|key| env::var(key).ok());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.binder.tags.query, "query");
        assert_eq!(config.writer.tags.code, "code");
        assert_eq!(config.writer.success_status, 200);
        assert_eq!(config.writer.error_status, 400);
        assert_eq!(config.writer.default_content_kind, ContentKind::Json);
        assert_eq!(
            config.writer.content_type(ContentKind::Json),
            "application/json;charset-UTF8"
        );
        assert_eq!(config.writer.content_type(ContentKind::Text), "text/plain");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml_str(
            "binder:\n  tags:\n    query: q\nwriter:\n  default_content_kind: xml\n  content_types:\n    json: application/json\n",
        )
        .unwrap();
        assert_eq!(config.binder.tags.query, "q");
        assert_eq!(config.binder.tags.header, "header");
        assert_eq!(config.writer.default_content_kind, ContentKind::Xml);
        assert_eq!(config.writer.content_type(ContentKind::Json), "application/json");
        assert_eq!(
            config.writer.content_type(ContentKind::Xml),
            "application/xml;charset-UTF8"
        );
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml_status() {
        let err = Config::from_yaml_str("writer:\n  error_status: 42\n").unwrap_err();
        assert!(err.to_string().contains("error_status"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TAGBIND_HEADER_TAG", "hdr"),
            ("TAGBIND_DEFAULT_CONTENT_KIND", "TEXT"),
            ("TAGBIND_ERROR_STATUS", "422"),
            ("TAGBIND_SUCCESS_STATUS", "nope"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.binder.tags.header, "hdr");
        assert_eq!(config.writer.tags.header, "hdr");
        assert_eq!(config.writer.default_content_kind, ContentKind::Text);
        assert_eq!(config.writer.error_status, 422);
        assert_eq!(config.writer.success_status, 200);
    }
}
