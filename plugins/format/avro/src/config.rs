use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

// ════════════════════════════════════════════════════════════════
//  Policies
// ════════════════════════════════════════════════════════════════

/// Что делать с полем строки, которого нет в целевой схеме.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Пропустить поле, в запись оно не попадает.
    #[default]
    Skip,
    /// Отклонить всю строку.
    Reject,
}

/// Что делать с полем схемы, которого нет в строке.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentFieldPolicy {
    /// Treat it as a missing value: the field's default policy applies.
    #[default]
    Fill,
    /// Отклонить всю строку.
    Reject,
}

// ════════════════════════════════════════════════════════════════
//  WriterConfig
// ════════════════════════════════════════════════════════════════

fn default_date_pattern() -> String {
    "%m/%d/%Y".to_string()
}

/// Immutable writer configuration, fixed at construction.
///
/// ```toml
/// date_default_pattern = "%m/%d/%Y"
/// unknown_fields = "skip"
/// absent_fields = "fill"
///
/// [field_defaults]
/// qty = "42"
/// active = "TRUE"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// chrono pattern for textual defaults of `date` fields.
    /// A default that does not match is discarded, not reported.
    pub date_default_pattern: String,

    pub unknown_fields: UnknownFieldPolicy,

    pub absent_fields: AbsentFieldPolicy,

    /// Default literals by field name. Override the defaults declared in the
    /// Avro schema; the literal is kept untyped, exactly as authored.
    pub field_defaults: BTreeMap<String, serde_json::Value>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            date_default_pattern: default_date_pattern(),
            unknown_fields: UnknownFieldPolicy::default(),
            absent_fields: AbsentFieldPolicy::default(),
            field_defaults: BTreeMap::new(),
        }
    }
}

impl WriterConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = WriterConfig::parse("").unwrap();
        assert_eq!(cfg, WriterConfig::default());
        assert_eq!(cfg.date_default_pattern, "%m/%d/%Y");
        assert_eq!(cfg.unknown_fields, UnknownFieldPolicy::Skip);
        assert_eq!(cfg.absent_fields, AbsentFieldPolicy::Fill);
    }

    #[test]
    fn test_full_config() {
        let cfg = WriterConfig::parse(
            r#"
            date_default_pattern = "%d.%m.%Y"
            unknown_fields = "reject"
            absent_fields = "reject"

            [field_defaults]
            qty = "42"
            ratio = 0.5
            active = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.date_default_pattern, "%d.%m.%Y");
        assert_eq!(cfg.unknown_fields, UnknownFieldPolicy::Reject);
        assert_eq!(cfg.absent_fields, AbsentFieldPolicy::Reject);
        assert_eq!(cfg.field_defaults["qty"], serde_json::json!("42"));
        assert_eq!(cfg.field_defaults["ratio"], serde_json::json!(0.5));
        assert_eq!(cfg.field_defaults["active"], serde_json::json!(true));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = WriterConfig::parse(r#"unknown_fields = "ignore""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WriterConfig::load("/nonexistent/writer.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/writer.toml"));
    }
}
