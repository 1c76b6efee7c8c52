use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use row_api::decimal_from_f64;
use serde::Serialize;

use crate::convert::date_from_epoch_days;
use crate::schema::FieldType;

/// Integer default used when the literal is present but neither text nor integral.
const LEGACY_INTEGER_DEFAULT: i64 = -1;

// ════════════════════════════════════════════════════════════════
//  DefaultLiteral
// ════════════════════════════════════════════════════════════════

/// Default value as authored in the schema, before it is bound to a field type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultLiteral {
    Text(String),
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
    Date(NaiveDate),
    Boolean(bool),
    Bytes(Vec<u8>),
    /// JSON arrays and objects.
    Opaque(serde_json::Value),
    None,
}

impl DefaultLiteral {
    /// Literal from an Avro JSON default.
    ///
    /// Avro-native encodings are honoured where they are unambiguous: an
    /// integer default of a `date` field counts days since the epoch, and a
    /// string default of a `bytes` field whose code points all fit in a byte
    /// is the byte sequence itself.
    pub fn from_json(value: &serde_json::Value, field_type: FieldType) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => DefaultLiteral::None,
            Json::Bool(b) => DefaultLiteral::Boolean(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => match field_type {
                    FieldType::Date => date_from_epoch_days(i)
                        .map_or(DefaultLiteral::Integer(i), DefaultLiteral::Date),
                    _ => DefaultLiteral::Integer(i),
                },
                None => n
                    .as_f64()
                    .map_or_else(|| DefaultLiteral::Opaque(value.clone()), DefaultLiteral::Float),
            },
            Json::String(s) if field_type == FieldType::Bytes => s
                .chars()
                .map(|c| u8::try_from(c).ok())
                .collect::<Option<Vec<u8>>>()
                .map_or_else(|| DefaultLiteral::Text(s.clone()), DefaultLiteral::Bytes),
            Json::String(s) => DefaultLiteral::Text(s.clone()),
            Json::Array(_) | Json::Object(_) => DefaultLiteral::Opaque(value.clone()),
        }
    }
}

impl std::fmt::Display for DefaultLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultLiteral::Text(s) => f.write_str(s),
            DefaultLiteral::Integer(n) => write!(f, "{n}"),
            // `{:?}` keeps the fraction: 1.0 renders as "1.0", not "1".
            DefaultLiteral::Float(n) => write!(f, "{n:?}"),
            DefaultLiteral::Decimal(d) => write!(f, "{d}"),
            DefaultLiteral::Date(d) => write!(f, "{d}"),
            DefaultLiteral::Boolean(b) => write!(f, "{b}"),
            DefaultLiteral::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            DefaultLiteral::Opaque(v) => write!(f, "{v}"),
            DefaultLiteral::None => f.write_str("null"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  FieldDefault
// ════════════════════════════════════════════════════════════════

/// Default bound to the declared type of its field.
///
/// Resolved once when the target schema is built; rows only read it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    /// Always present: a missing literal renders as `"null"`.
    Text(String),
    /// `None` → the row value is used as-is, no substitution.
    Integer(Option<i64>),
    /// Non floating-point literals resolve to `0.0`.
    Float(f64),
    Decimal(Option<BigDecimal>),
    Date(Option<NaiveDate>),
    /// Missing literal → `false`.
    Boolean(bool),
    Bytes(Option<Vec<u8>>),
    /// Literal that cannot be parsed for the field type. Every row touching
    /// the field fails with this reason.
    Invalid(String),
}

impl FieldDefault {
    pub fn resolve(
        field: &str,
        field_type: FieldType,
        literal: &DefaultLiteral,
        date_pattern: &str,
    ) -> Self {
        match field_type {
            FieldType::Text => FieldDefault::Text(literal.to_string()),

            FieldType::Integer => match literal {
                DefaultLiteral::None => FieldDefault::Integer(None),
                DefaultLiteral::Integer(n) => FieldDefault::Integer(Some(*n)),
                DefaultLiteral::Text(s) => match s.parse::<i64>() {
                    Ok(n) => FieldDefault::Integer(Some(n)),
                    Err(e) => FieldDefault::Invalid(format!("'{s}': {e}")),
                },
                _ => FieldDefault::Integer(Some(LEGACY_INTEGER_DEFAULT)),
            },

            FieldType::Float => FieldDefault::Float(match literal {
                DefaultLiteral::Float(n) => *n,
                _ => 0.0,
            }),

            FieldType::Decimal => match literal {
                DefaultLiteral::Decimal(d) => FieldDefault::Decimal(Some(d.clone())),
                DefaultLiteral::Text(s) => match BigDecimal::from_str(s) {
                    Ok(d) => FieldDefault::Decimal(Some(d)),
                    Err(e) => FieldDefault::Invalid(format!("'{s}': {e}")),
                },
                DefaultLiteral::Float(n) => FieldDefault::Decimal(decimal_from_f64(*n)),
                _ => FieldDefault::Decimal(None),
            },

            FieldType::Date => FieldDefault::Date(match literal {
                DefaultLiteral::Date(d) => Some(*d),
                DefaultLiteral::Text(s) => match NaiveDate::parse_from_str(s, date_pattern) {
                    Ok(d) => Some(d),
                    Err(e) => {
                        tracing::debug!(field, default = %s, pattern = date_pattern, error = %e, "date default does not match pattern, ignoring");
                        None
                    }
                },
                _ => None,
            }),

            FieldType::Boolean => FieldDefault::Boolean(match literal {
                DefaultLiteral::Boolean(b) => *b,
                DefaultLiteral::Text(s) => s.eq_ignore_ascii_case("true"),
                _ => false,
            }),

            FieldType::Bytes => FieldDefault::Bytes(match literal {
                DefaultLiteral::None => None,
                DefaultLiteral::Bytes(b) => Some(b.clone()),
                other => opaque_bytes(other),
            }),
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, FieldDefault::Invalid(_))
    }
}

// ════════════════════════════════════════════════════════════════
//  Opaque encoding
// ════════════════════════════════════════════════════════════════

/// Best-effort encoding of an arbitrary value into bytes (serde_json).
///
/// Used only to materialize `bytes` defaults from values of another type.
/// A value that cannot be serialized yields `None`.
pub fn opaque_bytes<T: Serialize + ?Sized>(value: &T) -> Option<Vec<u8>> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!(error = %e, "default is not serializable, using null");
            None
        }
    }
}
