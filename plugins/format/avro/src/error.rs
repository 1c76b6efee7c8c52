use row_api::ValueError;

use crate::schema::FieldType;

/// Значение не удалось привести к объявленному типу поля схемы.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("field '{field}': invalid {field_type} default: {reason}")]
    InvalidDefault {
        field: String,
        field_type: FieldType,
        reason: String,
    },

    #[error("field '{field}': no value and no default for non-nullable {field_type} field")]
    MissingValue { field: String, field_type: FieldType },

    #[error("field '{field}': {value} does not fit avro type {target}")]
    OutOfRange {
        field: String,
        value: String,
        target: String,
    },

    #[error("row field '{0}' is not part of the target schema")]
    UnknownField(String),

    #[error("schema field '{0}' is not present in the row")]
    AbsentField(String),
}

impl ConversionError {
    /// Name of the field the conversion failed on, if known.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConversionError::Value(e) => e.field(),
            ConversionError::InvalidDefault { field, .. }
            | ConversionError::MissingValue { field, .. }
            | ConversionError::OutOfRange { field, .. } => Some(field),
            ConversionError::UnknownField(field) | ConversionError::AbsentField(field) => {
                Some(field)
            }
        }
    }
}

/// Ошибка нижележащего потока записи (append / close).
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("avro: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink is closed")]
    Closed,
}

/// Single failure type of [`AvroRecordWriter`](crate::AvroRecordWriter).
///
/// The original cause stays reachable through `source()`.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to convert row: {0}")]
    Conversion(#[from] ConversionError),

    #[error("failed to write record: {0}")]
    Sink(#[from] SinkError),
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("avro schema: {0}")]
    Parse(#[from] apache_avro::Error),

    #[error("target schema must be a record, got {0}")]
    NotARecord(String),

    #[error("field '{field}': unsupported avro type {schema}")]
    UnsupportedType { field: String, schema: String },

    #[error("default given for unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{field}': opaque defaults only apply to bytes fields, not {field_type}")]
    OpaqueDefault { field: String, field_type: FieldType },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use row_api::ValueType;

    use super::*;

    #[test]
    fn test_write_error_keeps_conversion_cause() {
        let cause = ConversionError::Value(ValueError::Parse {
            field: "qty".into(),
            text: "abc".into(),
            to: ValueType::Integer,
        });
        let err = WriteError::from(cause);
        assert!(err.to_string().starts_with("failed to convert row"));
        let source = err.source().expect("source");
        assert!(source.to_string().contains("cannot parse 'abc'"));
    }

    #[test]
    fn test_write_error_keeps_sink_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = WriteError::from(SinkError::from(io));
        assert!(matches!(err, WriteError::Sink(SinkError::Io(_))));
        assert!(err.source().unwrap().to_string().contains("pipe closed"));
    }

    #[test]
    fn test_conversion_error_field() {
        let err = ConversionError::MissingValue {
            field: "born".into(),
            field_type: FieldType::Date,
        };
        assert_eq!(err.field(), Some("born"));
        assert!(err.to_string().contains("non-nullable date field"));
    }
}
