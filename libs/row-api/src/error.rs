use crate::types::ValueType;

/// Ошибка чтения значения из строки.
///
/// Возникает, когда значение нельзя привести к запрошенному типу:
/// несовместимый тип источника, неразбираемый текст или выход за диапазон.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("field index {index} out of range (row has {len} fields)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("field '{field}': cannot convert {from} to {to}")]
    Incompatible {
        field: String,
        from: ValueType,
        to: ValueType,
    },

    #[error("field '{field}': cannot parse '{text}' as {to}")]
    Parse {
        field: String,
        text: String,
        to: ValueType,
    },

    #[error("field '{field}': {value} is out of range for {to}")]
    OutOfRange {
        field: String,
        value: String,
        to: ValueType,
    },

    #[error("field '{field}': invalid date mask '{mask}'")]
    InvalidMask { field: String, mask: String },

    #[error("field '{field}': binary value is not valid UTF-8")]
    InvalidUtf8 {
        field: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl ValueError {
    /// Name of the row field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValueError::IndexOutOfRange { .. } => None,
            ValueError::Incompatible { field, .. }
            | ValueError::Parse { field, .. }
            | ValueError::OutOfRange { field, .. }
            | ValueError::InvalidMask { field, .. }
            | ValueError::InvalidUtf8 { field, .. } => Some(field),
        }
    }
}
