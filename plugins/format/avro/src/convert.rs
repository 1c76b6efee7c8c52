use apache_avro::types::Value;
use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use row_api::RowField;

use crate::default::FieldDefault;
use crate::error::ConversionError;
use crate::schema::{SchemaField, Storage};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since 1970-01-01, the Avro `date` logical type.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`epoch_days`]; `None` outside chrono's date range.
pub fn date_from_epoch_days(days: i64) -> Option<NaiveDate> {
    let days = i32::try_from(days).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

// ═══════════════════════════════════════════════════════════════
//  Row field → Avro value
// ═══════════════════════════════════════════════════════════════

/// Конвертация одного поля строки в значение целевого поля Avro.
///
/// The field's resolved default is consulted first: an invalid default
/// fails the conversion even when the row carries a value. The value is
/// then read through the default-aware accessor of the declared type and
/// encoded for the physical Avro type.
pub fn coerce(field: &SchemaField, source: &RowField) -> Result<Value, ConversionError> {
    let value = match field.default() {
        FieldDefault::Invalid(reason) => {
            return Err(ConversionError::InvalidDefault {
                field: field.name().to_string(),
                field_type: field.field_type(),
                reason: reason.clone(),
            });
        }
        FieldDefault::Text(default) => source
            .get_string(Some(default.clone()))?
            .map(Value::String),
        FieldDefault::Integer(default) => source
            .get_integer(*default)?
            .map(|n| encode_integer(field, n))
            .transpose()?,
        FieldDefault::Float(default) => source
            .get_number(Some(*default))?
            .map(|n| encode_float(field, n))
            .transpose()?,
        FieldDefault::Decimal(default) => source
            .get_big_number(default.clone())?
            .map(|d| encode_decimal(field, d))
            .transpose()?,
        FieldDefault::Date(default) => source
            .get_date(*default)?
            .map(|d| Value::Date(epoch_days(d))),
        FieldDefault::Boolean(default) => source
            .get_boolean(Some(*default))?
            .map(Value::Boolean),
        FieldDefault::Bytes(default) => source
            .get_binary(default.clone())?
            .map(|b| encode_bytes(field, b))
            .transpose()?,
    };
    wrap(field, value)
}

/// Nullable union wrapping; null in a non-nullable field is an error.
fn wrap(field: &SchemaField, value: Option<Value>) -> Result<Value, ConversionError> {
    match (field.union(), value) {
        (Some(union), Some(v)) => Ok(Value::Union(union.value_index, Box::new(v))),
        (Some(union), None) => Ok(Value::Union(union.null_index, Box::new(Value::Null))),
        (None, Some(v)) => Ok(v),
        (None, None) => Err(ConversionError::MissingValue {
            field: field.name().to_string(),
            field_type: field.field_type(),
        }),
    }
}

fn out_of_range(field: &SchemaField, value: impl std::fmt::Display) -> ConversionError {
    ConversionError::OutOfRange {
        field: field.name().to_string(),
        value: value.to_string(),
        target: field.storage().to_string(),
    }
}

// ── Physical encoders ──

fn encode_integer(field: &SchemaField, n: i64) -> Result<Value, ConversionError> {
    match field.storage() {
        Storage::Int => i32::try_from(n)
            .map(Value::Int)
            .map_err(|_| out_of_range(field, n)),
        _ => Ok(Value::Long(n)),
    }
}

/// Finite doubles that overflow `float` are rejected; NaN and infinities pass.
fn encode_float(field: &SchemaField, n: f64) -> Result<Value, ConversionError> {
    match field.storage() {
        Storage::Float => {
            let narrowed = n as f32;
            if n.is_finite() && !narrowed.is_finite() {
                return Err(out_of_range(field, n));
            }
            Ok(Value::Float(narrowed))
        }
        _ => Ok(Value::Double(n)),
    }
}

/// `decimal(p,s)` takes the value at scale `s` exactly: more fractional
/// digits than `s`, or more than `p` digits in total, is out of range.
/// `big-decimal` keeps the value as-is.
fn encode_decimal(field: &SchemaField, d: BigDecimal) -> Result<Value, ConversionError> {
    match field.storage() {
        Storage::Decimal { precision, scale } => {
            let scaled = d.with_scale(scale as i64);
            if scaled != d || scaled.digits() > precision as u64 {
                return Err(out_of_range(field, d));
            }
            let (unscaled, _) = scaled.into_bigint_and_exponent();
            Ok(Value::Decimal(apache_avro::Decimal::from(
                unscaled.to_signed_bytes_be(),
            )))
        }
        _ => Ok(Value::BigDecimal(d)),
    }
}

fn encode_bytes(field: &SchemaField, bytes: Vec<u8>) -> Result<Value, ConversionError> {
    match field.storage() {
        Storage::Fixed(size) if bytes.len() != size => {
            Err(out_of_range(field, format!("{} bytes", bytes.len())))
        }
        Storage::Fixed(size) => Ok(Value::Fixed(size, bytes)),
        _ => Ok(Value::Bytes(bytes)),
    }
}
