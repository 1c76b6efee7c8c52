use std::fmt::Write as _;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ValueError;
use crate::types::{decimal_from_f64, Value, ValueType};

/// Маска по умолчанию для преобразования текст ↔ дата.
pub const DEFAULT_DATE_MASK: &str = "%Y/%m/%d %H:%M:%S%.3f";

/// Tried in order after the field's own mask.
const DATE_FALLBACK_PATTERNS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

// ════════════════════════════════════════════════════════════════
//  ValueMeta
// ════════════════════════════════════════════════════════════════

/// Метаданные одной ячейки: имя, объявленный тип и маска конвертации.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueMeta {
    pub name: String,
    pub value_type: ValueType,
    /// chrono pattern for text ↔ date conversion. `None` → [`DEFAULT_DATE_MASK`].
    pub conversion_mask: Option<String>,
}

impl ValueMeta {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            conversion_mask: None,
        }
    }

    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.conversion_mask = Some(mask.into());
        self
    }

    fn date_mask(&self) -> &str {
        self.conversion_mask.as_deref().unwrap_or(DEFAULT_DATE_MASK)
    }
}

// ════════════════════════════════════════════════════════════════
//  RowField
// ════════════════════════════════════════════════════════════════

/// Одна ячейка строки: метаданные + значение (или его отсутствие).
///
/// Accessors implement default-aware lookup: when the value is absent the
/// caller-supplied default is returned as-is, otherwise the value is
/// converted to the requested type.
#[derive(Debug, Clone, PartialEq)]
pub struct RowField {
    meta: ValueMeta,
    value: Option<Value>,
}

impl RowField {
    pub fn new(meta: ValueMeta, value: Option<Value>) -> Self {
        Self { meta, value }
    }

    /// Absent value with the given declared type.
    pub fn null(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(ValueMeta::new(name, value_type), None)
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn meta(&self) -> &ValueMeta {
        &self.meta
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    // ── Errors ──

    fn incompatible(&self, value: &Value, to: ValueType) -> ValueError {
        ValueError::Incompatible {
            field: self.meta.name.clone(),
            from: value.value_type(),
            to,
        }
    }

    fn parse_error(&self, text: &str, to: ValueType) -> ValueError {
        ValueError::Parse {
            field: self.meta.name.clone(),
            text: text.to_string(),
            to,
        }
    }

    fn out_of_range(&self, value: impl std::fmt::Display, to: ValueType) -> ValueError {
        ValueError::OutOfRange {
            field: self.meta.name.clone(),
            value: value.to_string(),
            to,
        }
    }

    // ── Accessors ──

    pub fn get_string(&self, default: Option<String>) -> Result<Option<String>, ValueError> {
        let Some(value) = &self.value else {
            return Ok(default);
        };
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Integer(n) => n.to_string(),
            Value::Number(n) => n.to_string(),
            Value::BigNumber(d) => d.to_string(),
            Value::Date(d) => self.format_date(*d)?,
            Value::Boolean(b) => b.to_string(),
            Value::Binary(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|source| ValueError::InvalidUtf8 {
                    field: self.meta.name.clone(),
                    source,
                })?
            }
        };
        Ok(Some(text))
    }

    pub fn get_integer(&self, default: Option<i64>) -> Result<Option<i64>, ValueError> {
        let Some(value) = &self.value else {
            return Ok(default);
        };
        let n = match value {
            Value::Integer(n) => *n,
            Value::Number(n) => {
                let rounded = n.round();
                // i64::MAX as f64 rounds up to 2^63, hence the strict bound.
                if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                    return Err(self.out_of_range(n, ValueType::Integer));
                }
                rounded as i64
            }
            // Half away from zero, same as f64::round above.
            Value::BigNumber(d) => d
                .with_scale_round(0, RoundingMode::HalfUp)
                .to_i64()
                .ok_or_else(|| self.out_of_range(d, ValueType::Integer))?,
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.parse_error(s, ValueType::Integer))?,
            Value::Boolean(b) => i64::from(*b),
            other => return Err(self.incompatible(other, ValueType::Integer)),
        };
        Ok(Some(n))
    }

    pub fn get_number(&self, default: Option<f64>) -> Result<Option<f64>, ValueError> {
        let Some(value) = &self.value else {
            return Ok(default);
        };
        let n = match value {
            Value::Integer(n) => *n as f64,
            Value::Number(n) => *n,
            Value::BigNumber(d) => d
                .to_f64()
                .ok_or_else(|| self.out_of_range(d, ValueType::Number))?,
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.parse_error(s, ValueType::Number))?,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => return Err(self.incompatible(other, ValueType::Number)),
        };
        Ok(Some(n))
    }

    pub fn get_big_number(
        &self,
        default: Option<BigDecimal>,
    ) -> Result<Option<BigDecimal>, ValueError> {
        let Some(value) = &self.value else {
            return Ok(default);
        };
        let d = match value {
            Value::Integer(n) => BigDecimal::from(*n),
            Value::Number(n) => {
                decimal_from_f64(*n).ok_or_else(|| self.out_of_range(n, ValueType::BigNumber))?
            }
            Value::BigNumber(d) => d.clone(),
            Value::String(s) => BigDecimal::from_str(s.trim())
                .map_err(|_| self.parse_error(s, ValueType::BigNumber))?,
            Value::Boolean(b) => BigDecimal::from(i64::from(*b)),
            other => return Err(self.incompatible(other, ValueType::BigNumber)),
        };
        Ok(Some(d))
    }

    pub fn get_date(&self, default: Option<NaiveDate>) -> Result<Option<NaiveDate>, ValueError> {
        let Some(value) = &self.value else {
            return Ok(default);
        };
        let d = match value {
            Value::Date(d) => *d,
            Value::String(s) => self.parse_date(s)?,
            // Integer dates are epoch milliseconds.
            Value::Integer(ms) => DateTime::from_timestamp_millis(*ms)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| self.out_of_range(ms, ValueType::Date))?,
            other => return Err(self.incompatible(other, ValueType::Date)),
        };
        Ok(Some(d))
    }

    pub fn get_boolean(&self, default: Option<bool>) -> Result<Option<bool>, ValueError> {
        let Some(value) = &self.value else {
            return Ok(default);
        };
        let b = match value {
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Number(n) => *n != 0.0,
            Value::BigNumber(d) => !d.is_zero(),
            Value::String(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "y" | "yes" | "true" | "1"
            ),
            other => return Err(self.incompatible(other, ValueType::Boolean)),
        };
        Ok(Some(b))
    }

    pub fn get_binary(&self, default: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, ValueError> {
        let Some(value) = &self.value else {
            return Ok(default);
        };
        let bytes = match value {
            Value::Binary(b) => b.clone(),
            Value::String(s) => s.as_bytes().to_vec(),
            other => return Err(self.incompatible(other, ValueType::Binary)),
        };
        Ok(Some(bytes))
    }

    // ── Dates ──

    fn format_date(&self, date: NaiveDate) -> Result<String, ValueError> {
        let mask = self.meta.date_mask();
        let mut out = String::new();
        write!(out, "{}", date.and_time(NaiveTime::MIN).format(mask)).map_err(|_| {
            ValueError::InvalidMask {
                field: self.meta.name.clone(),
                mask: mask.to_string(),
            }
        })?;
        Ok(out)
    }

    fn parse_date(&self, text: &str) -> Result<NaiveDate, ValueError> {
        let text = text.trim();
        let mask = self.meta.date_mask();
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, mask) {
            return Ok(dt.date());
        }
        std::iter::once(mask)
            .chain(DATE_FALLBACK_PATTERNS.iter().copied())
            .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
            .ok_or_else(|| self.parse_error(text, ValueType::Date))
    }
}

// ════════════════════════════════════════════════════════════════
//  Row
// ════════════════════════════════════════════════════════════════

/// Упорядоченная строка ячеек. Порядок задаёт upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<RowField>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        value: Option<Value>,
    ) -> Self {
        self.push(RowField::new(ValueMeta::new(name, value_type), value));
        self
    }

    pub fn push(&mut self, field: RowField) {
        self.fields.push(field);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&RowField> {
        self.fields.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowField> {
        self.fields.iter()
    }

    fn at(&self, index: usize) -> Result<&RowField, ValueError> {
        self.fields.get(index).ok_or(ValueError::IndexOutOfRange {
            index,
            len: self.fields.len(),
        })
    }

    pub fn get_string(&self, index: usize, default: Option<String>) -> Result<Option<String>, ValueError> {
        self.at(index)?.get_string(default)
    }

    pub fn get_integer(&self, index: usize, default: Option<i64>) -> Result<Option<i64>, ValueError> {
        self.at(index)?.get_integer(default)
    }

    pub fn get_number(&self, index: usize, default: Option<f64>) -> Result<Option<f64>, ValueError> {
        self.at(index)?.get_number(default)
    }

    pub fn get_big_number(
        &self,
        index: usize,
        default: Option<BigDecimal>,
    ) -> Result<Option<BigDecimal>, ValueError> {
        self.at(index)?.get_big_number(default)
    }

    pub fn get_date(&self, index: usize, default: Option<NaiveDate>) -> Result<Option<NaiveDate>, ValueError> {
        self.at(index)?.get_date(default)
    }

    pub fn get_boolean(&self, index: usize, default: Option<bool>) -> Result<Option<bool>, ValueError> {
        self.at(index)?.get_boolean(default)
    }

    pub fn get_binary(&self, index: usize, default: Option<Vec<u8>>) -> Result<Option<Vec<u8>>, ValueError> {
        self.at(index)?.get_binary(default)
    }
}

impl FromIterator<RowField> for Row {
    fn from_iter<I: IntoIterator<Item = RowField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a RowField;
    type IntoIter = std::slice::Iter<'a, RowField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
