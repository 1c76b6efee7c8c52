use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

// ════════════════════════════════════════════════════════════════
//  Value Type
// ════════════════════════════════════════════════════════════════

/// Объявленный тип значения в строке (тип источника).
///
/// Тег описывает, как upstream интерпретирует ячейку. Сами данные
/// могут прийти в нативном виде или как текст.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    /// Double precision.
    Number,
    /// Arbitrary precision decimal.
    BigNumber,
    Date,
    Boolean,
    Binary,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::String => write!(f, "string"),
            ValueType::Integer => write!(f, "integer"),
            ValueType::Number => write!(f, "number"),
            ValueType::BigNumber => write!(f, "bignumber"),
            ValueType::Date => write!(f, "date"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::Binary => write!(f, "binary"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Value
// ════════════════════════════════════════════════════════════════

/// Значение ячейки в нативном представлении источника.
///
/// Отсутствующее значение (null) моделируется как `Option<Value>::None`
/// на уровне [`RowField`](crate::RowField), а не отдельным вариантом.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Number(f64),
    BigNumber(BigDecimal),
    Date(NaiveDate),
    Boolean(bool),
    Binary(Vec<u8>),
}

impl Value {
    /// Тип, который соответствует нативному представлению значения.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Integer(_) => ValueType::Integer,
            Value::Number(_) => ValueType::Number,
            Value::BigNumber(_) => ValueType::BigNumber,
            Value::Date(_) => ValueType::Date,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Binary(_) => ValueType::Binary,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::BigNumber(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

/// Decimal from a double using its shortest round-trip text form.
///
/// Returns `None` for NaN and infinities.
pub fn decimal_from_f64(n: f64) -> Option<BigDecimal> {
    if !n.is_finite() {
        return None;
    }
    BigDecimal::from_str(&n.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_matches_variant() {
        assert_eq!(Value::from("a").value_type(), ValueType::String);
        assert_eq!(Value::from(1_i64).value_type(), ValueType::Integer);
        assert_eq!(Value::from(1.5).value_type(), ValueType::Number);
        assert_eq!(Value::from(true).value_type(), ValueType::Boolean);
        assert_eq!(Value::from(vec![1_u8]).value_type(), ValueType::Binary);
    }

    #[test]
    fn test_decimal_from_f64() {
        let d = decimal_from_f64(3.25).unwrap();
        assert_eq!(d, BigDecimal::from_str("3.25").unwrap());
        assert!(decimal_from_f64(f64::NAN).is_none());
        assert!(decimal_from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(ValueType::BigNumber.to_string(), "bignumber");
        assert_eq!(ValueType::Date.to_string(), "date");
    }
}
