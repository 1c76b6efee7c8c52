pub mod error;
pub mod row;
pub mod types;

pub use error::ValueError;
pub use row::{Row, RowField, ValueMeta, DEFAULT_DATE_MASK};
pub use types::{decimal_from_f64, Value, ValueType};
