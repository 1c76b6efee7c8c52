//! Typed row → Avro record writer.
//!
//! [`AvroRecordWriter`] converts loosely-typed [`row_api::Row`]s into records
//! of a target Avro schema, field by field, resolving schema defaults for
//! missing values, and appends each completed record to a [`RecordSink`].

pub mod config;
pub mod convert;
pub mod default;
pub mod error;
pub mod record;
pub mod schema;
pub mod sink;
pub mod writer;

pub use apache_avro;
pub use row_api;

pub use config::{AbsentFieldPolicy, UnknownFieldPolicy, WriterConfig};
pub use default::{opaque_bytes, DefaultLiteral, FieldDefault};
pub use error::{ConfigError, ConversionError, SchemaError, SinkError, WriteError};
pub use record::OutputRecord;
pub use schema::{FieldType, SchemaField, TargetSchema};
pub use sink::{AvroFileSink, MemorySink, RecordSink};
pub use writer::AvroRecordWriter;
