use apache_avro::types::Value;
use apache_avro::Schema;
use row_api::{Row, RowField};

use crate::config::{AbsentFieldPolicy, UnknownFieldPolicy, WriterConfig};
use crate::convert::coerce;
use crate::error::{ConversionError, SchemaError, SinkError, WriteError};
use crate::record::OutputRecord;
use crate::schema::TargetSchema;
use crate::sink::RecordSink;

/// Row → Avro record writer.
///
/// Каждая строка превращается ровно в одну запись целевой схемы. Конвертация
/// идёт по полям в порядке строки; если хоть одно поле не сконвертировалось,
/// в sink ничего не попадает.
///
/// ```ignore
/// let schema = Schema::parse_str(AVRO_JSON)?;
/// let sink = AvroFileSink::new(&schema, File::create("out.avro")?);
/// let mut writer = AvroRecordWriter::new(&schema, sink, WriterConfig::default())?;
/// for row in rows {
///     writer.write(&row)?;
/// }
/// writer.close()?;
/// ```
pub struct AvroRecordWriter<S: RecordSink> {
    schema: TargetSchema,
    sink: S,
    config: WriterConfig,
    rows_written: u64,
    closed: bool,
}

impl<S: RecordSink> AvroRecordWriter<S> {
    /// Resolve field defaults of `schema` once and bind the writer to `sink`.
    pub fn new(schema: &Schema, sink: S, config: WriterConfig) -> Result<Self, SchemaError> {
        let target = TargetSchema::from_avro(schema, &config)?;
        Ok(Self::from_target(target, sink, config))
    }

    /// Use an already prepared target schema (e.g. with defaults set in code).
    pub fn from_target(schema: TargetSchema, sink: S, config: WriterConfig) -> Self {
        tracing::debug!(
            schema = %schema.name(),
            fields = schema.len(),
            "avro record writer ready"
        );
        Self {
            schema,
            sink,
            config,
            rows_written: 0,
            closed: false,
        }
    }

    /// Convert one row and append the record to the sink.
    pub fn write(&mut self, row: &Row) -> Result<(), WriteError> {
        if self.closed {
            return Err(SinkError::Closed.into());
        }
        let record = self.convert(row)?;
        self.sink.append(record)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Convert one row without touching the sink.
    pub fn convert(&self, row: &Row) -> Result<OutputRecord, ConversionError> {
        let mut slots: Vec<Option<Value>> = vec![None; self.schema.len()];

        for source in row {
            let Some(field) = self.schema.field(source.name()) else {
                match self.config.unknown_fields {
                    UnknownFieldPolicy::Skip => {
                        tracing::debug!(field = %source.name(), "field not in target schema, skipped");
                        continue;
                    }
                    UnknownFieldPolicy::Reject => {
                        return Err(ConversionError::UnknownField(source.name().to_string()));
                    }
                }
            };
            slots[field.position()] = Some(coerce(field, source)?);
        }

        let mut values = Vec::with_capacity(slots.len());
        for (field, slot) in self.schema.fields().iter().zip(slots) {
            let value = match slot {
                Some(value) => value,
                None => match self.config.absent_fields {
                    AbsentFieldPolicy::Fill => {
                        let source = RowField::null(field.name(), field.field_type().source_type());
                        coerce(field, &source)?
                    }
                    AbsentFieldPolicy::Reject => {
                        return Err(ConversionError::AbsentField(field.name().to_string()));
                    }
                },
            };
            values.push((field.name().to_string(), value));
        }

        Ok(OutputRecord::new(values))
    }

    /// Close the sink. Second and later calls do nothing.
    pub fn close(&mut self) -> Result<(), WriteError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close()?;
        tracing::debug!(schema = %self.schema.name(), rows = self.rows_written, "avro record writer closed");
        Ok(())
    }

    pub fn schema(&self) -> &TargetSchema {
        &self.schema
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Rows successfully appended to the sink.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
