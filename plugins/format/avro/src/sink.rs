use std::io::Write;

use apache_avro::{Schema, Writer};

use crate::error::SinkError;
use crate::record::OutputRecord;

/// Приёмник готовых записей. Владеет жизненным циклом потока.
///
/// `append` is called exactly once per converted row, `close` once at the
/// end of the stream.
pub trait RecordSink {
    fn append(&mut self, record: OutputRecord) -> Result<(), SinkError>;

    fn close(&mut self) -> Result<(), SinkError>;
}

// ═══════════════════════════════════════════════════════════════
//  AvroFileSink
// ═══════════════════════════════════════════════════════════════

/// Avro object container file written to any `Write`.
///
/// `close` flushes the last block and keeps the underlying writer; take it
/// back with [`AvroFileSink::into_inner`]. Closing twice is a no-op.
pub struct AvroFileSink<'a, W: Write> {
    writer: Option<Writer<'a, W>>,
    inner: Option<W>,
}

impl<'a, W: Write> AvroFileSink<'a, W> {
    pub fn new(schema: &'a Schema, out: W) -> Self {
        Self {
            writer: Some(Writer::new(schema, out)),
            inner: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Close (if still open) and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W, SinkError> {
        self.close()?;
        self.inner.take().ok_or(SinkError::Closed)
    }
}

impl<W: Write> RecordSink for AvroFileSink<'_, W> {
    fn append(&mut self, record: OutputRecord) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        writer.append(record.into_value())?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let mut out = writer.into_inner()?;
        out.flush()?;
        self.inner = Some(out);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemorySink
// ═══════════════════════════════════════════════════════════════

/// Collects records in memory. Для тестов и dry-run прогонов.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<OutputRecord>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OutputRecord> {
        self.records
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: OutputRecord) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.records.push(record);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use apache_avro::types::Value;
    use apache_avro::Reader;

    use super::*;

    fn schema() -> Schema {
        Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [{"name": "id", "type": "long"}]}"#,
        )
        .unwrap()
    }

    fn record(id: i64) -> OutputRecord {
        OutputRecord::new(vec![("id".into(), Value::Long(id))])
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_file_sink_roundtrip() {
        let schema = schema();
        let mut sink = AvroFileSink::new(&schema, Vec::new());
        sink.append(record(1)).unwrap();
        sink.append(record(2)).unwrap();
        let bytes = sink.into_inner().unwrap();

        let ids: Vec<Value> = Reader::new(&bytes[..]).unwrap().map(|v| v.unwrap()).collect();
        assert_eq!(
            ids,
            vec![
                Value::Record(vec![("id".into(), Value::Long(1))]),
                Value::Record(vec![("id".into(), Value::Long(2))]),
            ]
        );
    }

    #[test]
    fn test_file_sink_close_is_idempotent() {
        let schema = schema();
        let mut sink = AvroFileSink::new(&schema, Vec::new());
        sink.append(record(1)).unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());
        sink.close().unwrap();
        assert!(matches!(sink.append(record(2)), Err(SinkError::Closed)));
        assert!(!sink.into_inner().unwrap().is_empty());
    }

    #[test]
    fn test_file_sink_io_failure() {
        let schema = schema();
        let mut sink = AvroFileSink::new(&schema, BrokenPipe);
        let err = sink.append(record(1)).unwrap_err();
        assert!(matches!(err, SinkError::Avro(_)));
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.append(record(1)).unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());
        assert!(matches!(sink.append(record(2)), Err(SinkError::Closed)));
        assert_eq!(sink.into_records(), vec![record(1)]);
    }
}
