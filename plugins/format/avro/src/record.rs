use apache_avro::types::Value;

/// Готовая запись целевой схемы: `(имя, значение)` в порядке полей схемы.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    fields: Vec<(String, Value)>,
}

impl OutputRecord {
    pub(crate) fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Record(self.fields)
    }
}

impl From<OutputRecord> for Value {
    fn from(record: OutputRecord) -> Self {
        record.into_value()
    }
}
