use std::collections::HashMap;

use apache_avro::schema::UnionSchema;
use apache_avro::Schema;
use row_api::ValueType;
use serde::Serialize;

use crate::config::WriterConfig;
use crate::default::{opaque_bytes, DefaultLiteral, FieldDefault};
use crate::error::SchemaError;

// ════════════════════════════════════════════════════════════════
//  FieldType
// ════════════════════════════════════════════════════════════════

/// Объявленный тип поля целевой схемы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Decimal,
    Date,
    Boolean,
    Bytes,
}

impl FieldType {
    /// Source type assumed for a schema field the row does not carry.
    pub fn source_type(self) -> ValueType {
        match self {
            FieldType::Text => ValueType::String,
            FieldType::Integer => ValueType::Integer,
            FieldType::Float => ValueType::Number,
            FieldType::Decimal => ValueType::BigNumber,
            FieldType::Date => ValueType::Date,
            FieldType::Boolean => ValueType::Boolean,
            FieldType::Bytes => ValueType::Binary,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Float => write!(f, "floating-point"),
            FieldType::Decimal => write!(f, "decimal"),
            FieldType::Date => write!(f, "date"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Bytes => write!(f, "bytes"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Storage (physical Avro type)
// ════════════════════════════════════════════════════════════════

/// Physical Avro type of a field's value branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Storage {
    String,
    Int,
    Long,
    Float,
    Double,
    Decimal { precision: usize, scale: usize },
    BigDecimal,
    Date,
    Boolean,
    Bytes,
    Fixed(usize),
}

impl Storage {
    fn from_avro(field: &str, schema: &Schema) -> Result<Self, SchemaError> {
        Ok(match schema {
            Schema::String => Storage::String,
            Schema::Int => Storage::Int,
            Schema::Long => Storage::Long,
            Schema::Float => Storage::Float,
            Schema::Double => Storage::Double,
            Schema::Decimal(d) => Storage::Decimal {
                precision: d.precision,
                scale: d.scale,
            },
            Schema::BigDecimal => Storage::BigDecimal,
            Schema::Date => Storage::Date,
            Schema::Boolean => Storage::Boolean,
            Schema::Bytes => Storage::Bytes,
            Schema::Fixed(fixed) => Storage::Fixed(fixed.size),
            other => return Err(unsupported(field, other)),
        })
    }

    fn field_type(self) -> FieldType {
        match self {
            Storage::String => FieldType::Text,
            Storage::Int | Storage::Long => FieldType::Integer,
            Storage::Float | Storage::Double => FieldType::Float,
            Storage::Decimal { .. } | Storage::BigDecimal => FieldType::Decimal,
            Storage::Date => FieldType::Date,
            Storage::Boolean => FieldType::Boolean,
            Storage::Bytes | Storage::Fixed(_) => FieldType::Bytes,
        }
    }
}

impl std::fmt::Display for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Storage::String => write!(f, "string"),
            Storage::Int => write!(f, "int"),
            Storage::Long => write!(f, "long"),
            Storage::Float => write!(f, "float"),
            Storage::Double => write!(f, "double"),
            Storage::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Storage::BigDecimal => write!(f, "big-decimal"),
            Storage::Date => write!(f, "date"),
            Storage::Boolean => write!(f, "boolean"),
            Storage::Bytes => write!(f, "bytes"),
            Storage::Fixed(size) => write!(f, "fixed({size})"),
        }
    }
}

fn unsupported(field: &str, schema: &Schema) -> SchemaError {
    SchemaError::UnsupportedType {
        field: field.to_string(),
        schema: schema.canonical_form(),
    }
}

/// Branch indexes of a `["null", T]` union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NullableUnion {
    pub null_index: u32,
    pub value_index: u32,
}

/// Nullable union (`["null", T]` в любом порядке) → физический тип `T`.
fn nullable(field: &str, union: &UnionSchema) -> Result<(Storage, NullableUnion), SchemaError> {
    match union.variants() {
        [Schema::Null, inner] => Ok((
            Storage::from_avro(field, inner)?,
            NullableUnion { null_index: 0, value_index: 1 },
        )),
        [inner, Schema::Null] => Ok((
            Storage::from_avro(field, inner)?,
            NullableUnion { null_index: 1, value_index: 0 },
        )),
        _ => Err(unsupported(field, &Schema::Union(union.clone()))),
    }
}

// ════════════════════════════════════════════════════════════════
//  SchemaField
// ════════════════════════════════════════════════════════════════

/// Одно поле целевой схемы с уже разрешённым default.
#[derive(Debug, Clone)]
pub struct SchemaField {
    name: String,
    position: usize,
    storage: Storage,
    union: Option<NullableUnion>,
    default: FieldDefault,
}

impl SchemaField {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the target record.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn field_type(&self) -> FieldType {
        self.storage.field_type()
    }

    pub fn is_nullable(&self) -> bool {
        self.union.is_some()
    }

    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    pub(crate) fn storage(&self) -> Storage {
        self.storage
    }

    pub(crate) fn union(&self) -> Option<NullableUnion> {
        self.union
    }
}

// ════════════════════════════════════════════════════════════════
//  TargetSchema
// ════════════════════════════════════════════════════════════════

/// Target record schema as seen by the coercion engine.
///
/// Built once from an Avro record schema; fields keep the Avro order and
/// are looked up by name.
#[derive(Debug, Clone)]
pub struct TargetSchema {
    name: String,
    fields: Vec<SchemaField>,
    lookup: HashMap<String, usize>,
    date_default_pattern: String,
}

impl TargetSchema {
    /// Build from an Avro record schema.
    ///
    /// Defaults come from `config.field_defaults` when present, otherwise from
    /// the Avro field's own `default`.
    pub fn from_avro(schema: &Schema, config: &WriterConfig) -> Result<Self, SchemaError> {
        let Schema::Record(record) = schema else {
            return Err(SchemaError::NotARecord(schema.canonical_form()));
        };

        let mut fields = Vec::with_capacity(record.fields.len());
        let mut lookup = HashMap::with_capacity(record.fields.len());

        for (position, field) in record.fields.iter().enumerate() {
            let (storage, union) = match &field.schema {
                Schema::Union(union) => {
                    let (storage, union) = nullable(&field.name, union)?;
                    (storage, Some(union))
                }
                other => (Storage::from_avro(&field.name, other)?, None),
            };

            let field_type = storage.field_type();
            let literal = config
                .field_defaults
                .get(&field.name)
                .or(field.default.as_ref())
                .map_or(DefaultLiteral::None, |v| DefaultLiteral::from_json(v, field_type));
            let default = FieldDefault::resolve(
                &field.name,
                field_type,
                &literal,
                &config.date_default_pattern,
            );
            if let FieldDefault::Invalid(reason) = &default {
                tracing::warn!(field = %field.name, %field_type, %reason, "unparseable default, rows touching this field will fail");
            }

            lookup.insert(field.name.clone(), position);
            fields.push(SchemaField {
                name: field.name.clone(),
                position,
                storage,
                union,
                default,
            });
        }

        if let Some(unknown) = config.field_defaults.keys().find(|k| !lookup.contains_key(*k)) {
            return Err(SchemaError::UnknownField(unknown.clone()));
        }

        Ok(Self {
            name: record.name.fullname(None),
            fields,
            lookup,
            date_default_pattern: config.date_default_pattern.clone(),
        })
    }

    /// Parse an Avro schema (JSON) and build from it.
    pub fn parse_str(avro_json: &str, config: &WriterConfig) -> Result<Self, SchemaError> {
        let schema = Schema::parse_str(avro_json)?;
        Self::from_avro(&schema, config)
    }

    /// Replace a field's default with a new literal.
    pub fn set_default(&mut self, name: &str, literal: DefaultLiteral) -> Result<(), SchemaError> {
        let idx = self.index(name)?;
        let field = &mut self.fields[idx];
        field.default = FieldDefault::resolve(
            &field.name,
            field.storage.field_type(),
            &literal,
            &self.date_default_pattern,
        );
        Ok(())
    }

    /// Materialize a `bytes` default from an arbitrary serializable value.
    ///
    /// A value that cannot be encoded leaves the field without a default.
    pub fn set_opaque_default<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<(), SchemaError> {
        let idx = self.index(name)?;
        let field = &mut self.fields[idx];
        let field_type = field.storage.field_type();
        if field_type != FieldType::Bytes {
            return Err(SchemaError::OpaqueDefault {
                field: field.name.clone(),
                field_type,
            });
        }
        field.default = FieldDefault::Bytes(opaque_bytes(value));
        Ok(())
    }

    fn index(&self, name: &str) -> Result<usize, SchemaError> {
        self.lookup
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownField(name.to_string()))
    }

    /// Fully qualified record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.lookup.get(name).map(|&idx| &self.fields[idx])
    }

    /// Fields in record order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "Order",
        "namespace": "shop",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "code", "type": "string", "default": "n/a"},
            {"name": "qty", "type": "int"},
            {"name": "price", "type": "double"},
            {"name": "amount", "type": {"type": "bytes", "logicalType": "decimal", "precision": 10, "scale": 2}},
            {"name": "placed", "type": {"type": "int", "logicalType": "date"}},
            {"name": "paid", "type": "boolean"},
            {"name": "blob", "type": ["null", "bytes"], "default": null},
            {"name": "note", "type": ["string", "null"]}
        ]
    }"#;

    fn target(config: &WriterConfig) -> TargetSchema {
        TargetSchema::parse_str(SCHEMA, config).unwrap()
    }

    #[test]
    fn test_field_types_from_avro() {
        let schema = target(&WriterConfig::default());
        assert_eq!(schema.name(), "shop.Order");
        assert_eq!(schema.len(), 9);

        let types: Vec<FieldType> = schema.fields().iter().map(|f| f.field_type()).collect();
        assert_eq!(
            types,
            vec![
                FieldType::Integer,
                FieldType::Text,
                FieldType::Integer,
                FieldType::Float,
                FieldType::Decimal,
                FieldType::Date,
                FieldType::Boolean,
                FieldType::Bytes,
                FieldType::Text,
            ]
        );
        assert_eq!(schema.field("qty").unwrap().storage(), Storage::Int);
        assert_eq!(
            schema.field("amount").unwrap().storage(),
            Storage::Decimal { precision: 10, scale: 2 }
        );
    }

    #[test]
    fn test_nullable_unions() {
        let schema = target(&WriterConfig::default());
        let blob = schema.field("blob").unwrap();
        assert!(blob.is_nullable());
        assert_eq!(blob.union(), Some(NullableUnion { null_index: 0, value_index: 1 }));
        let note = schema.field("note").unwrap();
        assert_eq!(note.union(), Some(NullableUnion { null_index: 1, value_index: 0 }));
        assert!(!schema.field("id").unwrap().is_nullable());
    }

    #[test]
    fn test_defaults_from_avro_and_config() {
        let mut config = WriterConfig::default();
        config.field_defaults.insert("qty".into(), json!("42"));
        config.field_defaults.insert("placed".into(), json!("03/15/2023"));
        let schema = target(&config);

        assert_eq!(schema.field("code").unwrap().default(), &FieldDefault::Text("n/a".into()));
        assert_eq!(schema.field("qty").unwrap().default(), &FieldDefault::Integer(Some(42)));
        assert_eq!(
            schema.field("placed").unwrap().default(),
            &FieldDefault::Date(chrono::NaiveDate::from_ymd_opt(2023, 3, 15))
        );
        assert_eq!(schema.field("note").unwrap().default(), &FieldDefault::Text("null".into()));
        assert_eq!(schema.field("blob").unwrap().default(), &FieldDefault::Bytes(None));
    }

    #[test]
    fn test_default_for_unknown_field_is_rejected() {
        let mut config = WriterConfig::default();
        config.field_defaults.insert("qtty".into(), json!(1));
        let err = TargetSchema::parse_str(SCHEMA, &config).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField(ref f) if f == "qtty"));
    }

    #[test]
    fn test_set_default() {
        let mut schema = target(&WriterConfig::default());
        schema.set_default("paid", DefaultLiteral::Text("TRUE".into())).unwrap();
        assert_eq!(schema.field("paid").unwrap().default(), &FieldDefault::Boolean(true));
        assert!(schema.set_default("missing", DefaultLiteral::None).is_err());
    }

    #[test]
    fn test_set_opaque_default() {
        let mut schema = target(&WriterConfig::default());
        schema.set_opaque_default("blob", &vec![1, 2]).unwrap();
        assert_eq!(schema.field("blob").unwrap().default(), &FieldDefault::Bytes(Some(b"[1,2]".to_vec())));

        let mut not_json: HashMap<(u8, u8), u8> = HashMap::new();
        not_json.insert((0, 0), 0);
        schema.set_opaque_default("blob", &not_json).unwrap();
        assert_eq!(schema.field("blob").unwrap().default(), &FieldDefault::Bytes(None));

        let err = schema.set_opaque_default("qty", &1).unwrap_err();
        assert!(matches!(err, SchemaError::OpaqueDefault { field_type: FieldType::Integer, .. }));
    }

    #[test]
    fn test_non_record_schema() {
        let err = TargetSchema::parse_str(r#""string""#, &WriterConfig::default()).unwrap_err();
        assert!(matches!(err, SchemaError::NotARecord(_)));
    }

    #[test]
    fn test_unsupported_field_types() {
        let array = r#"{"type": "record", "name": "R", "fields": [
            {"name": "tags", "type": {"type": "array", "items": "string"}}
        ]}"#;
        let err = TargetSchema::parse_str(array, &WriterConfig::default()).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { ref field, .. } if field == "tags"));

        let union = r#"{"type": "record", "name": "R", "fields": [
            {"name": "v", "type": ["null", "string", "long"]}
        ]}"#;
        let err = TargetSchema::parse_str(union, &WriterConfig::default()).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { ref field, .. } if field == "v"));
    }
}
