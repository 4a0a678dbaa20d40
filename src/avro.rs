//! Avro generic records as [`SchemaCarryingRecord`]s.
//!
//! Records reach the flattener as an `apache_avro` record value plus its writer
//! schema. Field descriptors come from the schema; values are converted to
//! [`DynamicValue`] lazily on lookup.

use std::collections::HashMap;

use apache_avro::schema::{Name, RecordSchema, ResolvedSchema};
use apache_avro::types::Value;
use apache_avro::Schema;

use crate::error::StreamError;
use crate::record::SchemaCarryingRecord;
use crate::value::{DynamicValue, FieldDescriptor, FieldKind};

/// Named types (records, enums, fixed) declared anywhere in a schema, keyed by
/// full name. `Schema::Ref` resolves against these.
type Names<'s> = HashMap<Name, &'s Schema>;

/// An Avro record value bound to its record schema.
#[derive(Debug, Clone)]
pub struct AvroRecord {
    schema_name: String,
    descriptors: Vec<FieldDescriptor>,
    values: Vec<(String, Value)>,
}

impl AvroRecord {
    /// Bind a decoded record value to its schema.
    ///
    /// # Errors
    /// `UnexpectedFault` if the schema is not a record schema or the value is not
    /// a record.
    pub fn new(schema: &Schema, value: Value) -> Result<Self, StreamError> {
        let record_schema = record_schema(schema)?;
        let resolved = ResolvedSchema::try_from(schema)?;

        let values = match value {
            Value::Record(fields) => fields,
            Value::Union(_, inner) => match *inner {
                Value::Record(fields) => fields,
                other => {
                    return Err(StreamError::fault(format!(
                        "avro: expected record value, got {:?}",
                        other
                    )))
                }
            },
            other => {
                return Err(StreamError::fault(format!(
                    "avro: expected record value, got {:?}",
                    other
                )))
            }
        };

        let descriptors = record_schema
            .fields
            .iter()
            .map(|field| {
                FieldDescriptor::new(
                    field.name.clone(),
                    schema_kind(&field.schema, resolved.get_names()),
                )
            })
            .collect();

        Ok(Self {
            schema_name: record_schema.name.fullname(None),
            descriptors,
            values,
        })
    }

    /// Decode a raw Avro datum written with `schema`.
    pub fn from_datum(schema: &Schema, data: &[u8]) -> Result<Self, StreamError> {
        let mut reader = data;
        let value = apache_avro::from_avro_datum(schema, &mut reader, None)?;
        Self::new(schema, value)
    }

    /// Build a record from a JSON object, following the schema's field list.
    ///
    /// Fields absent from the object take the schema default, or null when the
    /// schema declares none. The result is validated against the schema.
    pub fn from_json(schema: &Schema, json: &serde_json::Value) -> Result<Self, StreamError> {
        let resolved = ResolvedSchema::try_from(schema)?;
        let value = json_to_avro(json, schema, resolved.get_names())?;
        if !value.validate(schema) {
            return Err(StreamError::fault(format!(
                "avro: value does not match schema '{}'",
                record_schema(schema)?.name.fullname(None)
            )));
        }
        Self::new(schema, value)
    }

    /// Parse a schema from its JSON text.
    pub fn parse_schema(schema_json: &str) -> Result<Schema, StreamError> {
        Ok(Schema::parse_str(schema_json)?)
    }
}

impl SchemaCarryingRecord for AvroRecord {
    fn fields(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    fn get(&self, name: &str) -> Result<DynamicValue, StreamError> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| avro_to_dynamic(value))
            .ok_or_else(|| StreamError::schema_resolution(name))
    }

    fn schema_name(&self) -> Option<&str> {
        Some(&self.schema_name)
    }
}

fn record_schema(schema: &Schema) -> Result<&RecordSchema, StreamError> {
    match schema {
        Schema::Record(record) => Ok(record),
        other => Err(StreamError::fault(format!(
            "avro: expected record schema, got {:?}",
            other
        ))),
    }
}

/// Kind hint for a field schema. Nullable unions report their non-null branch;
/// references report the kind of the named type.
fn schema_kind(schema: &Schema, names: &Names<'_>) -> FieldKind {
    match schema {
        Schema::Null => FieldKind::Null,
        Schema::Boolean => FieldKind::Bool,
        Schema::Int
        | Schema::Long
        | Schema::Date
        | Schema::TimeMillis
        | Schema::TimeMicros
        | Schema::TimestampMillis
        | Schema::TimestampMicros => FieldKind::Int,
        Schema::Float | Schema::Double => FieldKind::Float,
        Schema::String | Schema::Enum(_) | Schema::Uuid => FieldKind::String,
        Schema::Bytes | Schema::Fixed(_) | Schema::Array(_) => FieldKind::Array,
        Schema::Map(_) | Schema::Record(_) => FieldKind::Record,
        Schema::Union(union_schema) => {
            let mut non_null = union_schema
                .variants()
                .iter()
                .filter(|variant| !matches!(variant, Schema::Null));
            match (non_null.next(), non_null.next()) {
                (Some(only), None) => schema_kind(only, names),
                (None, _) => FieldKind::Null,
                _ => FieldKind::Mixed,
            }
        }
        Schema::Ref { name } => names
            .get(name)
            .map_or(FieldKind::Mixed, |named| schema_kind(named, names)),
        _ => FieldKind::Mixed,
    }
}

/// Convert an Avro value to a [`DynamicValue`].
pub fn avro_to_dynamic(value: &Value) -> DynamicValue {
    match value {
        Value::Null => DynamicValue::Null,
        Value::Boolean(b) => DynamicValue::Bool(*b),
        Value::Int(i) => DynamicValue::Int(i64::from(*i)),
        Value::Long(l) => DynamicValue::Int(*l),
        // Widen through the shortest f32 text so 0.1f32 stays 0.1
        Value::Float(f) => DynamicValue::Float(
            f.to_string()
                .parse::<f64>()
                .unwrap_or_else(|_| f64::from(*f)),
        ),
        Value::Double(d) => DynamicValue::Float(*d),
        Value::String(s) | Value::Enum(_, s) => DynamicValue::String(s.clone()),
        Value::Bytes(b) | Value::Fixed(_, b) => {
            DynamicValue::Array(b.iter().map(|byte| DynamicValue::Int(i64::from(*byte))).collect())
        }
        Value::Union(_, inner) => avro_to_dynamic(inner),
        Value::Array(items) => DynamicValue::Array(items.iter().map(avro_to_dynamic).collect()),
        Value::Map(entries) => {
            // HashMap order is arbitrary; sort so trace output is reproducible
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            DynamicValue::Record(
                keys.into_iter()
                    .map(|k| (k.clone(), avro_to_dynamic(&entries[k])))
                    .collect(),
            )
        }
        Value::Record(fields) => DynamicValue::Record(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), avro_to_dynamic(v)))
                .collect(),
        ),
        Value::Date(d) => DynamicValue::Int(i64::from(*d)),
        Value::TimeMillis(t) => DynamicValue::Int(i64::from(*t)),
        Value::TimeMicros(t) => DynamicValue::Int(*t),
        Value::TimestampMillis(t) => DynamicValue::Int(*t),
        Value::TimestampMicros(t) => DynamicValue::Int(*t),
        Value::TimestampNanos(t) => DynamicValue::Int(*t),
        Value::LocalTimestampMillis(t) => DynamicValue::Int(*t),
        Value::LocalTimestampMicros(t) => DynamicValue::Int(*t),
        Value::LocalTimestampNanos(t) => DynamicValue::Int(*t),
        Value::Uuid(u) => DynamicValue::String(u.to_string()),
        other => DynamicValue::String(format!("{:?}", other)),
    }
}

/// Convert JSON to an Avro value shaped by `schema`.
fn json_to_avro(
    json: &serde_json::Value,
    schema: &Schema,
    names: &Names<'_>,
) -> Result<Value, StreamError> {
    use serde_json::Value as Json;

    match (json, schema) {
        (val, Schema::Ref { name }) => match names.get(name) {
            Some(named) => json_to_avro(val, named, names),
            None => Err(StreamError::fault(format!(
                "avro: unknown named type '{}'",
                name.fullname(None)
            ))),
        },
        // First branch that converts wins; each arm only builds values of its own type
        (val, Schema::Union(union_schema)) => {
            for (idx, variant) in union_schema.variants().iter().enumerate() {
                if let Ok(v) = json_to_avro(val, variant, names) {
                    return Ok(Value::Union(idx as u32, Box::new(v)));
                }
            }
            Err(StreamError::fault(format!(
                "avro: no union branch accepts {}",
                val
            )))
        }
        (Json::Null, Schema::Null) => Ok(Value::Null),
        (Json::Bool(b), Schema::Boolean) => Ok(Value::Boolean(*b)),
        (Json::Number(n), Schema::Int) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::Int)
            .ok_or_else(|| StreamError::fault(format!("avro: {} is not an int", n))),
        (Json::Number(n), Schema::Long) => n
            .as_i64()
            .map(Value::Long)
            .ok_or_else(|| StreamError::fault(format!("avro: {} is not a long", n))),
        (Json::Number(n), Schema::Float) => n
            .as_f64()
            .map(|f| Value::Float(f as f32))
            .ok_or_else(|| StreamError::fault(format!("avro: {} is not a float", n))),
        (Json::Number(n), Schema::Double) => n
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| StreamError::fault(format!("avro: {} is not a double", n))),
        (Json::String(s), Schema::String) => Ok(Value::String(s.clone())),
        (Json::String(s), Schema::Bytes) => Ok(Value::Bytes(s.clone().into_bytes())),
        (Json::String(s), Schema::Enum(enum_schema)) => enum_schema
            .symbols
            .iter()
            .position(|symbol| symbol == s)
            .map(|idx| Value::Enum(idx as u32, s.clone()))
            .ok_or_else(|| StreamError::fault(format!("avro: '{}' is not an enum symbol", s))),
        (Json::Array(items), Schema::Array(array_schema)) => {
            let values: Result<Vec<Value>, StreamError> = items
                .iter()
                .map(|item| json_to_avro(item, &array_schema.items, names))
                .collect();
            Ok(Value::Array(values?))
        }
        (Json::Object(map), Schema::Map(map_schema)) => {
            let mut entries = HashMap::with_capacity(map.len());
            for (key, item) in map {
                entries.insert(key.clone(), json_to_avro(item, &map_schema.types, names)?);
            }
            Ok(Value::Map(entries))
        }
        (Json::Object(map), Schema::Record(record)) => {
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let field_json = map
                    .get(&field.name)
                    .or(field.default.as_ref())
                    .unwrap_or(&Json::Null);
                fields.push((field.name.clone(), json_to_avro(field_json, &field.schema, names)?));
            }
            Ok(Value::Record(fields))
        }
        (val, other) => Err(StreamError::fault(format!(
            "avro: cannot convert {} to {:?}",
            val, other
        ))),
    }
}
