//! Schema-carrying records.
//!
//! A record pairs an ordered list of field descriptors (its schema) with a
//! name-based lookup. Consumers discover the shape at runtime through
//! [`SchemaCarryingRecord::fields`] instead of relying on a compiled struct.

use std::collections::HashMap;

use crate::error::StreamError;
use crate::value::{DynamicValue, FieldDescriptor, FieldKind};

/// A record whose structure is described by an attached schema.
///
/// Implementations must keep `fields()` stable for the lifetime of the value;
/// its order defines iteration order for every consumer.
///
/// # Example
///
/// ```rust
/// use istad_stream::{GenericRecord, SchemaCarryingRecord, DynamicValue};
///
/// let record = GenericRecord::new()
///     .with_field("id", 42)
///     .with_field("name", "widget");
///
/// let names: Vec<&str> = record.fields().iter().map(|f| f.name.as_str()).collect();
/// assert_eq!(names, vec!["id", "name"]);
/// assert_eq!(record.get("id").unwrap(), DynamicValue::Int(42));
/// ```
pub trait SchemaCarryingRecord {
    /// Field descriptors in declared order.
    fn fields(&self) -> &[FieldDescriptor];

    /// Resolve a field value by name.
    ///
    /// # Errors
    /// `StreamError::SchemaResolution` when the field cannot be read.
    fn get(&self, name: &str) -> Result<DynamicValue, StreamError>;

    /// Fully qualified schema name, when the format carries one.
    fn schema_name(&self) -> Option<&str> {
        None
    }
}

/// In-memory record with an explicit descriptor list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericRecord {
    name: Option<String>,
    descriptors: Vec<FieldDescriptor>,
    values: HashMap<String, DynamicValue>,
}

impl GenericRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Append a field to the schema and set its value.
    ///
    /// Re-adding an existing name replaces the value and keeps the original position.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Declare a field in the schema without giving it a value.
    pub fn with_declared_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        if !self.descriptors.iter().any(|d| d.name == name) {
            self.descriptors.push(FieldDescriptor::new(name, kind));
        }
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<DynamicValue>) {
        let name = name.into();
        let value = value.into();
        if !self.descriptors.iter().any(|d| d.name == name) {
            self.descriptors
                .push(FieldDescriptor::new(name.clone(), value.kind()));
        }
        self.values.insert(name, value);
    }

    pub fn field_count(&self) -> usize {
        self.descriptors.len()
    }
}

impl SchemaCarryingRecord for GenericRecord {
    fn fields(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    fn get(&self, name: &str) -> Result<DynamicValue, StreamError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| StreamError::schema_resolution(name))
    }

    fn schema_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
