//! Generic-record flattening sink.
//!
//! Walks the schema attached to a record, resolves each declared field and
//! collects the results into an ordered [`FlattenedRecord`].

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::StreamError;
use crate::record::SchemaCarryingRecord;
use crate::runtime::registry::{FunctionKind, Payload, StreamFunction};
use crate::trace::TraceSink;
use crate::value::{render_entries, DynamicValue};

use super::PROCESS_ORACLE_MESSAGE;

/// Field name -> value, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlattenedRecord(IndexMap<String, DynamicValue>);

impl FlattenedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    pub fn insert(&mut self, name: String, value: DynamicValue) {
        self.0.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&DynamicValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in schema order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DynamicValue)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> IndexMap<String, DynamicValue> {
        self.0
    }
}

impl fmt::Display for FlattenedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_entries(self.0.iter()))
    }
}

/// Flatten a schema-carrying record into an ordered field map.
///
/// Emits `"<field>: <value>"` for every field as it is resolved, then a single
/// `"Full Record: {...}"` line once all fields are collected.
///
/// # Errors
/// `SchemaResolution` as soon as a declared field cannot be read. The
/// whole-record line is not emitted in that case.
///
/// # Example
///
/// ```rust
/// use istad_stream::{flatten, CapturedTraceSink, GenericRecord};
///
/// let record = GenericRecord::new().with_field("id", 42).with_field("name", "widget");
/// let trace = CapturedTraceSink::new();
///
/// let flat = flatten(&record, &trace).unwrap();
/// assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["id", "name"]);
/// assert_eq!(trace.lines(), vec!["id: 42", "name: widget", "Full Record: {id=42, name=widget}"]);
/// ```
pub fn flatten<R>(record: &R, trace: &dyn TraceSink) -> Result<FlattenedRecord, StreamError>
where
    R: SchemaCarryingRecord + ?Sized,
{
    let fields = record.fields();
    let mut data = FlattenedRecord::with_capacity(fields.len());

    for field in fields {
        let value = record.get(&field.name)?;
        trace.emit(&format!("{}: {}", field.name, value));
        data.insert(field.name.clone(), value);
    }

    trace.emit(&format!("Full Record: {}", data));

    tracing::debug!(
        schema = record.schema_name().unwrap_or("<anonymous>"),
        fields = data.len(),
        "Flattened record"
    );

    Ok(data)
}

/// Sink bound to generic-record channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaFlattener;

impl StreamFunction for SchemaFlattener {
    fn name(&self) -> &str {
        PROCESS_ORACLE_MESSAGE
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Sink
    }

    fn apply(&self, payload: Payload, trace: &dyn TraceSink) -> Result<Option<Payload>, StreamError> {
        match payload {
            Payload::Record(record) => {
                flatten(record.as_ref(), trace)?;
                Ok(None)
            }
            other => Err(StreamError::fault(format!(
                "{} expects a record payload, got {}",
                PROCESS_ORACLE_MESSAGE,
                other.kind_name()
            ))),
        }
    }
}
