//! # istad-stream: named stream functions for a Kafka binder
//!
//! Declares the processing units a binder wires to topics and the explicit
//! runtime that routes messages to them.
//!
//! ## Functions
//!
//! - **processOracleMessage** (sink): flattens any schema-carrying record into an
//!   ordered field map, tracing every field and the whole record
//! - **processProductDetail** (transform): rewrites a product code to
//!   `ISTAD-<CODE>` and re-emits the product
//! - **processProduct** / **processMessage** (sinks): trace what they receive
//!
//! ## Example: flattening an Avro record
//!
//! ```rust
//! use istad_stream::{flatten, AvroRecord, CapturedTraceSink};
//! use serde_json::json;
//!
//! let schema = AvroRecord::parse_schema(r#"{
//!     "type": "record", "name": "Item",
//!     "fields": [{"name": "id", "type": "int"}, {"name": "name", "type": "string"}]
//! }"#).unwrap();
//! let record = AvroRecord::from_json(&schema, &json!({"id": 42, "name": "widget"})).unwrap();
//!
//! let trace = CapturedTraceSink::new();
//! let flat = flatten(&record, &trace).unwrap();
//!
//! assert_eq!(flat.to_string(), "{id=42, name=widget}");
//! ```
//!
//! ## Example: binding configuration
//!
//! ```yaml
//! definition: processOracleMessage;processProductDetail
//! bindings:
//!   processOracleMessage-in-0:
//!     destination: oracle.records
//!   processProductDetail-in-0:
//!     destination: product.details
//!   processProductDetail-out-0:
//!     destination: product.recoded
//! ```

// Core modules
pub mod error;
pub mod value;
pub mod record;
pub mod avro;
pub mod trace;

// Stream functions
pub mod functions;

// Registry, binding config and dispatch
pub mod runtime;

// Binder-facing message formats
pub mod envelope;
pub mod serialization;

// Re-export key types
pub use error::StreamError;
pub use value::{to_display_string, DynamicValue, FieldDescriptor, FieldKind};
pub use record::{GenericRecord, SchemaCarryingRecord};
pub use avro::AvroRecord;
pub use trace::{CapturedTraceSink, LogTraceSink, TraceSink};

pub use functions::{
    flatten, observe_product, observe_text, recode, FlattenedRecord, Product, ProductObserver,
    ProductRecoder, SchemaFlattener, TextObserver,
};

pub use runtime::{
    process_feed, BindingConfig, BindingDef, Dispatcher, FeedSummary, FunctionKind,
    FunctionRegistry, Outbound, Payload, StreamFunction,
};

pub use envelope::{EnvelopeBody, MessageEnvelope, OutboundEnvelope};
pub use serialization::NdjsonWriter;
