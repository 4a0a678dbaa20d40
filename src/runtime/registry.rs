//! Function registry for stream processing units.
//!
//! Stream functions are registered by name into an explicit [`FunctionRegistry`]
//! built once at startup. The [`Dispatcher`](crate::runtime::Dispatcher) looks
//! functions up by the names listed in the binding configuration.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::StreamError;
use crate::functions::{
    Product, ProductObserver, ProductRecoder, SchemaFlattener, TextObserver,
};
use crate::record::SchemaCarryingRecord;
use crate::trace::TraceSink;

/// A message body handed to a stream function.
pub enum Payload {
    Record(Box<dyn SchemaCarryingRecord + Send + Sync>),
    Product(Product),
    Text(String),
}

impl Payload {
    /// Short name of the payload variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Record(_) => "record",
            Payload::Product(_) => "product",
            Payload::Text(_) => "text",
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Record(record) => f
                .debug_struct("Record")
                .field("schema", &record.schema_name())
                .field("fields", &record.fields().len())
                .finish(),
            Payload::Product(product) => f.debug_tuple("Product").field(product).finish(),
            Payload::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

/// Whether a function terminates the message or produces an outbound one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Sink,
    Transform,
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::Sink => write!(f, "sink"),
            FunctionKind::Transform => write!(f, "transform"),
        }
    }
}

/// A named, stateless per-message processing unit.
///
/// Sinks return `Ok(None)`; transforms return exactly one outbound payload.
pub trait StreamFunction: Send + Sync {
    /// Binding name (e.g., "processProductDetail")
    fn name(&self) -> &str;

    fn kind(&self) -> FunctionKind;

    fn apply(&self, payload: Payload, trace: &dyn TraceSink) -> Result<Option<Payload>, StreamError>;
}

/// Registry for storing and looking up stream functions by name.
pub struct FunctionRegistry {
    functions: HashMap<String, Box<dyn StreamFunction>>,
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registry holding the four built-in functions under their binding names.
    pub fn with_builtin_functions() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SchemaFlattener));
        registry.register(Box::new(ProductRecoder));
        registry.register(Box::new(ProductObserver));
        registry.register(Box::new(TextObserver));
        registry
    }

    /// Register a function under its own name, replacing any previous entry.
    pub fn register(&mut self, function: Box<dyn StreamFunction>) {
        let name = function.name().to_string();
        if self.functions.insert(name.clone(), function).is_some() {
            tracing::warn!("Replaced stream function '{}'", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn StreamFunction> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    /// Invoke a registered function directly.
    pub fn call(
        &self,
        name: &str,
        payload: Payload,
        trace: &dyn TraceSink,
    ) -> Result<Option<Payload>, StreamError> {
        let function = self
            .get(name)
            .ok_or_else(|| StreamError::fault(format!("Stream function not found: {}", name)))?;

        function.apply(payload, trace)
    }

    /// Check if a function is registered
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered function names, sorted.
    pub fn list_functions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.functions.len()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
