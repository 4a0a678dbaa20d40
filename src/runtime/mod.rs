//! Runtime wiring between binder channels and stream functions.
//!
//! This module holds the explicit function registry, the binding configuration,
//! the dispatcher that routes each inbound message to its function and the
//! NDJSON feed loop.

pub mod config_loader;
pub mod dispatcher;
pub mod feed;
pub mod registry;

// Re-export key types
pub use config_loader::{
    inbound_binding_name, outbound_binding_name, BindingConfig, BindingDef, DEFINITION_ENV,
};
pub use dispatcher::{Dispatcher, Outbound, Route};
pub use feed::{process_feed, process_line, FeedSummary};
pub use registry::{FunctionKind, FunctionRegistry, Payload, StreamFunction};
