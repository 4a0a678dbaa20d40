//! Pass-through logging sinks.

use crate::error::StreamError;
use crate::runtime::registry::{FunctionKind, Payload, StreamFunction};
use crate::trace::TraceSink;

use super::product::Product;
use super::{PROCESS_MESSAGE, PROCESS_PRODUCT};

pub fn observe_product(product: &Product, trace: &dyn TraceSink) {
    trace.emit(&format!("obj product: {}", product.display_code()));
    trace.emit(&format!("obj product: {}", product.qty));
}

pub fn observe_text(text: &str, trace: &dyn TraceSink) {
    trace.emit(&format!("Processing: {}", text));
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductObserver;

impl StreamFunction for ProductObserver {
    fn name(&self) -> &str {
        PROCESS_PRODUCT
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Sink
    }

    fn apply(&self, payload: Payload, trace: &dyn TraceSink) -> Result<Option<Payload>, StreamError> {
        match payload {
            Payload::Product(product) => {
                observe_product(&product, trace);
                Ok(None)
            }
            other => Err(StreamError::fault(format!(
                "{} expects a product payload, got {}",
                PROCESS_PRODUCT,
                other.kind_name()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextObserver;

impl StreamFunction for TextObserver {
    fn name(&self) -> &str {
        PROCESS_MESSAGE
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Sink
    }

    fn apply(&self, payload: Payload, trace: &dyn TraceSink) -> Result<Option<Payload>, StreamError> {
        match payload {
            Payload::Text(text) => {
                observe_text(&text, trace);
                Ok(None)
            }
            other => Err(StreamError::fault(format!(
                "{} expects a text payload, got {}",
                PROCESS_MESSAGE,
                other.kind_name()
            ))),
        }
    }
}
