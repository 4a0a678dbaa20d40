//! Product recoding transform.

use serde::{Deserialize, Serialize};

use crate::error::StreamError;
use crate::runtime::registry::{FunctionKind, Payload, StreamFunction};
use crate::trace::TraceSink;

use super::PROCESS_PRODUCT_DETAIL;

/// Prefix prepended to every recoded product code.
pub const CODE_PREFIX: &str = "ISTAD-";

/// Product as carried on the product channels.
///
/// `code` is optional on the wire; [`recode`] rejects a missing or empty one.
/// `qty` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub code: Option<String>,
    pub qty: i64,
}

impl Product {
    pub fn new(code: impl Into<String>, qty: i64) -> Self {
        Self {
            code: Some(code.into()),
            qty,
        }
    }

    /// Code as shown in trace output.
    pub fn display_code(&self) -> &str {
        self.code.as_deref().unwrap_or("null")
    }
}

/// Replace `code` with `"ISTAD-" + uppercase(code)`, leaving `qty` untouched.
///
/// Traces the original code and quantity before mutating. The rule is applied
/// unconditionally, so recoding an already recoded product prefixes it again.
///
/// # Errors
/// `InvalidField` when `code` is null or empty; nothing is traced in that case.
pub fn recode(mut product: Product, trace: &dyn TraceSink) -> Result<Product, StreamError> {
    let code = match product.code.as_deref() {
        None => return Err(StreamError::invalid_field("code", "must not be null")),
        Some("") => return Err(StreamError::invalid_field("code", "must not be empty")),
        Some(code) => code,
    };

    trace.emit(&format!("Old product: {}", code));
    trace.emit(&format!("Old product: {}", product.qty));

    let recoded = format!("{}{}", CODE_PREFIX, code.to_uppercase());
    tracing::debug!(old = code, new = %recoded, "Recoded product");
    product.code = Some(recoded);

    Ok(product)
}

/// Transform bound to the product detail channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductRecoder;

impl StreamFunction for ProductRecoder {
    fn name(&self) -> &str {
        PROCESS_PRODUCT_DETAIL
    }

    fn kind(&self) -> FunctionKind {
        FunctionKind::Transform
    }

    fn apply(&self, payload: Payload, trace: &dyn TraceSink) -> Result<Option<Payload>, StreamError> {
        match payload {
            Payload::Product(product) => recode(product, trace).map(|p| Some(Payload::Product(p))),
            other => Err(StreamError::fault(format!(
                "{} expects a product payload, got {}",
                PROCESS_PRODUCT_DETAIL,
                other.kind_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::CapturedTraceSink;

    #[test]
    fn test_recode_uppercases_and_prefixes() {
        let trace = CapturedTraceSink::new();

        let product = recode(Product::new("x1", 3), &trace).unwrap();

        assert_eq!(product, Product::new("ISTAD-X1", 3));
    }

    #[test]
    fn test_recode_keeps_qty() {
        let trace = CapturedTraceSink::new();

        for (code, qty) in [("abc", 0), ("Mixed-Case", -4), ("ünï", 1_000_000)] {
            let product = recode(Product::new(code, qty), &trace).unwrap();
            assert_eq!(product.code, Some(format!("ISTAD-{}", code.to_uppercase())));
            assert_eq!(product.qty, qty);
        }
    }

    #[test]
    fn test_recode_is_not_idempotent() {
        let trace = CapturedTraceSink::new();

        let once = recode(Product::new("abc", 5), &trace).unwrap();
        let twice = recode(once, &trace).unwrap();

        assert_eq!(twice.code.as_deref(), Some("ISTAD-ISTAD-ABC"));
        assert_eq!(twice.qty, 5);
    }

    #[test]
    fn test_recode_traces_old_values() {
        let trace = CapturedTraceSink::new();

        recode(Product::new("x1", 3), &trace).unwrap();

        assert_eq!(trace.lines(), vec!["Old product: x1", "Old product: 3"]);
    }

    #[test]
    fn test_recode_empty_code_fails() {
        let trace = CapturedTraceSink::new();

        let result = recode(Product::new("", 1), &trace);

        assert_eq!(
            result,
            Err(StreamError::invalid_field("code", "must not be empty"))
        );
        assert!(trace.lines().is_empty());
    }

    #[test]
    fn test_recode_null_code_fails() {
        let trace = CapturedTraceSink::new();
        let product = Product { code: None, qty: 1 };

        let result = recode(product, &trace);

        assert!(matches!(
            result,
            Err(StreamError::InvalidField { ref field, .. }) if field == "code"
        ));
    }

    #[test]
    fn test_product_deserializes_null_code() {
        let product: Product = serde_json::from_str(r#"{"code": null, "qty": 2}"#).unwrap();
        assert_eq!(product.code, None);
        assert_eq!(product.display_code(), "null");
    }

    #[test]
    fn test_product_requires_qty() {
        assert!(serde_json::from_str::<Product>(r#"{"code": "x1"}"#).is_err());
        assert!(serde_json::from_str::<Product>(r#"{"code": "x1", "qty": null}"#).is_err());
    }

    #[test]
    fn test_recoder_emits_product() {
        let trace = CapturedTraceSink::new();

        let out = ProductRecoder
            .apply(Payload::Product(Product::new("bolt", 7)), &trace)
            .unwrap();

        match out {
            Some(Payload::Product(p)) => assert_eq!(p, Product::new("ISTAD-BOLT", 7)),
            other => panic!("expected product, got {:?}", other),
        }
    }
}
