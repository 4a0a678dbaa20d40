//! Built-in stream functions and their binding names.

pub mod flatten;
pub mod observe;
pub mod product;

pub use flatten::{flatten, FlattenedRecord, SchemaFlattener};
pub use observe::{observe_product, observe_text, ProductObserver, TextObserver};
pub use product::{recode, Product, ProductRecoder, CODE_PREFIX};

/// Generic-record sink.
pub const PROCESS_ORACLE_MESSAGE: &str = "processOracleMessage";
/// Product recoding transform.
pub const PROCESS_PRODUCT_DETAIL: &str = "processProductDetail";
/// Product logging sink.
pub const PROCESS_PRODUCT: &str = "processProduct";
/// Text logging sink.
pub const PROCESS_MESSAGE: &str = "processMessage";
