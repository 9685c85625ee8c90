//! Utility modules
//!
//! SDK document conversion and timeout handling.

pub mod document;
pub mod timeout;

pub use document::{document_to_json, json_to_document};
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
