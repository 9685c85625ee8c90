//! Converters module
//!
//! Converts between the unified router types and provider wire formats:
//! - [`RequestNormalizer`]: `ModelRequest` -> Bedrock Converse / Azure chat body
//! - [`tools`]: `ToolSet` <-> provider tool declarations
//! - [`response`]: raw provider response -> `ModelResponse`
//!
//! # Usage
//!
//! ```rust,ignore
//! use model_router::converters::{response, RequestNormalizer};
//!
//! let normalizer = RequestNormalizer::from_settings(&settings);
//! let body = normalizer.normalize(&request, Provider::Aws);
//! // ... send `body` through the matching adapter ...
//! let unified = response::normalize(&raw, &request.model)?;
//! ```

pub mod request;
pub mod response;
pub mod tools;

pub use request::RequestNormalizer;
pub use tools::ProviderTools;
