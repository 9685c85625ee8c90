//! Error types

mod router;
mod types;

pub use router::{AttemptFailure, ProviderApiError, ProviderErrorKind, RouterError};
pub use types::ApiError;
