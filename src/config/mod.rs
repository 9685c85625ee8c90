//! Configuration management module
//!
//! Loads settings from environment variables and `.env` files and builds the
//! AWS SDK client.

pub mod aws;
pub mod settings;

pub use aws::{create_bedrock_client, AwsConfigBuilder};
pub use settings::{Environment, LogFormat, Settings, DEFAULT_FALLBACK_MODEL};
