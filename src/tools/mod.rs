//! Tool schemas offered to models

pub mod catalog;

pub use catalog::{ToolModule, TOOL_MODULES};
