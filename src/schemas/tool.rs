//! Provider-neutral tool schemas
//!
//! A [`ToolSet`] can only be built through validation, so code holding one may
//! assume names are non-empty and unique and every parameter schema is a JSON
//! object schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::RouterError;

/// A single callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON-schema object describing the arguments
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names listed under `parameters.required`.
    pub fn required(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<(), RouterError> {
        if self.name.trim().is_empty() {
            return Err(RouterError::InvalidRequest(
                "tool name must not be empty".to_string(),
            ));
        }

        let Some(schema) = self.parameters.as_object() else {
            return Err(RouterError::InvalidRequest(format!(
                "parameters for tool '{}' must be a JSON object schema",
                self.name
            )));
        };

        match schema.get("type") {
            None => Ok(()),
            Some(Value::String(t)) if t == "object" => Ok(()),
            Some(other) => Err(RouterError::InvalidRequest(format!(
                "parameters for tool '{}' must have type \"object\", got {}",
                self.name, other
            ))),
        }
    }
}

/// An ordered, validated collection of tool definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ToolDefinition>", into = "Vec<ToolDefinition>")]
pub struct ToolSet {
    tools: Vec<ToolDefinition>,
}

impl ToolSet {
    pub fn new(tools: Vec<ToolDefinition>) -> Result<Self, RouterError> {
        let mut seen = HashSet::with_capacity(tools.len());
        for tool in &tools {
            tool.validate()?;
            if !seen.insert(tool.name.as_str()) {
                return Err(RouterError::InvalidRequest(format!(
                    "duplicate tool name '{}'",
                    tool.name
                )));
            }
        }
        Ok(Self { tools })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ToolDefinition> {
        self.tools.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn into_inner(self) -> Vec<ToolDefinition> {
        self.tools
    }
}

impl TryFrom<Vec<ToolDefinition>> for ToolSet {
    type Error = RouterError;

    fn try_from(tools: Vec<ToolDefinition>) -> Result<Self, Self::Error> {
        Self::new(tools)
    }
}

impl From<ToolSet> for Vec<ToolDefinition> {
    fn from(set: ToolSet) -> Self {
        set.tools
    }
}

impl<'a> IntoIterator for &'a ToolSet {
    type Item = &'a ToolDefinition;
    type IntoIter = std::slice::Iter<'a, ToolDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}
