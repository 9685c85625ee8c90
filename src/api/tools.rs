//! Tool catalog endpoint
//!
//! GET /v1/tools

use axum::Json;
use serde::Serialize;

use crate::schemas::ToolDefinition;
use crate::tools::TOOL_MODULES;

#[derive(Debug, Serialize)]
pub struct ToolModuleInfo {
    pub id: &'static str,
    pub description: &'static str,
    pub functions: Vec<ToolDefinition>,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub modules: Vec<ToolModuleInfo>,
}

pub async fn list_tools() -> Json<ToolsResponse> {
    let modules = TOOL_MODULES
        .iter()
        .map(|module| ToolModuleInfo {
            id: module.id,
            description: module.description,
            functions: module.functions.iter().map(|f| f.definition()).collect(),
        })
        .collect();

    Json(ToolsResponse { modules })
}
