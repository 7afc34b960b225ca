//! Tool-call façade over HTTP

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::error::ApiResult;
use crate::tools::{self, ToolDescriptor, ToolOutput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// GET /api/tools
pub async fn list_tools() -> Json<Vec<ToolDescriptor>> {
    Json(tools::descriptors())
}

/// POST /api/tools/call
///
/// Tool failures come back as `200` with `isError: true`; only an envelope
/// that is not `{name, arguments}` is rejected.
pub async fn call_tool(
    State(state): State<AppState>,
    payload: Result<Json<ToolCall>, JsonRejection>,
) -> ApiResult<Json<ToolOutput>> {
    let Json(call) = payload?;
    Ok(Json(tools::call(&state.board, &call.name, call.arguments).await))
}
