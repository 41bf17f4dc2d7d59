use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{json_body, ApiResult};
use crate::config::AppState;
use crate::middleware::CurrentWorkspace;

/// `POST /api/v1/mcp/{*method}`: the request body is the JSON-RPC `params`.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    CurrentWorkspace(ws): CurrentWorkspace,
    Path(method): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let method = method.trim_matches('/');
    let params: Value = json_body(&body)?.unwrap_or_else(|| json!({}));
    tracing::debug!(method, workspace = ?ws.as_ref().map(|w| w.id.to_string()), "MCP call");

    let result = state
        .dispatcher
        .dispatch(method, params, ws.as_deref())
        .await?;
    Ok(Json(result))
}
