use axum::{body::Bytes, Json};
use gorev_core::service::{ConflictPolicy, ExportBundle, ExportOptions};
use serde::Deserialize;
use serde_json::Value;

use super::{json_body, ok, ApiResult};
use crate::middleware::Workspace;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub data: ExportBundle,
    #[serde(default)]
    pub conflict_resolution: ConflictPolicy,
    #[serde(default)]
    pub dry_run: bool,
}

pub async fn export(
    Workspace(ws): Workspace,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let options: ExportOptions = json_body(&body)?.unwrap_or_default();
    let bundle = ws.service.export(&options)?;
    tracing::info!(
        workspace = %ws.id,
        tasks = bundle.tasks.len(),
        projects = bundle.projects.len(),
        "Exported workspace data"
    );
    Ok(ok(bundle))
}

pub async fn import(
    Workspace(ws): Workspace,
    Json(request): Json<ImportRequest>,
) -> ApiResult<Json<Value>> {
    let report = ws
        .service
        .import(&request.data, request.conflict_resolution, request.dry_run)?;
    if !request.dry_run {
        ws.refresh_task_count();
        ws.emitter.emit_workspace_sync(ws.id.as_str());
    }
    Ok(ok(report))
}
