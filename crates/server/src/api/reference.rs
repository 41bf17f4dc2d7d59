use axum::{
    extract::{Query, State},
    Json,
};
use gorev_core::Lang;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{ok, ApiError, ApiResult};
use crate::config::AppState;
use crate::middleware::Workspace;

#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    #[serde(default)]
    pub kategori: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

pub async fn templates(
    Workspace(ws): Workspace,
    Query(query): Query<TemplateQuery>,
) -> ApiResult<Json<Value>> {
    let category = query.kategori.as_deref().filter(|c| !c.is_empty());
    Ok(ok(ws.service.list_templates(category)?))
}

pub async fn summary(Workspace(ws): Workspace) -> ApiResult<Json<Value>> {
    Ok(ok(ws.service.summary()?))
}

/// Language is daemon-wide, not per workspace.
pub async fn get_language(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "success": true, "language": state.lang.get().code() }))
}

pub async fn set_language(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LanguageRequest>,
) -> ApiResult<Json<Value>> {
    let lang: Lang = request.language.parse().map_err(ApiError::bad_request)?;
    state.lang.set(lang);
    tracing::info!(language = %lang, "Language changed");
    Ok(Json(json!({ "success": true, "language": lang.code() })))
}

#[cfg(test)]
mod tests {
    use crate::api::testing::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_templates_and_summary() {
        let app = TestApp::new();
        let ws = app.workspace();
        let id = Some(ws.id.as_str());

        let (status, templates) = app.request(Method::GET, "/api/v1/templates", id, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(templates["data"].as_array().unwrap().len() >= 4);

        let (status, summary) = app.request(Method::GET, "/api/v1/summary", id, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["data"]["toplam_gorev"], 0);
    }

    #[tokio::test]
    async fn test_language_switch() {
        let app = TestApp::new();
        let (_, body) = app.request(Method::GET, "/api/v1/language", None, None).await;
        assert_eq!(body["language"], "tr");

        let (status, body) = app
            .request(Method::POST, "/api/v1/language", None, Some(json!({ "language": "en" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "en");
        assert_eq!(app.state.lang.get().code(), "en");

        let (status, _) = app
            .request(Method::POST, "/api/v1/language", None, Some(json!({ "language": "fr" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
