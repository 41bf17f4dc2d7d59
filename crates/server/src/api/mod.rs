use crate::config::AppState;
use crate::middleware::inject_workspace;
use crate::websocket;
use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use gorev_client::api::HealthResponse;
use gorev_client::{HEADER_WORKSPACE_ID, HEADER_WORKSPACE_NAME, HEADER_WORKSPACE_PATH};
use gorev_core::{ServiceError, WorkspaceError};
use gorev_mcp::DispatchError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod mcp;
mod projects;
mod reference;
mod tasks;
mod transfer;
mod workspaces;

/// Editor and web UI dev servers allowed to call the daemon
const CORS_PORTS: std::ops::RangeInclusive<u16> = 5000..=5003;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        // Workspaces
        .route("/workspaces/register", post(workspaces::register))
        .route("/workspaces", get(workspaces::list))
        .route(
            "/workspaces/{id}",
            get(workspaces::get_one).delete(workspaces::unregister),
        )
        // Tasks
        .route("/tasks", get(tasks::list))
        .route("/tasks/from-template", post(tasks::create_from_template))
        .route(
            "/tasks/{id}",
            get(tasks::get_one).put(tasks::update).delete(tasks::delete_one),
        )
        .route("/tasks/{id}/subtasks", post(tasks::create_subtask))
        .route("/tasks/{id}/parent", put(tasks::change_parent))
        .route("/tasks/{id}/hierarchy", get(tasks::hierarchy))
        .route("/tasks/{id}/dependencies", post(tasks::add_dependency))
        .route(
            "/tasks/{id}/dependencies/{dep_id}",
            delete(tasks::remove_dependency),
        )
        // Projects
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/{id}",
            get(projects::get_one)
                .put(projects::update)
                .delete(projects::delete_one),
        )
        .route("/projects/{id}/tasks", get(projects::tasks))
        .route("/projects/{id}/activate", put(projects::activate))
        .route(
            "/active-project",
            get(projects::active).delete(projects::clear_active),
        )
        // Reference data
        .route("/templates", get(reference::templates))
        .route("/summary", get(reference::summary))
        .route(
            "/language",
            get(reference::get_language).post(reference::set_language),
        )
        // Bulk data
        .route("/export", post(transfer::export))
        .route("/import", post(transfer::import))
        // JSON-RPC tool dispatch
        .route("/mcp/{*method}", post(mcp::dispatch))
        // Events
        .route("/ws", get(websocket::ws_handler))
        .route("/ws/stats", get(websocket::ws_stats));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/v1", v1)
        // Middleware
        .layer(from_fn_with_state(state.clone(), inject_workspace))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = CORS_PORTS
        .filter_map(|port| HeaderValue::from_str(&format!("http://localhost:{}", port)).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(HEADER_WORKSPACE_ID),
            HeaderName::from_static(HEADER_WORKSPACE_PATH),
            HeaderName::from_static(HEADER_WORKSPACE_NAME),
        ])
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime().as_secs(),
        time: Utc::now(),
    })
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Error type for API handlers, carrying its HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(error),
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn missing_workspace() -> Self {
        Self::bad_request("Missing workspace context")
    }

    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse::with_details(error, details),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.body.error, details = ?self.body.details, "Request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => Self::not_found(message),
            ServiceError::InvalidInput(message) => Self::bad_request(message),
            ServiceError::Conflict(message) => Self::new(StatusCode::CONFLICT, message),
            ServiceError::Storage(e) => Self::internal("Storage failure", format!("{:#}", e)),
        }
    }
}

impl From<WorkspaceError> for ApiError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::NotFound(_) => Self::not_found(err.to_string()),
            WorkspaceError::InvalidPath { .. } | WorkspaceError::PathNotFound(_) => {
                Self::bad_request(err.to_string())
            }
            WorkspaceError::MigrationsNotFound(_)
            | WorkspaceError::DbOpenFailed { .. }
            | WorkspaceError::DbCloseFailed { .. } => {
                Self::internal("Workspace failure", err.to_string())
            }
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let details = err
            .chain()
            .skip(1)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ");
        Self::internal(err.to_string(), details)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Parse an optional JSON body; an empty body is `None`.
pub(crate) fn json_body<T: DeserializeOwned>(body: &[u8]) -> ApiResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {}", e)))
}

/// Success envelope used by the REST endpoints
pub(crate) fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::websocket::Hub;
    use axum::body::Body;
    use axum::http::Request;
    use gorev_core::storage::MigrationSource;
    use gorev_core::{Lang, LanguageSetting, StorageMode, WorkspaceContext, WorkspaceRegistry};
    use gorev_mcp::{Dispatcher, ToolRegistry};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub struct TestApp {
        pub router: Router,
        pub state: Arc<AppState>,
        pub dir: TempDir,
    }

    impl TestApp {
        pub fn new() -> Self {
            let lang = Arc::new(LanguageSetting::new(Lang::Tr));
            let (hub, _task) = Hub::spawn(64, 64);
            let registry = Arc::new(
                WorkspaceRegistry::new(StorageMode::Local, lang.clone())
                    .with_migrations(MigrationSource::Embedded)
                    .with_emitter(Arc::new(hub.clone())),
            );
            let dispatcher = Arc::new(Dispatcher::new(
                ToolRegistry::with_defaults(None),
                lang,
                env!("CARGO_PKG_VERSION"),
            ));
            let state = Arc::new(AppState::new(registry, dispatcher, hub));
            Self {
                router: create_router(state.clone()),
                state,
                dir: TempDir::new().unwrap(),
            }
        }

        pub fn workspace(&self) -> Arc<WorkspaceContext> {
            self.state
                .registry
                .register(self.dir.path(), Some("test"))
                .unwrap()
        }

        pub async fn request(
            &self,
            method: Method,
            uri: &str,
            workspace: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(id) = workspace {
                builder = builder.header(HEADER_WORKSPACE_ID, id);
            }
            let body = match body {
                Some(json) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(serde_json::to_vec(&json).unwrap())
                }
                None => Body::empty(),
            };
            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::TestApp;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_routes() {
        let app = TestApp::new();
        for path in ["/api/health", "/health"] {
            let (status, body) = app.request(Method::GET, path, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "healthy");
            assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        }
    }

    #[tokio::test]
    async fn test_workspace_scoped_route_requires_context() {
        let app = TestApp::new();
        let (status, body) = app.request(Method::GET, "/api/v1/tasks", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing workspace context");

        let (status, _) = app
            .request(Method::GET, "/api/v1/tasks", Some("unknown"), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cors_allows_only_local_ui_origins() {
        let app = TestApp::new();
        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/tasks")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-workspace-id")
                .body(Body::empty())
                .unwrap()
        };

        let response = app
            .router
            .clone()
            .oneshot(preflight("http://localhost:5001"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5001"
        );

        let response = app
            .router
            .clone()
            .oneshot(preflight("http://evil.example"))
            .await
            .unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::from(ServiceError::not_found("task", "x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ServiceError::invalid("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WorkspaceError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DispatchError::MissingWorkspace).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
