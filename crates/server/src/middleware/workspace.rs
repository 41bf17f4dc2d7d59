use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use gorev_client::{HEADER_WORKSPACE_ID, HEADER_WORKSPACE_NAME, HEADER_WORKSPACE_PATH};
use gorev_core::WorkspaceContext;
use std::sync::Arc;

use crate::api::ApiError;
use crate::config::AppState;

/// Workspace resolved from the request headers, if any
#[derive(Clone, Default)]
pub struct CurrentWorkspace(pub Option<Arc<WorkspaceContext>>);

/// Attach the workspace named by `X-Workspace-Id` to the request.
///
/// Missing or unknown ids are not an error here; handlers that need a workspace
/// reject the request through the [`Workspace`] extractor.
pub async fn inject_workspace(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = resolve(&state, req.headers());
    req.extensions_mut().insert(CurrentWorkspace(context));
    next.run(req).await
}

fn resolve(state: &AppState, headers: &HeaderMap) -> Option<Arc<WorkspaceContext>> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    let id = header(HEADER_WORKSPACE_ID)?;
    match state.registry.get(id) {
        Ok(context) => Some(context),
        Err(e) => {
            tracing::debug!(
                workspace = %id,
                path = header(HEADER_WORKSPACE_PATH).unwrap_or(""),
                name = header(HEADER_WORKSPACE_NAME).unwrap_or(""),
                error = %e,
                "Request names an unknown workspace"
            );
            None
        }
    }
}

/// Extractor for handlers that only make sense inside a workspace
pub struct Workspace(pub Arc<WorkspaceContext>);

impl<S> FromRequestParts<S> for Workspace
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentWorkspace>()
            .and_then(|current| current.0.clone())
            .map(Workspace)
            .ok_or_else(ApiError::missing_workspace)
    }
}

impl<S> FromRequestParts<S> for CurrentWorkspace
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentWorkspace>()
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::TestApp;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(CurrentWorkspace(ws): CurrentWorkspace) -> String {
        ws.map(|ws| ws.name.clone()).unwrap_or_default()
    }

    fn router(app: &TestApp) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(
                app.state.clone(),
                inject_workspace,
            ))
    }

    async fn call(router: Router, headers: &[(&str, &str)]) -> (StatusCode, String) {
        let mut request = axum::http::Request::builder().uri("/whoami");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_inject_workspace_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}
        let app = TestApp::new();
        let service = router(&app);
        let request = axum::http::Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let future = service.oneshot(request);
        assert_send(&future);
    }

    #[tokio::test]
    async fn test_headers_resolve_registered_workspace() {
        let app = TestApp::new();
        let ws = app.workspace();

        let (status, name) = call(
            router(&app),
            &[
                (HEADER_WORKSPACE_ID, ws.id.as_str()),
                (HEADER_WORKSPACE_PATH, "/elsewhere"),
                (HEADER_WORKSPACE_NAME, "ignored"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(name, "test");

        let (status, name) = call(router(&app), &[(HEADER_WORKSPACE_ID, "  ")]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(name, "");

        let (_, name) = call(router(&app), &[(HEADER_WORKSPACE_ID, "0123456789abcdef")]).await;
        assert_eq!(name, "");
    }
}
