//! Ingress dispatcher.
//!
//! Every request lands on one fallback handler: transport-upgrade requests
//! become relay connections on the session named by their path, everything
//! else goes to the static file collaborator. The dispatcher holds no state
//! of its own.

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Request, State},
    response::{IntoResponse, Response},
    Router,
};
use http::{header, Method, StatusCode};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::adapters::websocket::{ws_handler, WebSocketState};
use crate::application::RelayConnectionHandler;
use crate::config::AppConfig;
use crate::domain::relay::SessionRegistry;

use super::static_files::StaticFiles;

/// Shared state of the ingress router.
#[derive(Clone)]
pub struct AppState {
    pub websocket: WebSocketState,
    pub static_files: StaticFiles,
}

impl AppState {
    pub fn new(websocket: WebSocketState, static_files: StaticFiles) -> Self {
        Self {
            websocket,
            static_files,
        }
    }

    /// Wire the state from configuration around an existing registry.
    pub fn from_config(config: &AppConfig, registry: Arc<SessionRegistry>) -> Self {
        let relay = RelayConnectionHandler::new(registry);
        Self::new(
            WebSocketState::new(relay, config.relay.subprotocol.as_str()),
            StaticFiles::new(&config.static_files.root, config.static_files.entry_file.as_str()),
        )
    }
}

/// Build the ingress router.
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(SessionRegistry::default());
/// let app = relay_router(AppState::from_config(&config, registry));
/// axum::serve(listener, app).await?;
/// ```
pub fn relay_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Permissive CORS, matching a development-mode posture.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn dispatch(
    State(state): State<AppState>,
    ws: Option<WebSocketUpgrade>,
    request: Request,
) -> Response {
    if let Some(ws) = ws {
        let session_name = session_name_from_path(request.uri().path());
        return ws_handler(ws, session_name, state.websocket);
    }

    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    state.static_files.serve(request).await
}

/// Strip the leading `/` and percent-decode; the registry applies the
/// default name when the result is empty.
pub fn session_name_from_path(path: &str) -> String {
    let raw = path.strip_prefix('/').unwrap_or(path);
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::fs;
    use tower::ServiceExt;

    fn app(root: &std::path::Path) -> Router {
        let registry = Arc::new(SessionRegistry::default());
        let websocket = WebSocketState::new(RelayConnectionHandler::new(registry), "y-websocket");
        relay_router(AppState::new(websocket, StaticFiles::new(root, "index.html")))
    }

    #[test]
    fn session_name_strips_slash_and_decodes() {
        assert_eq!(session_name_from_path("/doc1"), "doc1");
        assert_eq!(session_name_from_path("/"), "");
        assert_eq!(session_name_from_path("/my%20notes"), "my notes");
        assert_eq!(session_name_from_path("/a/b"), "a/b");
    }

    #[test]
    fn invalid_utf8_escape_keeps_raw_name() {
        assert_eq!(session_name_from_path("/bad%ff"), "bad%ff");
    }

    #[tokio::test]
    async fn plain_get_is_served_from_document_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "hello").unwrap();

        let response = app(dir.path())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn responses_carry_cors_headers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "hello").unwrap();

        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn options_request_is_answered_without_file_access() {
        let dir = tempfile::tempdir().unwrap();

        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn traversal_never_reaches_the_file_system() {
        let dir = tempfile::tempdir().unwrap();

        let response = app(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/../../etc/passwd")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_upgrade_request_creates_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(SessionRegistry::default());
        let websocket =
            WebSocketState::new(RelayConnectionHandler::new(registry.clone()), "y-websocket");
        let app = relay_router(AppState::new(websocket, StaticFiles::new(dir.path(), "index.html")));

        app.oneshot(Request::builder().uri("/doc1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(registry.session_count().await, 0);
    }
}
