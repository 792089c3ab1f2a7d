//! Static file collaborator.
//!
//! Serves the client application from a fixed document root. The root path
//! maps to a configured entry file; everything else maps onto the root via
//! tower-http's `ServeDir`. Paths that would climb out of the root are
//! rejected with `400 Bad Request` before touching the file system.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

/// File server rooted at a document root.
#[derive(Clone)]
pub struct StaticFiles {
    root: Arc<PathBuf>,
    entry_file: Arc<str>,
}

impl StaticFiles {
    /// # Arguments
    ///
    /// * `root` - Directory every request path is resolved against
    /// * `entry_file` - File served for `/`, relative to `root`
    pub fn new(root: impl Into<PathBuf>, entry_file: impl Into<Arc<str>>) -> Self {
        Self {
            root: Arc::new(root.into()),
            entry_file: entry_file.into(),
        }
    }

    /// Serve `request` from the document root.
    pub async fn serve(&self, request: Request) -> Response {
        let path = request.uri().path().to_string();

        if escapes_root(&path) {
            tracing::warn!(path = %path, "Rejected path outside document root");
            return (StatusCode::BAD_REQUEST, "Invalid path").into_response();
        }

        if path == "/" {
            let file = self.root.join(&*self.entry_file);
            tracing::debug!("Serving file: {}", file.display());
            return match ServeFile::new(file).oneshot(request).await {
                Ok(response) => response.into_response(),
                Err(never) => match never {},
            };
        }

        tracing::debug!(
            "Serving file: {}",
            self.root.join(path.trim_start_matches('/')).display()
        );
        match ServeDir::new(&*self.root).oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        }
    }
}

/// Whether a request path, once percent-decoded, names anything outside
/// the document root. Undecodable paths count as escaping.
pub fn escapes_root(path: &str) -> bool {
    let Ok(decoded) = urlencoding::decode(path) else {
        return true;
    };

    decoded.contains('\\')
        || Path::new(decoded.as_ref())
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
}
