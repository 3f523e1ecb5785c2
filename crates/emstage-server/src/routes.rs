//! HTTP routes for the static server.
//!
//! `/` serves the index page; every other path is resolved under the root
//! directory. Missing files are 404. Read failures become a 500 for that
//! request only and are logged by the trace layer.

use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Create the router serving `root`, with `index` answering `/`.
pub fn create_router(root: &Path, index: &str) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(root.join(index)))
        .fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    const WASM: &[u8] = b"\0asm\x01\0\0\0";

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("index.html"), "<html>module.wasm</html>").unwrap();
        fs::write(temp.path().join("module.wasm"), WASM).unwrap();
        fs::write(temp.path().join("module.js"), "var Module = {};").unwrap();
        temp
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn test_existing_file_returns_exact_bytes() {
        let temp = fixture();
        let (status, content_type, body) =
            get(create_router(temp.path(), "index.html"), "/module.wasm").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, WASM);
        assert_eq!(content_type.as_deref(), Some("application/wasm"));
    }

    #[tokio::test]
    async fn test_loader_script_content_type() {
        let temp = fixture();
        let (status, content_type, body) =
            get(create_router(temp.path(), "index.html"), "/module.js").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"var Module = {};");
        assert!(content_type.unwrap().contains("javascript"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let temp = fixture();
        let (status, _, _) = get(create_router(temp.path(), "index.html"), "/nope.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_root_returns_page() {
        let temp = fixture();
        let (status, content_type, body) =
            get(create_router(temp.path(), "index.html"), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert_eq!(body, b"<html>module.wasm</html>");
    }

    #[tokio::test]
    async fn test_root_uses_configured_index() {
        let temp = fixture();
        fs::write(temp.path().join("page.html"), "custom").unwrap();
        let (status, _, body) = get(create_router(temp.path(), "page.html"), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"custom");
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let temp = fixture();
        let root = temp.path().join("www");
        fs::create_dir_all(&root).unwrap();
        fs::write(temp.path().join("secret.txt"), "secret").unwrap();

        let (status, _, body) = get(create_router(&root, "index.html"), "/../secret.txt").await;
        assert_ne!(status, StatusCode::OK);
        assert_ne!(body, b"secret");
    }

    #[tokio::test]
    async fn test_percent_encoded_path() {
        let temp = fixture();
        fs::write(temp.path().join("with space.txt"), "spaced").unwrap();
        let (status, _, body) =
            get(create_router(temp.path(), "index.html"), "/with%20space.txt").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"spaced");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let temp = fixture();
        let response = create_router(temp.path(), "index.html")
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/module.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
