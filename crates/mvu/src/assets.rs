use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::debug;

pub const SHIM: &str = "mvu.js";
pub const STYLESHEET: &str = "mvu.css";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub content_type: &'static str,
    pub bytes: &'static [u8],
}

/// Static files compiled into the binary, served by name.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: BTreeMap<String, Asset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the client shim and the utility stylesheet.
    pub fn bundled() -> Self {
        Self::new()
            .with(
                SHIM,
                "text/javascript; charset=utf-8",
                include_bytes!("../assets/mvu.js"),
            )
            .with(
                STYLESHEET,
                "text/css; charset=utf-8",
                include_bytes!("../assets/mvu.css"),
            )
    }

    pub fn with(
        mut self,
        name: impl Into<String>,
        content_type: &'static str,
        bytes: &'static [u8],
    ) -> Self {
        self.assets.insert(
            name.into(),
            Asset {
                content_type,
                bytes,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    /// Serves every asset at `/{name}`. Nest it under a prefix such as
    /// `/assets`.
    pub fn router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let store = Arc::new(self);
        Router::new().route(
            "/*name",
            get(move |Path(name): Path<String>| async move { store.serve(&name) }),
        )
    }

    fn serve(&self, name: &str) -> Response {
        match self.get(name) {
            Some(asset) => (
                [
                    (header::CONTENT_TYPE, asset.content_type),
                    (header::CACHE_CONTROL, "public, max-age=3600"),
                ],
                asset.bytes,
            )
                .into_response(),
            None => {
                debug!(asset = %name, "unknown asset requested");
                StatusCode::NOT_FOUND.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use tower::ServiceExt;

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn serves_bundled_shim() {
        let app: Router = Router::new().nest("/assets", AssetStore::bundled().router());
        let response = app
            .oneshot(get_request("/assets/mvu.js"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert!(std::str::from_utf8(&body)
            .expect("utf-8")
            .contains("_eventType"));
    }

    #[tokio::test]
    async fn serves_bundled_stylesheet() {
        let store = AssetStore::bundled();
        assert_eq!(store.names().collect::<Vec<_>>(), vec![STYLESHEET, SHIM]);

        let app: Router = Router::new().nest("/assets", store.router());
        let response = app
            .oneshot(get_request("/assets/mvu.css"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/css; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert!(std::str::from_utf8(&body).expect("utf-8").contains(".hidden"));
    }

    #[tokio::test]
    async fn nested_names_and_missing_assets() {
        let store = AssetStore::new().with("css/site.css", "text/css", b"body{}");
        assert!(store.get("css/site.css").is_some());

        let app: Router = Router::new().nest("/assets", store.router());
        let found = app
            .clone()
            .oneshot(get_request("/assets/css/site.css"))
            .await
            .expect("response");
        assert_eq!(found.status(), StatusCode::OK);

        let missing = app
            .oneshot(get_request("/assets/nope.js"))
            .await
            .expect("response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
