use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::Request,
    http::{self, request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, MethodRouter},
};
use serde::Serialize;

type RenderFn<M> = Arc<dyn Fn(&Parts, M) -> Response + Send + Sync>;

/// Turns a model into a response. The view owns status, headers and body.
pub struct View<M> {
    render: RenderFn<M>,
}

impl<M> Clone for View<M> {
    fn clone(&self) -> Self {
        Self {
            render: Arc::clone(&self.render),
        }
    }
}

impl<M: Send + 'static> View<M> {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Parts, M) -> Response + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
        }
    }

    /// A view that only needs the model and produces HTML.
    pub fn html<F>(render: F) -> Self
    where
        F: Fn(&M) -> String + Send + Sync + 'static,
    {
        Self::new(move |_parts, model| Html(render(&model)).into_response())
    }

    pub fn render(&self, parts: &Parts, model: M) -> Response {
        (self.render)(parts, model)
    }

    /// Renders `model` against an empty `GET /` request and collects the body.
    pub async fn render_to_string(&self, model: M) -> Result<String, axum::Error> {
        let (parts, ()) = http::Request::new(()).into_parts();
        let body = to_bytes(self.render(&parts, model).into_body(), usize::MAX).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl<M> View<M>
where
    M: Clone + Send + Sync + 'static,
{
    /// A `GET` handler that always renders `model`.
    pub fn fixed<S>(&self, model: M) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let view = self.clone();
        get(move |request: Request| async move {
            let (parts, _body) = request.into_parts();
            view.render(&parts, model.clone())
        })
    }
}

impl<M: Serialize + Send + 'static> View<M> {
    /// Answers `501 Not Implemented` with the model as JSON, so a page without
    /// a view still shows what it would render.
    pub fn not_implemented() -> Self {
        Self::new(|_parts, model| {
            let body = serde_json::to_string(&model).unwrap_or_else(|err| err.to_string());
            (StatusCode::NOT_IMPLEMENTED, body).into_response()
        })
    }
}
