//! Pages keep no state between requests; a rendered view must embed its
//! model as `_state` for the next submission to send back.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::Request,
    http::{header, request::Parts, Method},
    response::{IntoResponse, Redirect as HttpRedirect, Response},
    routing::{any, MethodRouter},
};
use form::MultipartForm;
use protocol::{
    codec::decode_strict,
    domain::Redirect,
    protocol::{EventType, EVENT_TYPE_KEY, STATE_KEY},
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::{
    case::{MsgHandler, Transition},
    error::DispatchError,
    multipart::read_form,
    view::View,
};

/// Upper bound for a submitted multipart body, files included.
pub const DEFAULT_MAX_MEMORY: u64 = 10 * 1024 * 1024;

/// Application state rendered by a page and echoed back by the client.
pub trait Model: Serialize + DeserializeOwned + Default + Send + 'static {}

impl<T> Model for T where T: Serialize + DeserializeOwned + Default + Send + 'static {}

type RequestHook<M> = Arc<dyn Fn(&Parts, M) -> M + Send + Sync>;

pub struct PageBuilder<M> {
    view: Option<View<M>>,
    cases: HashMap<String, Arc<dyn MsgHandler<M>>>,
    on_request: Option<RequestHook<M>>,
    max_memory: u64,
}

impl<M: Model> PageBuilder<M> {
    pub fn view(mut self, view: View<M>) -> Self {
        self.view = Some(view);
        self
    }

    /// Registers a message handler under its alias. A later registration with
    /// the same alias replaces the earlier one.
    pub fn case(mut self, handler: impl MsgHandler<M> + 'static) -> Self {
        self.register(Arc::new(handler));
        self
    }

    /// Registers boxed handlers in order, with the same replacement rule as
    /// [`PageBuilder::case`].
    pub fn cases<I>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn MsgHandler<M>>>,
    {
        for handler in handlers {
            self.register(Arc::from(handler));
        }
        self
    }

    fn register(&mut self, handler: Arc<dyn MsgHandler<M>>) {
        let alias = handler.alias().to_string();
        if self.cases.insert(alias.clone(), handler).is_some() {
            warn!(%alias, "message alias registered twice, the last registration wins");
        } else {
            debug!(%alias, "registered message handler");
        }
    }

    /// Runs on every request before the view or a transform sees the model,
    /// whether or not a message was sent. Use it to fill non-serialized fields
    /// with request-scoped context.
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Parts, M) -> M + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(hook));
        self
    }

    pub fn max_memory(mut self, bytes: u64) -> Self {
        self.max_memory = bytes;
        self
    }

    pub fn build(self) -> Page<M> {
        Page {
            inner: Arc::new(PageInner {
                view: self.view.unwrap_or_else(View::not_implemented),
                cases: self.cases,
                on_request: self.on_request,
                max_memory: self.max_memory,
            }),
        }
    }
}

struct PageInner<M> {
    view: View<M>,
    cases: HashMap<String, Arc<dyn MsgHandler<M>>>,
    on_request: Option<RequestHook<M>>,
    max_memory: u64,
}

/// A page handler. Cloning is cheap; all clones share the same registrations.
pub struct Page<M> {
    inner: Arc<PageInner<M>>,
}

impl<M> Clone for Page<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

enum Outcome<M> {
    Render(M),
    Redirect(Redirect),
}

impl<M: Model> Page<M> {
    pub fn builder() -> PageBuilder<M> {
        PageBuilder {
            view: None,
            cases: HashMap::new(),
            on_request: None,
            max_memory: DEFAULT_MAX_MEMORY,
        }
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.inner.cases.keys().map(String::as_str)
    }

    /// Mounts the page on every method.
    pub fn into_route<S>(self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        any(move |request: Request| async move { self.handle(request).await })
    }

    pub async fn handle(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();

        if parts.method == Method::GET {
            let model = self.prepare(&parts, M::default());
            return self.inner.view.render(&parts, model);
        }

        let result = match read_form(&parts.headers, body, self.inner.max_memory).await {
            Ok(form) => self.dispatch(&parts, &form),
            Err(err) => Err(err),
        };

        match result {
            Ok(Outcome::Render(model)) => self.inner.view.render(&parts, model),
            Ok(Outcome::Redirect(redirect)) => match redirect_response(&redirect) {
                Ok(response) => response,
                Err(err) => failure(&parts, err),
            },
            Err(err) => failure(&parts, err),
        }
    }

    fn dispatch(&self, parts: &Parts, form: &MultipartForm) -> Result<Outcome<M>, DispatchError> {
        let event_type = form.value(EVENT_TYPE_KEY).unwrap_or_default();
        let handler = match EventType::parse(event_type) {
            EventType::Refresh => None,
            EventType::Alias(alias) => Some(
                self.inner
                    .cases
                    .get(alias)
                    .ok_or_else(|| DispatchError::UnknownAlias(alias.to_string()))?,
            ),
        };

        let state = form.value(STATE_KEY).ok_or(DispatchError::MissingState)?;
        let model: M = decode_strict(state).map_err(DispatchError::State)?;
        let model = self.prepare(parts, model);

        let Some(handler) = handler else {
            debug!(url = %parts.uri, "refreshing submitted state");
            return Ok(Outcome::Render(model));
        };

        debug!(url = %parts.uri, alias = handler.alias(), "applying message");
        let Transition { model, redirect } = handler
            .apply(parts, model, form)
            .map_err(|err| DispatchError::from_case(handler.alias(), err))?;

        Ok(match redirect {
            Some(redirect) => Outcome::Redirect(redirect),
            None => Outcome::Render(model),
        })
    }

    fn prepare(&self, parts: &Parts, model: M) -> M {
        match &self.inner.on_request {
            Some(hook) => hook(parts, model),
            None => model,
        }
    }
}

fn redirect_response(redirect: &Redirect) -> Result<Response, DispatchError> {
    match redirect.instruction() {
        Some(instruction) => {
            let body = serde_json::to_vec(&instruction).map_err(DispatchError::Encode)?;
            Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
        }
        None => Ok(HttpRedirect::to(redirect.target()).into_response()),
    }
}

fn failure(parts: &Parts, err: DispatchError) -> Response {
    if err.is_client_error() {
        warn!(method = %parts.method, url = %parts.uri, error = %err, "rejected request");
    } else {
        error!(method = %parts.method, url = %parts.uri, error = %err, "request failed");
    }
    err.into_response()
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
