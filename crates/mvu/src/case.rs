use axum::http::request::Parts;
use form::{FormDecode, FormError, MultipartForm, Schema};
use protocol::{codec::decode_strict, domain::Redirect, error::DecodeError, protocol::EVENT_DATA_KEY};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Outcome of a transform: the next model and, optionally, a navigation that
/// replaces rendering it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<M> {
    pub model: M,
    pub redirect: Option<Redirect>,
}

impl<M> Transition<M> {
    pub fn stay(model: M) -> Self {
        Self {
            model,
            redirect: None,
        }
    }

    pub fn redirect(model: M, redirect: Redirect) -> Self {
        Self {
            model,
            redirect: Some(redirect),
        }
    }
}

impl<M> From<M> for Transition<M> {
    fn from(model: M) -> Self {
        Transition::stay(model)
    }
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("cannot decode _eventData: {0}")]
    Json(#[source] DecodeError),
    #[error("cannot decode form into message: {0}")]
    Form(#[source] FormError),
}

#[derive(Debug, Error)]
pub enum CaseError {
    #[error(transparent)]
    Decode(#[from] EventDecodeError),
    #[error(transparent)]
    Transform(anyhow::Error),
}

/// Decodes one kind of message from a submitted form and applies it to a model.
/// `parts` is the head of the submitting request.
pub trait MsgHandler<M>: Send + Sync {
    fn alias(&self) -> &str;

    fn apply(
        &self,
        parts: &Parts,
        model: M,
        form: &MultipartForm,
    ) -> Result<Transition<M>, CaseError>;
}

type UpdateFn<M, Msg> = Box<dyn Fn(M, Msg) -> anyhow::Result<Transition<M>> + Send + Sync>;

/// The [`MsgHandler`] for message type `Msg`.
///
/// The message is read from `_eventData` when that key carries a non-empty
/// JSON payload, otherwise from the remaining form fields, so plain `<form>`
/// submissions work without client-side encoding.
pub struct Case<M, Msg> {
    alias: String,
    schema: Schema<Msg>,
    update: UpdateFn<M, Msg>,
}

impl<M, Msg> Case<M, Msg>
where
    M: 'static,
    Msg: FormDecode + Serialize + DeserializeOwned,
{
    /// Registers an infallible update. It may return the next model or a
    /// [`Transition`].
    pub fn new<F, T>(alias: impl Into<String>, update: F) -> Self
    where
        F: Fn(M, Msg) -> T + Send + Sync + 'static,
        T: Into<Transition<M>>,
    {
        Self::with_update(alias.into(), Box::new(move |model, msg| Ok(update(model, msg).into())))
    }

    /// Registers an update that may fail. A failure aborts the request with a
    /// server error and nothing is rendered.
    pub fn try_new<F, T, E>(alias: impl Into<String>, update: F) -> Self
    where
        F: Fn(M, Msg) -> Result<T, E> + Send + Sync + 'static,
        T: Into<Transition<M>>,
        E: Into<anyhow::Error>,
    {
        Self::with_update(
            alias.into(),
            Box::new(move |model, msg| update(model, msg).map(Into::into).map_err(Into::into)),
        )
    }

    /// Like [`Case::new`], using the message's type path as alias.
    pub fn qualified<F, T>(update: F) -> Self
    where
        F: Fn(M, Msg) -> T + Send + Sync + 'static,
        T: Into<Transition<M>>,
    {
        Self::new(std::any::type_name::<Msg>(), update)
    }

    fn with_update(alias: String, update: UpdateFn<M, Msg>) -> Self {
        Self {
            alias,
            schema: Msg::schema(),
            update,
        }
    }

    fn decode(&self, form: &MultipartForm) -> Result<Msg, EventDecodeError> {
        match form.value(EVENT_DATA_KEY).filter(|text| !text.is_empty()) {
            Some(text) => decode_strict(text).map_err(EventDecodeError::Json),
            None => {
                let mut msg = Msg::default();
                self.schema
                    .decode_form(&mut msg, form)
                    .map_err(EventDecodeError::Form)?;
                Ok(msg)
            }
        }
    }
}

impl<M, Msg> MsgHandler<M> for Case<M, Msg>
where
    M: 'static,
    Msg: FormDecode + Serialize + DeserializeOwned,
{
    fn alias(&self) -> &str {
        &self.alias
    }

    fn apply(
        &self,
        _parts: &Parts,
        model: M,
        form: &MultipartForm,
    ) -> Result<Transition<M>, CaseError> {
        let msg = self.decode(form)?;
        (self.update)(model, msg).map_err(CaseError::Transform)
    }
}
