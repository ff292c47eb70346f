use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use protocol::error::{ApiError, DecodeError, ErrorCode};
use thiserror::Error;

use crate::case::{CaseError, EventDecodeError};

/// Failure of one request. Client-input variants map to `400`, the rest to
/// `500`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("expected multipart/form-data, got '{0}'")]
    UnsupportedContentType(String),

    #[error("failed to parse multipart form: {0}")]
    Multipart(#[source] multer::Error),

    #[error("cannot read file '{field}': {source}")]
    FileRead {
        field: String,
        #[source]
        source: multer::Error,
    },

    #[error("unknown message type '{0}'")]
    UnknownAlias(String),

    #[error("form field _state is missing")]
    MissingState,

    #[error("cannot unmarshal state from form: {0}")]
    State(#[source] DecodeError),

    #[error("cannot decode message '{alias}': {source}")]
    Event {
        alias: String,
        #[source]
        source: EventDecodeError,
    },

    #[error("failed to transform msg '{alias}': {source}")]
    Transform {
        alias: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to encode redirection: {0}")]
    Encode(#[source] serde_json::Error),
}

impl DispatchError {
    pub(crate) fn from_case(alias: &str, err: CaseError) -> Self {
        match err {
            CaseError::Decode(source) => DispatchError::Event {
                alias: alias.to_string(),
                source,
            },
            CaseError::Transform(source) => DispatchError::Transform {
                alias: alias.to_string(),
                source,
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::Transform { .. } | DispatchError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    pub fn error_code(&self) -> ErrorCode {
        if self.is_client_error() {
            ErrorCode::BadRequest
        } else {
            ErrorCode::Internal
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ApiError::new(self.error_code(), self.to_string())),
        )
            .into_response()
    }
}

/// Setup failure of a [`TemplateSet`](crate::template::TemplateSet).
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no template sources configured")]
    NoSources,

    #[error("template source {0} contains no templates")]
    EmptySource(String),

    #[error("cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot walk template directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("template '{0}' is defined by more than one source")]
    Duplicate(String),

    #[error("failed to parse template {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("entry template '{0}' does not exist")]
    UnknownEntry(String),
}
