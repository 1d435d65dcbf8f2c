//! HTTP-facing errors and their status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chemdeck_common::{ChemdeckError, ValidationError};
use chemdeck_jobs::TriggerError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("A job is already running for this page")]
    AlreadyRunning,

    #[error("{0}")]
    ExternalLoad(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebError::AlreadyRunning => StatusCode::CONFLICT,
            WebError::ExternalLoad(_) => StatusCode::BAD_GATEWAY,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TriggerError> for WebError {
    fn from(err: TriggerError) -> Self {
        match err {
            TriggerError::Invalid(v) => WebError::Validation(v),
            TriggerError::AlreadyRunning => WebError::AlreadyRunning,
        }
    }
}

impl From<ChemdeckError> for WebError {
    fn from(err: ChemdeckError) -> Self {
        match err {
            ChemdeckError::Validation(v) => WebError::Validation(v),
            ChemdeckError::ExternalLoad(m) => WebError::ExternalLoad(m),
            other => WebError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, "Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(WebError::NotFound("tool x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(WebError::from(TriggerError::AlreadyRunning).status(), StatusCode::CONFLICT);
        let invalid = TriggerError::Invalid(ValidationError::single("ligand", "required"));
        assert_eq!(WebError::from(invalid).status(), StatusCode::UNPROCESSABLE_ENTITY);
        let load = ChemdeckError::ExternalLoad("9ZZZ: 404".into());
        assert_eq!(WebError::from(load).status(), StatusCode::BAD_GATEWAY);
        let other = ChemdeckError::Config("bad".into());
        assert_eq!(WebError::from(other).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
