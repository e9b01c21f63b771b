use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};

use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::Invalid => {
                        debug!("Rejecting request payload: {:?}", self.0.source);
                        error_response(StatusCode::BAD_REQUEST, "Invalid JSON")
                    }
                    EntityErrorKind::Other(kind) => {
                        error!("Settings entity error ({kind}): {:?}", self.0.source);
                        error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
                    }
                },
                InternalErrorKind::Other(kind) => {
                    error!("Internal error ({kind}): {:?}", self.0.source);
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::StoreUnavailable => {
                    error!("Settings store unavailable: {:?}", self.0.source);
                    error_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        "settings store unavailable",
                    )
                }
                ExternalErrorKind::Other(kind) => {
                    error!("External error ({kind}): {:?}", self.0.source);
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
                }
            },
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
