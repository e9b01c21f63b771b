//! Error types for the `domain` layer.
use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field is used to hold the original error that caused
/// the domain error. The intent is to translate errors between layers while maintaining
/// layer boundaries. Ex. `domain` is dependent on `entity_api`, and `web` is dependent on `domain`,
/// but `web` should not be dependent, directly, on `entity_api`. Ultimately the various
/// `error_kind`s are used by `web` to return appropriate HTTP status codes to the client.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Entity(EntityErrorKind),
    Other(String),
}

/// Entity errors bubbled up from `entity_api`, reduced to what the domain cares about.
#[derive(Debug, PartialEq)]
pub enum EntityErrorKind {
    /// The submitted document is not acceptable (not an object, mistyped field).
    Invalid,
    Other(String),
}

/// Enum representing failures of systems outside this process.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    /// The backing settings store could not be read or written.
    StoreUnavailable,
    Other(String),
}

impl Error {
    pub fn is_invalid(&self) -> bool {
        self.error_kind
            == DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
    }

    pub fn is_store_unavailable(&self) -> bool {
        self.error_kind == DomainErrorKind::External(ExternalErrorKind::StoreUnavailable)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `entity_api` layer to the `domain` layer.
impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        let error_kind = match err.error_kind {
            EntityApiErrorKind::ValidationError => {
                DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
            }
            EntityApiErrorKind::SystemError => {
                DomainErrorKind::External(ExternalErrorKind::StoreUnavailable)
            }
            EntityApiErrorKind::Other => DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Other("EntityErrorKind".to_string()),
            )),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

// A request body that is not valid JSON.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Invalid,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_is_invalid() {
        let err = Error::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert!(err.is_invalid());
    }

    fn entity_error(error_kind: EntityApiErrorKind) -> EntityApiError {
        EntityApiError {
            source: None,
            error_kind,
        }
    }

    #[test]
    fn validation_errors_become_invalid_entities() {
        let err = Error::from(entity_error(EntityApiErrorKind::ValidationError));
        assert!(err.is_invalid());
        assert!(!err.is_store_unavailable());
    }

    #[test]
    fn system_errors_become_store_unavailable() {
        let err = Error::from(entity_error(EntityApiErrorKind::SystemError));
        assert!(err.is_store_unavailable());
        assert!(err.source.is_some());
    }
}
