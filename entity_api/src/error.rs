//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use sea_orm::error::DbErr;

/// Errors while executing operations against the settings store.
/// The intent is to categorize errors into two major types:
///  * Errors related to data. Ex. a patch that is not a JSON object
///  * Errors related to the backing store itself. Ex DbError::Conn, an unreadable file
#[derive(Debug)]
pub struct Error {
    // Underlying error emitted from the backend (seaORM, std::io, serde_json)
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    // Malformed or mistyped input document
    ValidationError,
    // The backing store could not be reached, read or written
    SystemError,
    // Other errors
    Other,
}

impl Error {
    pub fn validation(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: EntityApiErrorKind::ValidationError,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity API Error: {:?}", self)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: EntityApiErrorKind::SystemError,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: EntityApiErrorKind::SystemError,
        }
    }
}

// Only reached when encoding a document for storage; decoding request
// bodies goes through `Error::validation`.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: EntityApiErrorKind::Other,
        }
    }
}
