//! Error types

mod api;
mod auth;
mod field;
mod query;

pub use api::*;
pub use auth::*;
pub use field::*;
pub use query::*;

/// Top-level error returned by every client operation.
///
/// Each failure kind is a distinct variant so callers can branch on
/// authentication, permission and malformed-request conditions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Token acquisition failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A data call failed or its response could not be classified.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The caller-supplied query could not be used.
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl Error {
    /// Returns the HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(err) => err.status_code(),
            Self::Auth(err) => err.status_code(),
            Self::Query(_) => None,
        }
    }

    /// Returns `true` if the bearer token could not be obtained.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns `true` if a data call was refused with 401 or 403.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Api(ApiError::Authorization { .. }))
    }
}
