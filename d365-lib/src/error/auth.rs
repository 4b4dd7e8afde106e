//! Authentication error types

use super::ApiError;

/// Errors that can occur while exchanging credentials for a bearer token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The identity endpoint answered without an `access_token` field.
    #[error("Could not get access token")]
    MissingAccessToken,

    /// The identity endpoint refused the token request.
    #[error("Token request to {url} failed with HTTP {status}: {message}")]
    Rejected {
        /// URL of the identity endpoint.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Azure AD error code (e.g. `invalid_grant`), if the body carried one.
        code: Option<String>,
        /// Error description, or the raw body when it could not be parsed.
        message: String,
    },

    /// The token request never produced a classifiable response.
    #[error("Token request failed: {0}")]
    Transport(#[from] ApiError),

    /// Failed to parse authentication response.
    #[error("Auth response parse error: {0}")]
    Parse(String),

    /// A credential was not configured.
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

impl AuthError {
    /// Returns the HTTP status code of a rejected token request.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(err) => err.status_code(),
            _ => None,
        }
    }

    /// Returns the Azure AD error code of a rejected token request.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
