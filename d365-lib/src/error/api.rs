//! API error types

use std::time::Duration;

use reqwest::Method;

/// Errors that can occur during API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service rejected the request as malformed or failed to serve it
    /// (400, 404, 412, 413, 500, 501, 503).
    #[error("The URL {url} retrieved an {status} error.\nRaw message: {body}")]
    Request {
        /// URL of the failed request.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body, verbatim.
        body: String,
    },

    /// The credentials were refused or lack permission (401, 403).
    #[error(
        "The URL {url} retrieved an {status} error. Check the credentials and the permissions of the account"
    )]
    Authorization {
        /// URL of the failed request.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body did not have the expected structure.
    #[error("Response decode error: {message}")]
    Decode {
        /// Description of the decode error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },

    /// Network error during API call.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request or retrieval timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Only GET and POST are sent by the transport.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(Method),
}

impl ApiError {
    /// Creates a new request error.
    pub fn request(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Request {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates a new authorization error.
    pub fn authorization(url: impl Into<String>, status: u16) -> Self {
        Self::Authorization {
            url: url.into(),
            status,
        }
    }

    /// Creates a new decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a new decode error with the raw response body.
    pub fn decode_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if the service answered with an error status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } | Self::Authorization { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the URL of the failed request, if known.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Request { url, .. } | Self::Authorization { url, .. } => Some(url),
            Self::InvalidUrl(url) => Some(url),
            _ => None,
        }
    }

    /// Returns the raw response body, if one was kept.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Request { body, .. } => Some(body),
            Self::Decode { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}
