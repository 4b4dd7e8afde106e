//! Request headers for data calls.

use std::fmt;

use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;

use crate::auth::AccessToken;
use crate::error::AuthError;

/// The `Prefer` directive of a data call.
///
/// Each query mode sends its own directive; the header map is rebuilt for
/// every retrieval so one mode's directive never reaches the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefer {
    /// `odata.maxpagesize=<n>`, used by structured queries.
    MaxPageSize(u32),
    /// `odata.include-annotations=*`, used by FetchXML queries so the paging
    /// cookie annotation is returned.
    IncludeAnnotations,
}

impl fmt::Display for Prefer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPageSize(size) => write!(f, "odata.maxpagesize={}", size),
            Self::IncludeAnnotations => f.write_str("odata.include-annotations=*"),
        }
    }
}

/// Builds the header set sent with every data call of one retrieval.
pub(crate) fn data_headers(token: &AccessToken, prefer: Option<Prefer>) -> Result<HeaderMap, AuthError> {
    let mut headers = HeaderMap::new();
    headers.insert("OData-MaxVersion", HeaderValue::from_static("4.0"));
    headers.insert("OData-Version", HeaderValue::from_static("4.0"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );

    let mut bearer = HeaderValue::from_str(&token.as_bearer())
        .map_err(|_| AuthError::Parse("access token is not a valid header value".to_string()))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    if let Some(prefer) = prefer {
        // the Display output is plain ASCII
        if let Ok(value) = HeaderValue::from_str(&prefer.to_string()) {
            headers.insert("Prefer", value);
        }
    }

    Ok(headers)
}
