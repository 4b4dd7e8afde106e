//! HTTP transport shared by the identity and data calls.

use std::time::Duration;

use reqwest::Client;
use reqwest::Method;
use reqwest::header::HeaderMap;

use crate::error::ApiError;
use crate::response::Payload;
use crate::response::classify;

/// Body of an outgoing POST request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
    /// A raw JSON document.
    Json(String),
}

/// Sends GET and POST requests and classifies every response.
///
/// No retries: a failure is returned to the caller as is.
#[derive(Debug, Clone)]
pub struct Transport {
    http_client: Client,
    timeout: Option<Duration>,
}

impl Transport {
    /// Creates a transport around an existing HTTP client.
    pub fn new(http_client: Client, timeout: Option<Duration>) -> Self {
        Self {
            http_client,
            timeout,
        }
    }

    /// Sends a request and routes the response through [`classify`].
    ///
    /// `query` pairs are appended to GET requests; `body` is sent with POST
    /// requests. Any other method fails with [`ApiError::UnsupportedMethod`]
    /// before touching the network.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        query: &[(&str, &str)],
        body: Option<RequestBody>,
    ) -> Result<Payload, ApiError> {
        let mut request = if method == Method::GET {
            let request = self.http_client.get(url);
            if query.is_empty() {
                request
            } else {
                request.query(query)
            }
        } else if method == Method::POST {
            let request = self.http_client.post(url);
            match body {
                Some(RequestBody::Form(params)) => request.form(&params),
                Some(RequestBody::Json(json)) => request.body(json),
                None => request,
            }
        } else {
            return Err(ApiError::UnsupportedMethod(method));
        };

        request = request.headers(headers);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        log::debug!("{} {}", method, url);

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        classify(&final_url, status, &text)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::Network(err),
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(Client::new(), None)
    }
}
