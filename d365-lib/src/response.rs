//! Response classification
//!
//! Every response, from the identity endpoint and the data endpoint alike, is
//! routed through [`classify`] before anything else looks at it.

use serde_json::Value;

use crate::error::ApiError;

/// A response body that passed classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `201 Created` or `204 No Content`. The body is not inspected.
    Accepted,
    /// Any other non-error status, decoded as JSON.
    Json(Value),
}

impl Payload {
    /// Returns `true` for a bodiless success.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Returns the decoded body, if there is one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Accepted => None,
        }
    }

    /// Consumes the payload and returns the decoded body, if there is one.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Accepted => None,
        }
    }
}

/// Maps an HTTP status and raw body to a [`Payload`] or a typed failure.
///
/// - 201, 204: [`Payload::Accepted`]
/// - 400, 404, 412, 413, 500, 501, 503: [`ApiError::Request`] with the body verbatim
/// - 401, 403: [`ApiError::Authorization`]
/// - anything else: the body decoded as JSON, or [`ApiError::Decode`]
pub fn classify(url: &str, status: u16, body: &str) -> Result<Payload, ApiError> {
    match status {
        201 | 204 => Ok(Payload::Accepted),
        400 | 404 | 412 | 413 | 500 | 501 | 503 => {
            log::warn!("{} returned HTTP {}", url, status);
            Err(ApiError::request(url, status, body))
        }
        401 | 403 => {
            log::warn!("{} refused the credentials with HTTP {}", url, status);
            Err(ApiError::authorization(url, status))
        }
        _ => serde_json::from_str(body).map(Payload::Json).map_err(|e| {
            ApiError::decode_with_body(format!("HTTP {} body from {}: {}", status, url, e), body)
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const URL: &str = "https://org.crm.dynamics.com/api/data/v9.1/accounts";

    #[test]
    fn test_created_and_no_content_are_accepted() {
        assert_eq!(classify(URL, 201, "").unwrap(), Payload::Accepted);
        assert_eq!(classify(URL, 204, "").unwrap(), Payload::Accepted);
        // the body is never decoded
        assert_eq!(classify(URL, 204, "not json").unwrap(), Payload::Accepted);
    }

    #[test]
    fn test_request_errors_keep_status_and_body() {
        for status in [400, 404, 412, 413, 500, 501, 503] {
            let body = format!(r#"{{"error":{{"code":"0x0","message":"status {}"}}}}"#, status);
            match classify(URL, status, &body) {
                Err(ApiError::Request {
                    url,
                    status: got,
                    body: raw,
                }) => {
                    assert_eq!(url, URL);
                    assert_eq!(got, status);
                    assert_eq!(raw, body);
                }
                other => panic!("status {} classified as {:?}", status, other),
            }
        }
    }

    #[test]
    fn test_unauthorized_and_forbidden_are_authorization_errors() {
        for status in [401, 403] {
            let err = classify(URL, status, "secret detail").unwrap_err();
            assert!(matches!(
                err,
                ApiError::Authorization { status: s, .. } if s == status
            ));
            assert_eq!(err.body(), None);
            assert_eq!(err.status_code(), Some(status));
        }
    }

    #[test]
    fn test_other_statuses_decode_json() {
        let payload = classify(URL, 200, r#"{"value":[{"id":1}]}"#).unwrap();
        assert_eq!(payload, Payload::Json(json!({"value": [{"id": 1}]})));

        // statuses outside both error buckets still go through decoding
        let payload = classify(URL, 429, r#"{"error":"throttled"}"#).unwrap();
        assert_eq!(payload.as_json().unwrap()["error"], "throttled");
    }

    #[test]
    fn test_undecodable_body_is_a_decode_error() {
        let err = classify(URL, 200, "<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(err.body(), Some("<html>"));

        let err = classify(URL, 502, "").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
