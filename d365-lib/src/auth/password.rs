//! Password flow (Resource Owner Password Credentials)

use std::env;

use async_trait::async_trait;
use chrono::TimeDelta;
use chrono::Utc;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use super::AccessToken;
use super::TokenProvider;
use crate::error::ApiError;
use crate::error::AuthError;
use crate::transport::RequestBody;
use crate::transport::Transport;

/// The v1.0 Azure AD token endpoint with the "common" tenant.
pub const DEFAULT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/token";

/// OAuth2 password grant with a confidential client.
///
/// Posts the client and user credentials to the identity endpoint and reads
/// `access_token` from the response. The "common" tenant resolves the tenant
/// from the username's domain.
///
/// # Example
///
/// ```ignore
/// use d365_lib::auth::PasswordFlow;
///
/// let flow = PasswordFlow::new(
///     "your-client-id",
///     "your-client-secret",
///     "user@example.com",
///     "password123",
/// );
///
/// let token = flow.authenticate("https://org.crm.dynamics.com").await?;
/// ```
#[derive(Clone)]
pub struct PasswordFlow {
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    token_url: String,
    transport: Transport,
}

impl PasswordFlow {
    /// Creates a new password flow against [`DEFAULT_TOKEN_URL`].
    ///
    /// # Arguments
    ///
    /// * `client_id` - The Azure AD application (client) ID
    /// * `client_secret` - The Azure AD application client secret
    /// * `username` - The user's email or UPN
    /// * `password` - The user's password
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            transport: Transport::default(),
        }
    }

    /// Creates a password flow from `DATAVERSE_CLIENT_ID`,
    /// `DATAVERSE_CLIENT_SECRET`, `DATAVERSE_USERNAME` and `DATAVERSE_PASSWORD`.
    ///
    /// Loading a `.env` file is left to the caller.
    pub fn from_env() -> Result<Self, AuthError> {
        Ok(Self::new(
            required_var("DATAVERSE_CLIENT_ID")?,
            required_var("DATAVERSE_CLIENT_SECRET")?,
            required_var("DATAVERSE_USERNAME")?,
            required_var("DATAVERSE_PASSWORD")?,
        ))
    }

    /// Overrides the identity endpoint.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Uses a custom HTTP client for the token request.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.transport = Transport::new(client, None);
        self
    }

    /// Returns the identity endpoint this flow posts to.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Exchanges the credentials for a bearer token.
    ///
    /// # Arguments
    ///
    /// * `resource` - The CRM organisation URL (e.g., `https://org.crm.dynamics.com`)
    pub async fn authenticate(&self, resource: &str) -> Result<AccessToken, AuthError> {
        let params = vec![
            ("client_id".to_string(), self.client_id.clone()),
            ("resource".to_string(), resource.trim_end_matches('/').to_string()),
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
            ("client_secret".to_string(), self.client_secret.clone()),
            ("grant_type".to_string(), "password".to_string()),
        ];

        let payload = self
            .transport
            .send(
                Method::POST,
                &self.token_url,
                HeaderMap::new(),
                &[],
                Some(RequestBody::Form(params)),
            )
            .await
            .map_err(map_token_failure)?;

        let body = payload.into_json().ok_or(AuthError::MissingAccessToken)?;
        if body.get("access_token").is_none() {
            return Err(AuthError::MissingAccessToken);
        }

        let token_response: TokenResponse =
            serde_json::from_value(body).map_err(|e| AuthError::Parse(e.to_string()))?;

        log::debug!("acquired access token from {}", self.token_url);

        Ok(token_response.into_access_token())
    }
}

#[async_trait]
impl TokenProvider for PasswordFlow {
    async fn get_token(&self, resource: &str) -> Result<AccessToken, AuthError> {
        self.authenticate(resource).await
    }
}

impl std::fmt::Debug for PasswordFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordFlow")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .finish()
    }
}

fn required_var(name: &'static str) -> Result<String, AuthError> {
    env::var(name).map_err(|_| AuthError::MissingCredential(name))
}

/// Turns a classified failure of the token call into an [`AuthError`].
fn map_token_failure(err: ApiError) -> AuthError {
    match err {
        ApiError::Request { url, status, body } => {
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) => AuthError::Rejected {
                    url,
                    status,
                    message: error.error_description.unwrap_or_else(|| error.error.clone()),
                    code: Some(error.error),
                },
                Err(_) => AuthError::Rejected {
                    url,
                    status,
                    code: None,
                    message: body,
                },
            }
        }
        ApiError::Authorization { url, status } => AuthError::Rejected {
            url,
            status,
            code: None,
            message: "client credentials were refused".to_string(),
        },
        other => AuthError::Transport(other),
    }
}

/// Token response from Azure AD.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default, deserialize_with = "deserialize_expires_in")]
    expires_in: Option<u64>,
}

/// Deserializes `expires_in` which the v1.0 endpoint sends as a string.
fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrNumber::Number(n)) => Ok(Some(n)),
        Some(StringOrNumber::String(s)) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid expires_in value: {}", s))),
    }
}

impl TokenResponse {
    /// An `expires_in` too large to represent leaves the expiry unknown.
    fn into_access_token(self) -> AccessToken {
        let expires_at = self
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));

        match expires_at {
            Some(expires_at) => AccessToken::with_expiry(self.access_token, expires_at),
            None => AccessToken::new(self.access_token),
        }
    }
}

/// Error response from Azure AD.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    error_description: Option<String>,
}
