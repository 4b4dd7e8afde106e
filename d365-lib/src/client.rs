//! Main D365Client

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::api::data_headers;
use crate::auth::AccessToken;
use crate::auth::TokenProvider;
use crate::error::ApiError;
use crate::error::Error;
use crate::response::Payload;
use crate::transport::Transport;

/// Default Web API version.
pub const DEFAULT_API_VERSION: &str = "v9.1";

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 5000;

/// Client for one CRM organisation.
///
/// Cheap to clone (uses `Arc` internally). Every retrieval acquires a fresh
/// token and builds its own headers, so one client can serve concurrent
/// callers.
///
/// # Example
///
/// ```ignore
/// use d365_lib::{D365Client, auth::PasswordFlow};
///
/// let client = D365Client::builder()
///     .url("https://org.crm2.dynamics.com")
///     .token_provider(PasswordFlow::from_env()?)
///     .build()?;
///
/// let accounts = client.get_rows("accounts?$select=name").await?;
/// ```
#[derive(Clone)]
pub struct D365Client {
    inner: Arc<D365ClientInner>,
}

struct D365ClientInner {
    org_url: String,
    api_version: String,
    token_provider: Arc<dyn TokenProvider>,
    transport: Transport,
    page_size: u32,
    deadline: Option<Duration>,
}

impl D365Client {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> D365ClientBuilder<Missing, Missing> {
        D365ClientBuilder::new()
    }

    /// Validates connectivity to the organisation.
    ///
    /// Makes a `WhoAmI` request to verify the connection and credentials are valid.
    pub async fn connect(&self) -> Result<WhoAmIResponse, Error> {
        let token = self.acquire_token().await?;
        let headers = data_headers(&token, None)?;
        let url = format!("{}WhoAmI", self.data_url());

        let body = self
            .get(&url, &headers)
            .await?
            .into_json()
            .ok_or_else(|| ApiError::decode("WhoAmI returned no body"))?;

        serde_json::from_value(body)
            .map_err(|e| Error::Api(ApiError::decode(format!("invalid WhoAmI response: {}", e))))
    }

    /// Returns the organisation URL.
    pub fn org_url(&self) -> &str {
        &self.inner.org_url
    }

    /// Returns the API version being used.
    pub fn api_version(&self) -> &str {
        &self.inner.api_version
    }

    /// Returns the number of records requested per page.
    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    /// Returns the data endpoint, e.g. `https://org.crm.dynamics.com/api/data/v9.1/`.
    pub fn data_url(&self) -> String {
        format!(
            "{}{}",
            self.inner.org_url.trim_end_matches('/'),
            self.api_path()
        )
    }

    /// The version path segment, e.g. `/api/data/v9.1/`.
    pub(crate) fn api_path(&self) -> String {
        format!("/api/data/{}/", self.inner.api_version)
    }

    pub(crate) async fn acquire_token(&self) -> Result<AccessToken, Error> {
        let token = self
            .inner
            .token_provider
            .get_token(&self.inner.org_url)
            .await?;
        Ok(token)
    }

    pub(crate) async fn get(&self, url: &str, headers: &HeaderMap) -> Result<Payload, Error> {
        let payload = self
            .inner
            .transport
            .send(Method::GET, url, headers.clone(), &[], None)
            .await?;
        Ok(payload)
    }

    /// Runs a whole retrieval under the configured deadline, if any.
    pub(crate) async fn within_deadline<T, F>(&self, retrieval: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        match self.inner.deadline {
            Some(deadline) => tokio::time::timeout(deadline, retrieval)
                .await
                .map_err(|_| Error::Api(ApiError::Timeout(deadline)))?,
            None => retrieval.await,
        }
    }
}

impl std::fmt::Debug for D365Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("D365Client")
            .field("org_url", &self.inner.org_url)
            .field("api_version", &self.inner.api_version)
            .field("page_size", &self.inner.page_size)
            .field("deadline", &self.inner.deadline)
            .finish_non_exhaustive()
    }
}

/// Response from the WhoAmI request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhoAmIResponse {
    /// The ID of the business unit.
    pub business_unit_id: String,
    /// The ID of the current user.
    pub user_id: String,
    /// The ID of the organization.
    pub organization_id: String,
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`D365Client`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The CRM organisation URL
/// - `token_provider` - A [`TokenProvider`] implementation
///
/// # Example
///
/// ```ignore
/// let client = D365Client::builder()
///     .url("https://org.crm.dynamics.com")
///     .token_provider(my_provider)
///     .page_size(1000)
///     .timeout(Duration::from_secs(30))
///     .deadline(Duration::from_secs(600))
///     .build()?;
/// ```
pub struct D365ClientBuilder<Url, Provider> {
    url: Url,
    token_provider: Provider,
    api_version: String,
    page_size: u32,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    deadline: Option<Duration>,
    http_client: Option<Client>,
}

impl D365ClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            token_provider: Missing,
            api_version: DEFAULT_API_VERSION.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: None,
            connect_timeout: None,
            deadline: None,
            http_client: None,
        }
    }
}

impl Default for D365ClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> D365ClientBuilder<Missing, P> {
    /// Sets the CRM organisation URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// .url("https://org.crm2.dynamics.com")
    /// ```
    pub fn url(self, url: impl Into<String>) -> D365ClientBuilder<Set<String>, P> {
        D365ClientBuilder {
            url: Set(url.into()),
            token_provider: self.token_provider,
            api_version: self.api_version,
            page_size: self.page_size,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            deadline: self.deadline,
            http_client: self.http_client,
        }
    }
}

impl<U> D365ClientBuilder<U, Missing> {
    /// Sets the token provider for authentication.
    pub fn token_provider<T: TokenProvider + 'static>(
        self,
        provider: T,
    ) -> D365ClientBuilder<U, Set<Arc<dyn TokenProvider>>> {
        D365ClientBuilder {
            url: self.url,
            token_provider: Set(Arc::new(provider) as Arc<dyn TokenProvider>),
            api_version: self.api_version,
            page_size: self.page_size,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            deadline: self.deadline,
            http_client: self.http_client,
        }
    }
}

impl<U, P> D365ClientBuilder<U, P> {
    /// Sets the API version to use.
    ///
    /// Defaults to `v9.1`.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Sets the page size sent as `odata.maxpagesize` and as the FetchXML
    /// `count` attribute.
    ///
    /// Defaults to 5000, the service maximum.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Bounds a whole retrieval (token call plus every page).
    ///
    /// When it elapses the retrieval fails with [`ApiError::Timeout`] and the
    /// pages fetched so far are dropped.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl D365ClientBuilder<Set<String>, Set<Arc<dyn TokenProvider>>> {
    /// Builds the [`D365Client`].
    ///
    /// This method is only available when both `url` and `token_provider` have been set.
    pub fn build(self) -> Result<D365Client, Error> {
        let org_url = self.url.0;
        url::Url::parse(&org_url).map_err(|_| ApiError::InvalidUrl(org_url.clone()))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build().map_err(ApiError::from)?
            }
        };

        Ok(D365Client {
            inner: Arc::new(D365ClientInner {
                org_url,
                api_version: self.api_version,
                token_provider: self.token_provider.0,
                transport: Transport::new(http_client, self.timeout),
                page_size: self.page_size,
                deadline: self.deadline,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;

    fn client(url: &str) -> D365Client {
        D365Client::builder()
            .url(url)
            .token_provider(StaticTokenProvider::new("T1"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let client = client("https://org.crm2.dynamics.com");
        assert_eq!(client.api_version(), "v9.1");
        assert_eq!(client.page_size(), 5000);
        assert_eq!(
            client.data_url(),
            "https://org.crm2.dynamics.com/api/data/v9.1/"
        );
    }

    #[test]
    fn test_trailing_slash_is_not_doubled() {
        let client = client("https://org.crm2.dynamics.com/");
        assert_eq!(
            client.data_url(),
            "https://org.crm2.dynamics.com/api/data/v9.1/"
        );
    }

    #[test]
    fn test_custom_version_and_page_size() {
        let client = D365Client::builder()
            .url("https://org.crm.dynamics.com")
            .token_provider(StaticTokenProvider::new("T1"))
            .api_version("v9.2")
            .page_size(250)
            .build()
            .unwrap();

        assert_eq!(client.api_path(), "/api/data/v9.2/");
        assert_eq!(client.page_size(), 250);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = D365Client::builder()
            .url("not a url")
            .token_provider(StaticTokenProvider::new("T1"))
            .build();

        assert!(matches!(result, Err(Error::Api(ApiError::InvalidUrl(_)))));
    }
}
