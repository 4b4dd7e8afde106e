//! Mock identity and data endpoints shared by the integration tests.

#![allow(dead_code)]

use d365_lib::D365Client;
use d365_lib::auth::PasswordFlow;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;

pub const TOKEN_PATH: &str = "/common/oauth2/token";
pub const ACCOUNTS_PATH: &str = "/api/data/v9.1/accounts";

/// A password flow pointed at the mock identity endpoint.
pub fn password_flow(server: &MockServer) -> PasswordFlow {
    PasswordFlow::new("client-id", "client-secret", "crm@example.com", "password")
        .with_token_url(format!("{}{}", server.uri(), TOKEN_PATH))
}

/// A client whose organisation and identity endpoint are both the mock server.
pub fn client(server: &MockServer) -> D365Client {
    D365Client::builder()
        .url(server.uri())
        .token_provider(password_flow(server))
        .build()
        .expect("client should build")
}

/// Mounts an identity endpoint that hands out `token`, expecting `calls` token requests.
pub async fn mount_token(server: &MockServer, token: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=client-id"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": "3599",
            "access_token": token
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Ids of a record list, in order.
pub fn ids(records: &[d365_lib::model::Record]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.get_i64("id").unwrap().unwrap())
        .collect()
}
