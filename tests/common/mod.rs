//! Shared fixtures for the httpmock-backed integration tests.
#![allow(dead_code)]

// crates.io
use httpmock::MockServer;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use embed_broker::{
	auth::Secret,
	config::{AzureSettings, BrokerConfig, CorsPolicy, DEFAULT_POWERBI_SCOPE, PowerBiSettings, SessionSettings},
	endpoint::BrokerEndpoint,
	http::ApiClient,
	provider::ServicePrincipalTokenProvider,
};

/// Shared session-signing secret for the mock identity provider.
pub const SIGNING_KEY: &str = "integration-signing-key";
/// Workspace id configured on the test broker.
pub const WORKSPACE_ID: &str = "ws-1";
/// Report id configured on the test broker.
pub const REPORT_ID: &str = "r-1";
/// Tenant id configured on the test broker.
pub const TENANT_ID: &str = "tenant-1";

/// Grant path the mock authority serves for [`TENANT_ID`].
pub const GRANT_PATH: &str = "/tenant-1/oauth2/v2.0/token";
/// Report metadata path for the configured workspace/report pair.
pub const REPORT_PATH: &str = "/v1.0/myorg/groups/ws-1/reports/r-1";
/// Embed-token mint path for the configured workspace/report pair.
pub const GENERATE_PATH: &str = "/v1.0/myorg/groups/ws-1/reports/r-1/GenerateToken";

/// Canned successful grant response.
pub const GRANT_BODY: &str =
	"{\"access_token\":\"aad-token\",\"token_type\":\"Bearer\",\"expires_in\":3599}";
/// Canned report descriptor response.
pub const REPORT_BODY: &str = "{\"id\":\"r1\",\"embedUrl\":\"https://x\",\"datasetId\":\"d1\"}";
/// Canned embed-token response.
pub const GENERATE_BODY: &str =
	"{\"token\":\"t1\",\"tokenId\":\"k1\",\"expiration\":\"2099-01-01T00:00:00Z\"}";

/// Azure settings pointing the credential at the mock server.
pub fn azure_settings() -> AzureSettings {
	AzureSettings {
		client_id: Some("app-id".into()),
		client_secret: Some(Secret::new("app-secret")),
		tenant_id: Some(TENANT_ID.into()),
		scope: DEFAULT_POWERBI_SCOPE.into(),
	}
}

/// Fully configured broker config targeting the mock server.
pub fn broker_config(server: &MockServer) -> BrokerConfig {
	BrokerConfig {
		azure: azure_settings(),
		power_bi: PowerBiSettings {
			api_url: server_url(server),
			workspace_id: Some(WORKSPACE_ID.into()),
			report_id: Some(REPORT_ID.into()),
		},
		session: SessionSettings { signing_key: Some(Secret::new(SIGNING_KEY)) },
		cors: CorsPolicy::from_list("https://app.example.com"),
	}
}

/// Builds an endpoint whose authority and API base both target the server.
pub fn test_endpoint(server: &MockServer, config: BrokerConfig) -> BrokerEndpoint {
	let http = ApiClient::new().expect("Test transport should build.");
	let provider = ServicePrincipalTokenProvider::new(config.azure.clone(), http.clone())
		.with_authority(server_url(server));

	BrokerEndpoint::with_transport(config, http)
		.expect("Endpoint fixture should construct.")
		.with_token_provider(provider)
}

/// Base URL of the mock server.
pub fn server_url(server: &MockServer) -> Url {
	Url::parse(&server.base_url()).expect("Mock server URL should parse.")
}

#[derive(Serialize)]
struct SessionClaims<'a> {
	sub: &'a str,
	email: &'a str,
	exp: i64,
}

/// Signs a session token the broker's verifier accepts.
pub fn session_token(sub: &str, email: &str) -> String {
	sign_session_token(SIGNING_KEY, sub, email)
}

/// Signs a session token with an arbitrary key (forgery fixtures).
pub fn sign_session_token(key: &str, sub: &str, email: &str) -> String {
	let exp = (OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp();

	jsonwebtoken::encode(
		&Header::new(Algorithm::HS256),
		&SessionClaims { sub, email, exp },
		&EncodingKey::from_secret(key.as_bytes()),
	)
	.expect("Session fixture should sign.")
}

/// `Authorization` header value for a freshly signed session.
pub fn bearer(sub: &str) -> String {
	format!("Bearer {}", session_token(sub, "user@example.com"))
}
