//! Service-principal access-token acquisition.
//!
//! [`ServicePrincipalTokenProvider`] performs the OAuth 2.0 client-credentials
//! grant against the Azure AD token endpoint. The provider is constructed
//! explicitly and injected into the endpoint; credentials resolve from the
//! immutable [`AzureSettings`] on every call so a missing value surfaces as a
//! per-request configuration error rather than a startup crash. The acquired
//! token is owned exclusively by the broker process, lives for one brokering
//! call, and is never cached or persisted.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	config::AzureSettings,
	http::{ApiClient, decode_strict},
	obs::{self, StageKind, StageOutcome, StageSpan},
};

/// Default Azure AD authority issuing service-principal tokens.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

const GRANT_ENDPOINT: &str = "service-principal grant";

/// Bearer access token scoped to the Power BI API.
///
/// The token value is broker-internal; only the embed token derived from it
/// ever reaches the client.
#[derive(Clone, Debug)]
pub struct AccessToken {
	/// Opaque bearer token; callers must avoid logging it.
	pub value: Secret,
	/// Token type reported by the endpoint (`Bearer`).
	pub token_type: String,
	/// Validity window in seconds, as issued.
	pub expires_in_seconds: u64,
}

#[derive(Deserialize)]
struct WireAccessToken {
	access_token: String,
	token_type: String,
	expires_in: u64,
}

#[derive(Deserialize, Default)]
struct WireGrantRejection {
	error: Option<String>,
	error_description: Option<String>,
}

/// Exchanges the service-principal credential for a bearer access token.
#[derive(Clone, Debug)]
pub struct ServicePrincipalTokenProvider {
	settings: AzureSettings,
	authority: Url,
	http: ApiClient,
}
impl ServicePrincipalTokenProvider {
	/// Creates a provider against the default Azure AD authority.
	pub fn new(settings: AzureSettings, http: ApiClient) -> Self {
		let authority = Url::parse(DEFAULT_AUTHORITY)
			.unwrap_or_else(|_| unreachable!("Default authority is a valid literal."));

		Self { settings, authority, http }
	}

	/// Overrides the authority base URL (sovereign clouds, tests).
	pub fn with_authority(mut self, authority: Url) -> Self {
		self.authority = authority;

		self
	}

	/// Performs the client-credentials grant and returns the access token.
	///
	/// Fails with a configuration error when any credential value is absent,
	/// and with [`Error::UpstreamAuth`] when the token endpoint responds with
	/// a non-success status. The client secret appears only in the outbound
	/// form body, never in errors or logs.
	pub async fn acquire(&self) -> Result<AccessToken> {
		const KIND: StageKind = StageKind::ServicePrincipalGrant;

		let span = StageSpan::new(KIND);

		obs::record_stage_outcome(KIND, StageOutcome::Attempt);

		let result = span
			.instrument(async move {
				let credential = self.settings.credential()?;
				let token_url = format!(
					"{}/{}/oauth2/v2.0/token",
					self.authority.as_str().trim_end_matches('/'),
					credential.tenant_id,
				);
				let form = [
					("client_id", credential.client_id.as_str()),
					("client_secret", credential.client_secret.expose()),
					("scope", credential.scope.as_str()),
					("grant_type", "client_credentials"),
				];
				let request = self.http.post(token_url).form(&form);
				let (status, body) = self.http.send(request, GRANT_ENDPOINT).await?;

				if !(200..300).contains(&status) {
					return Err(Error::UpstreamAuth {
						status,
						reason: grant_rejection_reason(&body),
					});
				}

				let wire: WireAccessToken = decode_strict(GRANT_ENDPOINT, &body)?;

				Ok(AccessToken {
					value: Secret::new(wire.access_token),
					token_type: wire.token_type,
					expires_in_seconds: wire.expires_in,
				})
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(KIND, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(KIND, StageOutcome::Failure),
		}

		result
	}
}

/// Summarizes an OAuth rejection body without echoing anything sensitive.
fn grant_rejection_reason(body: &str) -> String {
	let rejection: WireGrantRejection = serde_json::from_str(body).unwrap_or_default();

	rejection
		.error_description
		.or(rejection.error)
		.unwrap_or_else(|| "token endpoint returned a non-success response".into())
}
