//! Framework-agnostic broker endpoint.
//!
//! [`BrokerEndpoint`] is the externally reachable operation. It owns the
//! verifier, the token provider, and the assembler as explicitly constructed,
//! injected collaborators (no module-level singletons), and exposes the
//! request lifecycle as plain request/response types so any HTTP router can
//! adapt it: authenticate the caller, resolve the workspace/report pair,
//! acquire the service-principal token, assemble, respond. The order is
//! fixed; no step after an authentication failure executes.
//!
//! Each request is stateless—every entity except the process configuration is
//! created fresh per call and discarded with the response—so re-invoking the
//! endpoint with the same valid credential is always safe and produces a
//! fresh embed configuration.

// self
use crate::{
	_prelude::*,
	auth::{SessionVerifier, UserIdentity, bearer_token},
	config::{BrokerConfig, POWERBI_REPORT_ID, POWERBI_WORKSPACE_ID},
	error::{AuthError, ConfigError},
	flows::{EmbedConfigAssembler, EmbedConfiguration},
	http::ApiClient,
	obs::{self, StageKind, StageOutcome},
	powerbi::PowerBiApi,
	provider::ServicePrincipalTokenProvider,
};

/// Inbound embed-configuration request, already lifted out of whatever HTTP
/// framework fronts the broker.
#[derive(Clone, Debug, Default)]
pub struct EmbedConfigRequest {
	/// Raw `Authorization` header value, if present.
	pub authorization: Option<String>,
	/// Raw `Origin` header value, if present.
	pub origin: Option<String>,
	/// Request-supplied workspace id overriding the configured default.
	pub workspace_id: Option<String>,
	/// Request-supplied report id overriding the configured default.
	pub report_id: Option<String>,
}

/// CORS headers attached to a response; empty when the origin is not allowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsHeaders(Option<String>);
impl CorsHeaders {
	/// Wraps the `Access-Control-Allow-Origin` value to echo, if any.
	pub fn new(allow_origin: Option<String>) -> Self {
		Self(allow_origin)
	}

	/// Header name/value pairs to attach to the HTTP response.
	pub fn pairs(&self) -> Vec<(&'static str, String)> {
		let Some(origin) = &self.0 else {
			return Vec::new();
		};

		vec![
			("Access-Control-Allow-Origin", origin.clone()),
			("Access-Control-Allow-Methods", "GET, POST, OPTIONS".into()),
			("Access-Control-Allow-Headers", "Authorization, Content-Type".into()),
			("Access-Control-Max-Age", "3600".into()),
		]
	}
}

/// JSON envelope returned for every non-preflight response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope {
	/// Successful brokering result.
	Success(SuccessEnvelope),
	/// Failed brokering result.
	Error(ErrorEnvelope),
}
impl Envelope {
	/// Wraps a freshly assembled configuration, stamped with the current
	/// instant.
	pub fn success(data: EmbedConfiguration) -> Self {
		Self::Success(SuccessEnvelope { success: true, data, timestamp: OffsetDateTime::now_utc() })
	}

	/// Wraps a client-safe error message, stamped with the current instant.
	pub fn error(message: impl Into<String>) -> Self {
		Self::Error(ErrorEnvelope {
			success: false,
			error: message.into(),
			timestamp: OffsetDateTime::now_utc(),
		})
	}
}

/// Success envelope: `{success: true, data, timestamp}`.
#[derive(Debug, Serialize)]
pub struct SuccessEnvelope {
	/// Always `true`.
	pub success: bool,
	/// The assembled embed configuration.
	pub data: EmbedConfiguration,
	/// Instant the response was produced.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

/// Error envelope: `{success: false, error, timestamp}`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
	/// Always `false`.
	pub success: bool,
	/// Client-safe error message; never carries secret material.
	pub error: String,
	/// Instant the response was produced.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}

/// Response the fronting HTTP layer translates one-to-one.
#[derive(Debug)]
pub struct EndpointResponse {
	/// HTTP status code.
	pub status: u16,
	/// CORS headers to attach.
	pub cors: CorsHeaders,
	/// JSON body; absent for preflight responses.
	pub body: Option<Envelope>,
}

/// Per-subsystem readiness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubsystemHealth {
	/// Every required setting is present.
	Ready,
	/// One or more required settings are absent.
	Misconfigured {
		/// Names of the missing environment variables; never their values.
		missing: Vec<&'static str>,
	},
}
impl SubsystemHealth {
	fn from_missing(missing: Vec<&'static str>) -> Self {
		if missing.is_empty() { Self::Ready } else { Self::Misconfigured { missing } }
	}
}

/// Configuration/service readiness summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
	/// Session-verification subsystem.
	pub authentication: SubsystemHealth,
	/// Service-principal + Power BI subsystem.
	pub power_bi: SubsystemHealth,
}
impl HealthReport {
	/// Summarizes the provided configuration.
	pub fn of(config: &BrokerConfig) -> Self {
		let mut power_bi_missing = config.azure.missing();

		power_bi_missing.extend(config.power_bi.missing());

		Self {
			authentication: SubsystemHealth::from_missing(config.session.missing()),
			power_bi: SubsystemHealth::from_missing(power_bi_missing),
		}
	}
}

/// The externally reachable brokering operation.
#[derive(Clone, Debug)]
pub struct BrokerEndpoint {
	config: BrokerConfig,
	verifier: SessionVerifier,
	provider: ServicePrincipalTokenProvider,
	assembler: EmbedConfigAssembler,
}
impl BrokerEndpoint {
	/// Builds the endpoint with a default transport.
	///
	/// Fails only when the session signing secret is absent—without it no
	/// request could ever be served—or when the HTTP client cannot be built.
	/// Azure and Power BI settings stay per-request so the health surface can
	/// enumerate them on a running process.
	pub fn new(config: BrokerConfig) -> Result<Self, ConfigError> {
		let http = ApiClient::new()?;

		Self::with_transport(config, http)
	}

	/// Builds the endpoint around a caller-provided transport.
	pub fn with_transport(config: BrokerConfig, http: ApiClient) -> Result<Self, ConfigError> {
		let verifier = SessionVerifier::new(config.session.signing_key()?);
		let provider = ServicePrincipalTokenProvider::new(config.azure.clone(), http.clone());
		let assembler =
			EmbedConfigAssembler::new(PowerBiApi::new(config.power_bi.api_url.clone(), http));

		Ok(Self { config, verifier, provider, assembler })
	}

	/// Replaces the token provider (authority overrides, tests).
	pub fn with_token_provider(mut self, provider: ServicePrincipalTokenProvider) -> Self {
		self.provider = provider;

		self
	}

	/// Replaces the assembler (display-setting overrides, tests).
	pub fn with_assembler(mut self, assembler: EmbedConfigAssembler) -> Self {
		self.assembler = assembler;

		self
	}

	/// Answers a CORS preflight: 204, no body, no authentication.
	pub fn preflight(&self, origin: Option<&str>) -> EndpointResponse {
		EndpointResponse {
			status: 204,
			cors: CorsHeaders::new(self.config.cors.allow_origin(origin)),
			body: None,
		}
	}

	/// Runs the full brokering pipeline for one request.
	///
	/// Always returns a response: failures become the taxonomy-mapped status
	/// plus a `{success: false, error, timestamp}` envelope. Nothing is
	/// retried and nothing is swallowed.
	pub async fn embed_config(&self, request: EmbedConfigRequest) -> EndpointResponse {
		let cors = CorsHeaders::new(self.config.cors.allow_origin(request.origin.as_deref()));

		match self.run_pipeline(&request).await {
			Ok(configuration) => EndpointResponse {
				status: 200,
				cors,
				body: Some(Envelope::success(configuration)),
			},
			Err(err) => {
				#[cfg(feature = "tracing")]
				tracing::error!(error = ?err, "Embed-config request failed.");

				EndpointResponse {
					status: err.http_status(),
					cors,
					body: Some(Envelope::error(err.to_string())),
				}
			},
		}
	}

	/// Summarizes which subsystems are ready to serve requests.
	pub fn health(&self) -> HealthReport {
		HealthReport::of(&self.config)
	}

	async fn run_pipeline(&self, request: &EmbedConfigRequest) -> Result<EmbedConfiguration> {
		// Steps 2-5 of the request lifecycle, strictly ordered.
		let identity = self.authenticate(request.authorization.as_deref())?;
		let workspace_id = request
			.workspace_id
			.clone()
			.or_else(|| self.config.power_bi.workspace_id.clone())
			.ok_or(ConfigError::MissingSetting { name: POWERBI_WORKSPACE_ID })?;
		let report_id = request
			.report_id
			.clone()
			.or_else(|| self.config.power_bi.report_id.clone())
			.ok_or(ConfigError::MissingSetting { name: POWERBI_REPORT_ID })?;
		let access_token = self.provider.acquire().await?;

		self.assembler.assemble(&access_token, &workspace_id, &report_id, Some(&identity)).await
	}

	fn authenticate(&self, header: Option<&str>) -> Result<UserIdentity, AuthError> {
		const KIND: StageKind = StageKind::SessionVerify;

		obs::record_stage_outcome(KIND, StageOutcome::Attempt);

		let result = bearer_token(header).and_then(|token| self.verifier.verify(token));

		match &result {
			Ok(_) => obs::record_stage_outcome(KIND, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(KIND, StageOutcome::Failure),
		}

		result
	}
}
