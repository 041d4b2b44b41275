//! Environment-sourced broker configuration.
//!
//! Configuration is loaded once at process start into an immutable
//! [`BrokerConfig`] and injected into the endpoint explicitly; there is no
//! module-level provider state. Azure and Power BI values load as options so
//! a partially configured process can still start and report exactly which
//! variables are missing through the health surface; absence only becomes an
//! error on the request that needs the value.

// std
use std::env;
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// Environment variable holding the service-principal application id.
pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
/// Environment variable holding the service-principal secret.
pub const AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
/// Environment variable holding the Azure AD tenant id.
pub const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
/// Environment variable overriding the Power BI OAuth scope.
pub const POWERBI_SCOPE: &str = "POWERBI_SCOPE";
/// Environment variable overriding the Power BI REST API base URL.
pub const POWERBI_API_URL: &str = "POWERBI_API_URL";
/// Environment variable holding the default workspace id.
pub const POWERBI_WORKSPACE_ID: &str = "POWERBI_WORKSPACE_ID";
/// Environment variable holding the default report id.
pub const POWERBI_REPORT_ID: &str = "POWERBI_REPORT_ID";
/// Environment variable holding the identity provider's session signing
/// secret.
pub const SESSION_JWT_SECRET: &str = "SESSION_JWT_SECRET";
/// Environment variable holding the comma-separated CORS origin allowlist.
pub const ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";

/// Default OAuth scope for the Power BI REST API.
pub const DEFAULT_POWERBI_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default";
/// Default Power BI REST API base URL.
pub const DEFAULT_POWERBI_API_URL: &str = "https://api.powerbi.com";

/// Azure AD service-principal settings as loaded from the environment.
#[derive(Clone, Debug, Default)]
pub struct AzureSettings {
	/// Application (client) id, when configured.
	pub client_id: Option<String>,
	/// Client secret, when configured.
	pub client_secret: Option<Secret>,
	/// Directory (tenant) id, when configured.
	pub tenant_id: Option<String>,
	/// OAuth scope requested during the client-credentials grant.
	pub scope: String,
}
impl AzureSettings {
	/// Resolves the complete credential, failing on the first missing value.
	pub fn credential(&self) -> Result<ServicePrincipalCredential, ConfigError> {
		let client_id = self
			.client_id
			.clone()
			.ok_or(ConfigError::MissingSetting { name: AZURE_CLIENT_ID })?;
		let client_secret = self
			.client_secret
			.clone()
			.ok_or(ConfigError::MissingSetting { name: AZURE_CLIENT_SECRET })?;
		let tenant_id = self
			.tenant_id
			.clone()
			.ok_or(ConfigError::MissingSetting { name: AZURE_TENANT_ID })?;

		Ok(ServicePrincipalCredential {
			client_id,
			client_secret,
			tenant_id,
			scope: self.scope.clone(),
		})
	}

	/// Names of the required variables that are absent.
	pub fn missing(&self) -> Vec<&'static str> {
		let mut missing = Vec::new();

		if self.client_id.is_none() {
			missing.push(AZURE_CLIENT_ID);
		}
		if self.client_secret.is_none() {
			missing.push(AZURE_CLIENT_SECRET);
		}
		if self.tenant_id.is_none() {
			missing.push(AZURE_TENANT_ID);
		}

		missing
	}
}

/// Complete service-principal credential, immutable for the process lifetime.
///
/// Never serialized, never sent to the client; the secret redacts itself in
/// the `Debug` form.
#[derive(Clone, Debug)]
pub struct ServicePrincipalCredential {
	/// Application (client) id.
	pub client_id: String,
	/// Client secret used in the client-credentials grant.
	pub client_secret: Secret,
	/// Directory (tenant) id.
	pub tenant_id: String,
	/// OAuth scope requested during the grant.
	pub scope: String,
}

/// Power BI REST API settings.
#[derive(Clone, Debug)]
pub struct PowerBiSettings {
	/// Base URL of the reporting API.
	pub api_url: Url,
	/// Default workspace id, when configured.
	pub workspace_id: Option<String>,
	/// Default report id, when configured.
	pub report_id: Option<String>,
}
impl PowerBiSettings {
	/// Names of the per-request-required variables that are absent.
	pub fn missing(&self) -> Vec<&'static str> {
		let mut missing = Vec::new();

		if self.workspace_id.is_none() {
			missing.push(POWERBI_WORKSPACE_ID);
		}
		if self.report_id.is_none() {
			missing.push(POWERBI_REPORT_ID);
		}

		missing
	}
}
impl Default for PowerBiSettings {
	fn default() -> Self {
		Self {
			api_url: Url::parse(DEFAULT_POWERBI_API_URL)
				.unwrap_or_else(|_| unreachable!("Default API URL is a valid literal.")),
			workspace_id: None,
			report_id: None,
		}
	}
}

/// Session-verification settings.
#[derive(Clone, Debug, Default)]
pub struct SessionSettings {
	/// Shared signing secret, when configured.
	pub signing_key: Option<Secret>,
}
impl SessionSettings {
	/// Resolves the signing key, failing when it is absent.
	pub fn signing_key(&self) -> Result<&Secret, ConfigError> {
		self.signing_key.as_ref().ok_or(ConfigError::MissingSetting { name: SESSION_JWT_SECRET })
	}

	/// Names of the required variables that are absent.
	pub fn missing(&self) -> Vec<&'static str> {
		if self.signing_key.is_none() { vec![SESSION_JWT_SECRET] } else { Vec::new() }
	}
}

/// Origin allowlist applied to CORS responses.
///
/// An empty allowlist emits no CORS headers at all; `*` allows any origin.
#[derive(Clone, Debug, Default)]
pub struct CorsPolicy {
	allowed_origins: Vec<String>,
}
impl CorsPolicy {
	/// Builds a policy from explicit origins.
	pub fn new(origins: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self { allowed_origins: origins.into_iter().map(Into::into).collect() }
	}

	/// Parses the comma-separated `ALLOWED_ORIGINS` format.
	pub fn from_list(raw: &str) -> Self {
		Self::new(raw.split(',').map(str::trim).filter(|origin| !origin.is_empty()))
	}

	/// Returns the `Access-Control-Allow-Origin` value to echo, if the origin
	/// is allowed.
	pub fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
		if self.allowed_origins.iter().any(|allowed| allowed == "*") {
			return Some("*".into());
		}

		let origin = origin?;

		self.allowed_origins.iter().find(|allowed| *allowed == origin).cloned()
	}
}

/// Immutable process-wide broker configuration.
#[derive(Clone, Debug, Default)]
pub struct BrokerConfig {
	/// Service-principal settings.
	pub azure: AzureSettings,
	/// Power BI REST API settings.
	pub power_bi: PowerBiSettings,
	/// Session-verification settings.
	pub session: SessionSettings,
	/// CORS origin allowlist.
	pub cors: CorsPolicy,
}
impl BrokerConfig {
	/// Loads configuration from the recognized environment variables.
	///
	/// Only an unparseable `POWERBI_API_URL` fails the load; every other
	/// absence is deferred to the request (or the health report) that needs
	/// the value.
	pub fn from_env() -> Result<Self, ConfigError> {
		let api_url = match env_opt(POWERBI_API_URL) {
			Some(raw) => Url::parse(&raw)
				.map_err(|source| ConfigError::invalid_setting(POWERBI_API_URL, source))?,
			None => PowerBiSettings::default().api_url,
		};

		Ok(Self {
			azure: AzureSettings {
				client_id: env_opt(AZURE_CLIENT_ID),
				client_secret: env_opt(AZURE_CLIENT_SECRET).map(Secret::new),
				tenant_id: env_opt(AZURE_TENANT_ID),
				scope: env_opt(POWERBI_SCOPE).unwrap_or_else(|| DEFAULT_POWERBI_SCOPE.into()),
			},
			power_bi: PowerBiSettings {
				api_url,
				workspace_id: env_opt(POWERBI_WORKSPACE_ID),
				report_id: env_opt(POWERBI_REPORT_ID),
			},
			session: SessionSettings { signing_key: env_opt(SESSION_JWT_SECRET).map(Secret::new) },
			cors: env_opt(ALLOWED_ORIGINS)
				.map(|raw| CorsPolicy::from_list(&raw))
				.unwrap_or_default(),
		})
	}
}

fn env_opt(name: &str) -> Option<String> {
	env::var(name).ok().map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}
