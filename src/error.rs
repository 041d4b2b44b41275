//! Broker-level error taxonomy shared across the request pipeline.
//!
//! Every failure maps to exactly one variant and one HTTP status, and none of
//! the variants ever carry secret material in their `Display` output; the
//! client only ever sees the envelope message, while diagnostic detail stays
//! in server-side logs.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (missing setting or request parameter).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The caller's session credential was missing, malformed, or rejected.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Upstream response did not match the documented shape.
	#[error(transparent)]
	MalformedUpstream(#[from] MalformedResponseError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The identity provider rejected the service-principal grant.
	#[error("Service-principal grant was rejected: {reason}.")]
	UpstreamAuth {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// OAuth `error`/`error_description` summary; never contains the secret.
		reason: String,
	},
	/// The Power BI REST API responded with a non-2xx status.
	///
	/// The captured body is kept for server-side logs only; `Display`
	/// deliberately omits it so upstream detail never reaches the client.
	#[error("Power BI API call failed with status {status}.")]
	UpstreamApi {
		/// HTTP status returned by the reporting API.
		status: u16,
		/// Raw response body, for logs and debugging.
		body: String,
	},
	/// An upstream call exceeded the per-call time budget.
	#[error("Upstream call to the {endpoint} endpoint timed out.")]
	UpstreamTimeout {
		/// Stable label for the endpoint that timed out.
		endpoint: &'static str,
	},
}
impl Error {
	/// HTTP status the endpoint reports for this error.
	///
	/// A rejected service-principal grant maps to 500 rather than 401: it is a
	/// broker misconfiguration, never the caller's fault, and 401 would
	/// mislead the client into re-authenticating.
	pub fn http_status(&self) -> u16 {
		match self {
			Self::Config(_) => 400,
			Self::Auth(_) => 401,
			Self::UpstreamAuth { .. }
			| Self::UpstreamApi { .. }
			| Self::MalformedUpstream(_)
			| Self::Transport(_) => 500,
			Self::UpstreamTimeout { .. } => 504,
		}
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required setting is absent from both the request and the environment.
	#[error("Required setting `{name}` is not configured.")]
	MissingSetting {
		/// Environment variable (or request parameter) name.
		name: &'static str,
	},
	/// A setting was present but could not be parsed.
	#[error("Setting `{name}` is invalid.")]
	InvalidSetting {
		/// Environment variable name.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: BoxError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a parse failure for the named setting.
	pub fn invalid_setting(
		name: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::InvalidSetting { name, source: Box::new(src) }
	}
}

/// Caller-credential failures; all map to 401.
///
/// The `Display` strings are the exact messages returned to the client, so
/// they stay generic. Whatever the verifier learned about *why* a token was
/// rejected is logged server-side and never surfaced here.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// No `Authorization` header accompanied the request.
	#[error("Authorization header is missing.")]
	MissingAuthorization,
	/// The `Authorization` header is not a `Bearer <token>` credential.
	#[error("Authorization header is not a Bearer credential.")]
	MalformedAuthorization,
	/// The session token failed verification or has expired.
	#[error("Invalid or expired session token.")]
	InvalidSession,
}

/// Raised when an upstream JSON payload is missing expected fields or carries
/// the wrong primitive types; the serde path pins down the offending field.
#[derive(Debug, ThisError)]
#[error("Upstream returned an unexpected {endpoint} response shape.")]
pub struct MalformedResponseError {
	/// Stable label for the upstream operation that produced the payload.
	pub endpoint: &'static str,
	/// Structured decoding failure, including the field path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Stable label for the endpoint being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during an upstream call.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn statuses_follow_the_taxonomy() {
		assert_eq!(Error::from(ConfigError::MissingSetting { name: "POWERBI_REPORT_ID" }).http_status(), 400);
		assert_eq!(Error::from(AuthError::MissingAuthorization).http_status(), 401);
		assert_eq!(Error::UpstreamAuth { status: 400, reason: "invalid_client".into() }.http_status(), 500);
		assert_eq!(Error::UpstreamApi { status: 404, body: String::new() }.http_status(), 500);
		assert_eq!(Error::UpstreamTimeout { endpoint: "report metadata" }.http_status(), 504);
	}

	#[test]
	fn upstream_api_display_omits_the_body() {
		let err = Error::UpstreamApi { status: 403, body: "token scope details".into() };
		let rendered = err.to_string();

		assert!(rendered.contains("403"));
		assert!(!rendered.contains("token scope details"));
	}
}
