//! Transport primitives shared by every upstream call.
//!
//! [`ApiClient`] is a thin wrapper around [`ReqwestClient`] so shared HTTP
//! behavior lives in one place: redirects are disabled (token endpoints
//! return results directly instead of delegating to another URI) and a
//! per-call timeout bounds every upstream request so a slow dependency can
//! never hang a brokering call indefinitely.

// std
use std::ops::Deref;
// crates.io
use reqwest::{Error as ReqwestError, RequestBuilder, redirect::Policy};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::{ConfigError, MalformedResponseError, TransportError}};

/// Default per-call time budget for upstream requests.
pub const DEFAULT_UPSTREAM_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Shared HTTP client for the grant and Power BI calls.
#[derive(Clone, Debug)]
pub struct ApiClient(ReqwestClient);
impl ApiClient {
	/// Builds a client with the default per-call timeout.
	pub fn new() -> Result<Self, ConfigError> {
		Self::with_timeout(DEFAULT_UPSTREAM_TIMEOUT)
	}

	/// Builds a client with an explicit per-call timeout.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.timeout(timeout)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Wraps an existing [`ReqwestClient`].
	///
	/// The caller is responsible for configuring a request timeout and for
	/// disabling redirect following.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Dispatches the request and returns the status plus the raw body.
	///
	/// Timeouts become [`Error::UpstreamTimeout`]; every other transport
	/// failure becomes [`TransportError::Network`]. Status handling stays with
	/// the caller, which knows the endpoint's error contract.
	pub(crate) async fn send(
		&self,
		request: RequestBuilder,
		endpoint: &'static str,
	) -> Result<(u16, String)> {
		let response =
			request.send().await.map_err(|source| map_reqwest_error(endpoint, source))?;
		let status = response.status().as_u16();
		let body =
			response.text().await.map_err(|source| map_reqwest_error(endpoint, source))?;

		Ok((status, body))
	}
}
impl AsRef<ReqwestClient> for ApiClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ApiClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Decodes an upstream JSON payload, requiring the documented shape exactly.
///
/// A missing or ill-typed field surfaces as [`Error::MalformedUpstream`] with
/// the serde path naming the offending field; nothing is silently coerced.
pub(crate) fn decode_strict<T>(endpoint: &'static str, body: &str) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| MalformedResponseError { endpoint, source }.into())
}

fn map_reqwest_error(endpoint: &'static str, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::http_client_build(err).into();
	}
	if err.is_timeout() {
		return Error::UpstreamTimeout { endpoint };
	}

	TransportError::network(endpoint, err).into()
}
