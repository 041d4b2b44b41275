//! Power BI REST API operations.
//!
//! [`PowerBiApi`] owns the API base URL plus the shared transport; the two
//! operations the broker needs—report metadata retrieval and embed-token
//! minting—live in their own submodules as `impl` blocks on this client.
//! Neither operation retries: transient upstream failures surface directly to
//! the caller, which reports a single error envelope.

pub mod embed_token;
pub mod reports;

pub use embed_token::*;
pub use reports::*;

// self
use crate::{_prelude::*, http::ApiClient};

/// Client for the Power BI REST API, scoped to the `myorg` organization.
#[derive(Clone, Debug)]
pub struct PowerBiApi {
	base_url: Url,
	http: ApiClient,
}
impl PowerBiApi {
	/// Creates a client against the provided API base URL.
	pub fn new(base_url: Url, http: ApiClient) -> Self {
		Self { base_url, http }
	}

	fn report_url(&self, workspace_id: &str, report_id: &str) -> String {
		format!(
			"{}/v1.0/myorg/groups/{workspace_id}/reports/{report_id}",
			self.base_url.as_str().trim_end_matches('/'),
		)
	}
}

/// Accepts 2xx bodies and maps everything else to [`Error::UpstreamApi`].
fn require_2xx(status: u16, body: String) -> Result<String> {
	if (200..300).contains(&status) { Ok(body) } else { Err(Error::UpstreamApi { status, body }) }
}
