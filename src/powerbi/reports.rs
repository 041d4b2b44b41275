//! Report metadata retrieval.

// self
use crate::{
	_prelude::*,
	http::decode_strict,
	obs::{self, StageKind, StageOutcome, StageSpan},
	powerbi::{PowerBiApi, require_2xx},
	provider::AccessToken,
};

const ENDPOINT: &str = "report metadata";

/// Read-only projection of Power BI's report object, fetched fresh per
/// request.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDescriptor {
	/// Report id.
	pub id: String,
	/// Display name, when the API includes one.
	#[serde(default)]
	pub name: Option<String>,
	/// URL the viewer embeds.
	pub embed_url: String,
	/// Backing dataset id.
	pub dataset_id: String,
}

impl PowerBiApi {
	/// Retrieves the report descriptor for the workspace/report pair.
	///
	/// One GET request, no retries; a non-2xx response surfaces as
	/// [`Error::UpstreamApi`] with the status and captured body.
	pub async fn fetch_report(
		&self,
		access_token: &AccessToken,
		workspace_id: &str,
		report_id: &str,
	) -> Result<ReportDescriptor> {
		const KIND: StageKind = StageKind::ReportMetadata;

		let span = StageSpan::new(KIND);

		obs::record_stage_outcome(KIND, StageOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self
					.http
					.get(self.report_url(workspace_id, report_id))
					.bearer_auth(access_token.value.expose());
				let (status, body) = self.http.send(request, ENDPOINT).await?;
				let body = require_2xx(status, body)?;

				decode_strict(ENDPOINT, &body)
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(KIND, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(KIND, StageOutcome::Failure),
		}

		result
	}
}
