//! Embed-token minting, optionally bound to an end-user identity.

// self
use crate::{
	_prelude::*,
	auth::UserIdentity,
	http::decode_strict,
	obs::{self, StageKind, StageOutcome, StageSpan},
	powerbi::{PowerBiApi, require_2xx},
	provider::AccessToken,
};

const ENDPOINT: &str = "embed token";

/// Short-lived, report-scoped credential authorizing the viewer to render one
/// report.
///
/// `expiration` is always the Power BI-issued instant, never a locally
/// computed estimate; the client schedules its proactive refresh from it. The
/// token must never be reused past that instant.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbedToken {
	/// Opaque embed token, destined for the viewer.
	pub token: String,
	/// Token identifier issued alongside the token.
	pub token_id: String,
	/// Upstream-issued expiry instant.
	#[serde(with = "time::serde::rfc3339")]
	pub expiration: OffsetDateTime,
}
impl Debug for EmbedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EmbedToken")
			.field("token", &"<redacted>")
			.field("token_id", &self.token_id)
			.field("expiration", &self.expiration)
			.finish()
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerateTokenRequest<'a> {
	access_level: &'static str,
	allow_save_as: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	identities: Option<Vec<WireEffectiveIdentity<'a>>>,
}
impl<'a> WireGenerateTokenRequest<'a> {
	fn new(identity: Option<&'a UserIdentity>) -> Self {
		Self {
			access_level: "View",
			allow_save_as: false,
			identities: identity.map(|identity| vec![WireEffectiveIdentity::for_user(identity)]),
		}
	}
}

/// Row-level-security binding entry. `roles` and `datasets` are placeholders
/// for future per-tenant filtering policy and stay empty in the base design.
#[derive(Serialize)]
struct WireEffectiveIdentity<'a> {
	username: &'a str,
	roles: Vec<String>,
	datasets: Vec<String>,
}
impl<'a> WireEffectiveIdentity<'a> {
	fn for_user(identity: &'a UserIdentity) -> Self {
		Self { username: &identity.user_id, roles: Vec::new(), datasets: Vec::new() }
	}
}

impl PowerBiApi {
	/// Mints a view-scoped embed token for the report.
	///
	/// When `identity` is present the request carries an `identities` entry
	/// binding the token to that user for row-level security; when absent the
	/// field is omitted entirely. The response shape is validated strictly: a
	/// payload missing `token`, `tokenId`, or `expiration` fails with a
	/// distinct malformed-response error instead of being coerced.
	pub async fn mint_embed_token(
		&self,
		access_token: &AccessToken,
		workspace_id: &str,
		report_id: &str,
		identity: Option<&UserIdentity>,
	) -> Result<EmbedToken> {
		const KIND: StageKind = StageKind::EmbedTokenMint;

		let span = StageSpan::new(KIND);

		obs::record_stage_outcome(KIND, StageOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = format!("{}/GenerateToken", self.report_url(workspace_id, report_id));
				let request = self
					.http
					.post(url)
					.bearer_auth(access_token.value.expose())
					.json(&WireGenerateTokenRequest::new(identity));
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
