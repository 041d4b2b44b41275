//! Embed-configuration assembly.
//!
//! [`EmbedConfigAssembler`] is the single point of intra-request concurrency:
//! report metadata and the embed token both depend only on the access token,
//! so the two Power BI calls run as concurrent futures purely to cut
//! end-to-end latency. The join propagates the first failure immediately and
//! drops the other in-flight call; there is no partial success and no
//! fallback.

// self
use crate::{
	_prelude::*,
	auth::UserIdentity,
	obs::{self, StageKind, StageOutcome, StageSpan},
	powerbi::{EmbedToken, PowerBiApi, ReportDescriptor},
	provider::AccessToken,
};

/// Fixed, explicitly enumerated viewer display settings.
///
/// Modeled as named fields rather than an open-ended dictionary so a typo in
/// a setting name is a compile error, not a silently ignored key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
	/// Whether the viewer shows the filter pane.
	pub filter_pane_visible: bool,
	/// Whether the viewer shows the page-navigation pane.
	pub page_navigation_visible: bool,
	/// Whether the viewer shows the status bar.
	pub status_bar_visible: bool,
}
impl Default for ReportSettings {
	fn default() -> Self {
		Self { filter_pane_visible: false, page_navigation_visible: true, status_bar_visible: false }
	}
}

/// The payload returned to the client: everything the viewer needs to render
/// one report, nothing the broker needs to keep secret.
///
/// `expiration` always reflects the upstream-issued expiry—the client relies
/// on it to schedule proactive refresh.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedConfiguration {
	/// Embed kind; always `report`.
	#[serde(rename = "type")]
	pub kind: &'static str,
	/// Report id.
	pub id: String,
	/// URL the viewer embeds.
	pub embed_url: String,
	/// The embed token value.
	pub access_token: String,
	/// Token identifier issued alongside the embed token.
	pub token_id: String,
	/// Upstream-issued expiry instant.
	#[serde(with = "time::serde::rfc3339")]
	pub expiration: OffsetDateTime,
	/// Viewer display settings.
	pub settings: ReportSettings,
}
impl EmbedConfiguration {
	fn from_parts(
		descriptor: ReportDescriptor,
		embed_token: EmbedToken,
		settings: ReportSettings,
	) -> Self {
		Self {
			kind: "report",
			id: descriptor.id,
			embed_url: descriptor.embed_url,
			access_token: embed_token.token,
			token_id: embed_token.token_id,
			expiration: embed_token.expiration,
			settings,
		}
	}
}
impl Debug for EmbedConfiguration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EmbedConfiguration")
			.field("id", &self.id)
			.field("embed_url", &self.embed_url)
			.field("access_token", &"<redacted>")
			.field("token_id", &self.token_id)
			.field("expiration", &self.expiration)
			.field("settings", &self.settings)
			.finish()
	}
}

/// Runs the metadata fetch and the embed-token mint concurrently and merges
/// the results into one [`EmbedConfiguration`].
#[derive(Clone, Debug)]
pub struct EmbedConfigAssembler {
	api: PowerBiApi,
	settings: ReportSettings,
}
impl EmbedConfigAssembler {
	/// Creates an assembler with the default display settings.
	pub fn new(api: PowerBiApi) -> Self {
		Self { api, settings: ReportSettings::default() }
	}

	/// Overrides the display settings attached to every configuration.
	pub fn with_settings(mut self, settings: ReportSettings) -> Self {
		self.settings = settings;

		self
	}

	/// Assembles the embed configuration for one report.
	///
	/// Both sub-calls require only the access token, so they run concurrently;
	/// whichever fails first aborts the assembly with that sub-call's error.
	pub async fn assemble(
		&self,
		access_token: &AccessToken,
		workspace_id: &str,
		report_id: &str,
		identity: Option<&UserIdentity>,
	) -> Result<EmbedConfiguration> {
		const KIND: StageKind = StageKind::Assemble;

		let span = StageSpan::new(KIND);

		obs::record_stage_outcome(KIND, StageOutcome::Attempt);

		let result = span
			.instrument(async move {
				let (descriptor, embed_token) = futures::try_join!(
					self.api.fetch_report(access_token, workspace_id, report_id),
					self.api.mint_embed_token(access_token, workspace_id, report_id, identity),
				)?;

				Ok(EmbedConfiguration::from_parts(descriptor, embed_token, self.settings))
			})
			.await;

		match &result {
			Ok(_) => obs::record_stage_outcome(KIND, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(KIND, StageOutcome::Failure),
		}

		result
	}
}
