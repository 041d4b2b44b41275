//! Optional observability helpers for the brokering pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `embed_broker.stage`
//!   with the `stage` (pipeline step) field.
//! - Enable `metrics` to increment the `embed_broker_stage_total` counter for
//!   every attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
	/// Caller session-token verification.
	SessionVerify,
	/// Service-principal client-credentials grant.
	ServicePrincipalGrant,
	/// Report metadata fetch.
	ReportMetadata,
	/// Embed-token mint.
	EmbedTokenMint,
	/// Concurrent assembly of the embed configuration.
	Assemble,
}
impl StageKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageKind::SessionVerify => "session_verify",
			StageKind::ServicePrincipalGrant => "service_principal_grant",
			StageKind::ReportMetadata => "report_metadata",
			StageKind::EmbedTokenMint => "embed_token_mint",
			StageKind::Assemble => "assemble",
		}
	}
}
impl Display for StageKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a pipeline stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
