//! Token-refresh contracts that keep a running report viewer supplied with a
//! live embed token.
//!
//! The viewer owns an explicit, cancellable timer scheduled from the embed
//! token's upstream-issued expiration via [`RefreshSchedule`]; when it fires,
//! the refresh loop calls [`TokenRefreshSource::refresh`] to re-invoke the
//! broker and swaps the fresh token into the viewer without a full reload.
//! Cancellation is simply the viewer dropping its timer—no ambient event bus
//! is involved.

// self
use crate::{_prelude::*, flows::EmbedConfiguration};

/// Boxed future returned by [`TokenRefreshSource::refresh`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = Result<EmbedConfiguration>> + 'a + Send>>;

/// Contract the refresh loop uses to obtain a fresh embed configuration.
///
/// Implementations wrap however the consumer reaches the broker endpoint
/// (direct call, HTTP round-trip) together with the caller's still-valid
/// session credential; re-invocation is always safe and yields a fresh
/// configuration.
pub trait TokenRefreshSource: Send + Sync {
	/// Requests a fresh embed configuration for the running viewer.
	fn refresh(&self) -> RefreshFuture<'_>;
}

/// Policy deciding when the viewer should refresh, relative to the token's
/// expiration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshSchedule {
	/// How long before expiry the refresh fires.
	pub safety_margin: Duration,
}
impl RefreshSchedule {
	/// Default lead time before expiry.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::minutes(2);

	/// Creates a schedule with an explicit safety margin.
	pub fn new(safety_margin: Duration) -> Self {
		Self { safety_margin }
	}

	/// Plans the next refresh for a token expiring at `expiration`.
	pub fn plan(&self, expiration: OffsetDateTime, now: OffsetDateTime) -> RefreshState {
		let fire_in = expiration - self.safety_margin - now;

		if fire_in.is_positive() { RefreshState::Scheduled { fire_in } } else { RefreshState::Due }
	}
}
impl Default for RefreshSchedule {
	fn default() -> Self {
		Self::new(Self::DEFAULT_SAFETY_MARGIN)
	}
}

/// Result of planning the next refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshState {
	/// The token is already inside the safety margin; refresh immediately.
	Due,
	/// Refresh after the given delay.
	Scheduled {
		/// Delay until the refresh should fire.
		fire_in: Duration,
	},
}
