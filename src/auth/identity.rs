//! Verified end-user identity used for row-level-security binding.

// self
use crate::_prelude::*;

/// Error returned when identity fields fail validation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentityError {
	/// The user id was empty or whitespace.
	#[error("User id cannot be empty.")]
	EmptyUserId,
	/// The email was empty or whitespace.
	#[error("Email cannot be empty.")]
	EmptyEmail,
}

/// Identity of the authenticated caller, derived from a verified session
/// token.
///
/// Used only to populate the row-level-security binding sent to Power BI;
/// the broker never persists it.
#[derive(Clone, PartialEq, Eq)]
pub struct UserIdentity {
	/// Stable user identifier (the session token's `sub` claim).
	pub user_id: String,
	/// Email the identity provider associated with the session.
	pub email: String,
}
impl UserIdentity {
	/// Creates a new identity after validating both fields are non-empty.
	pub fn new(
		user_id: impl Into<String>,
		email: impl Into<String>,
	) -> Result<Self, IdentityError> {
		let user_id = user_id.into();
		let email = email.into();

		if user_id.trim().is_empty() {
			return Err(IdentityError::EmptyUserId);
		}
		if email.trim().is_empty() {
			return Err(IdentityError::EmptyEmail);
		}

		Ok(Self { user_id, email })
	}
}
impl Debug for UserIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserIdentity").field("user_id", &self.user_id).finish_non_exhaustive()
	}
}
