//! Local verification of the caller's bearer session token.
//!
//! The broker commits to exactly one verification strategy: HS256 over the
//! identity provider's shared signing secret, interpreted as the secret's raw
//! UTF-8 bytes with no base64 pre-decoding. A misconfigured key therefore
//! fails every request loudly instead of being masked by fallback decodings.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use crate::{_prelude::*, auth::{Secret, UserIdentity}, error::AuthError};

/// Extracts the bearer token from an `Authorization` header value.
///
/// Rejects missing and malformed headers before any downstream call is made.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
	let header = header.ok_or(AuthError::MissingAuthorization)?;
	let token = header.strip_prefix("Bearer ").ok_or(AuthError::MalformedAuthorization)?.trim();

	if token.is_empty() {
		return Err(AuthError::MalformedAuthorization);
	}

	Ok(token)
}

#[derive(Deserialize)]
struct SessionClaims {
	sub: String,
	email: String,
}

/// Verifies signed session tokens and extracts the caller's identity.
///
/// Holds the provider's signing key for the process lifetime; the key is
/// redacted from the `Debug` form.
#[derive(Clone)]
pub struct SessionVerifier {
	key: DecodingKey,
	validation: Validation,
}
impl SessionVerifier {
	/// Builds a verifier from the shared signing secret.
	///
	/// # Key Encoding
	///
	/// The secret's exact UTF-8 bytes are used as the HMAC key. The secret is
	/// never base64-decoded or otherwise reinterpreted, so the value must
	/// match the identity provider's signing configuration byte for byte.
	pub fn new(signing_key: &Secret) -> Self {
		let key = DecodingKey::from_secret(signing_key.expose().as_bytes());
		let validation = Validation::new(Algorithm::HS256);

		Self { key, validation }
	}

	/// Verifies the bearer token and returns the caller's identity.
	///
	/// The client-facing failure is always the generic
	/// [`AuthError::InvalidSession`]; the verification detail is logged
	/// server-side only.
	pub fn verify(&self, token: &str) -> Result<UserIdentity, AuthError> {
		let data = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)
			.map_err(|source| {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %source, "Session token failed verification.");
				#[cfg(not(feature = "tracing"))]
				let _ = source;

				AuthError::InvalidSession
			})?;

		UserIdentity::new(data.claims.sub, data.claims.email).map_err(|source| {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %source, "Session token carried an unusable identity.");
			#[cfg(not(feature = "tracing"))]
			let _ = source;

			AuthError::InvalidSession
		})
	}
}
impl Debug for SessionVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionVerifier").field("key", &"<redacted>").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::{EncodingKey, Header};
	// self
	use super::*;

	#[derive(Serialize)]
	struct TestClaims {
		sub: &'static str,
		email: &'static str,
		exp: i64,
	}

	fn sign(secret: &str, claims: &TestClaims) -> String {
		jsonwebtoken::encode(
			&Header::new(Algorithm::HS256),
			claims,
			&EncodingKey::from_secret(secret.as_bytes()),
		)
		.expect("Test token should sign successfully.")
	}

	fn future_exp() -> i64 {
		(OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp()
	}

	#[test]
	fn bearer_extraction_rejects_missing_and_malformed_headers() {
		assert!(matches!(bearer_token(None), Err(AuthError::MissingAuthorization)));
		assert!(matches!(bearer_token(Some("Basic abc")), Err(AuthError::MalformedAuthorization)));
		assert!(matches!(bearer_token(Some("Bearer ")), Err(AuthError::MalformedAuthorization)));
		assert_eq!(
			bearer_token(Some("Bearer session-token")).expect("Bearer header should parse."),
			"session-token",
		);
	}

	#[test]
	fn verify_accepts_a_correctly_signed_session() {
		let verifier = SessionVerifier::new(&Secret::new("signing-key"));
		let token =
			sign("signing-key", &TestClaims { sub: "user-1", email: "u@x.io", exp: future_exp() });
		let identity = verifier.verify(&token).expect("Valid session should verify.");

		assert_eq!(identity.user_id, "user-1");
		assert_eq!(identity.email, "u@x.io");
	}

	#[test]
	fn verify_rejects_wrong_key_and_expired_sessions() {
		let verifier = SessionVerifier::new(&Secret::new("signing-key"));
		let forged =
			sign("other-key", &TestClaims { sub: "user-1", email: "u@x.io", exp: future_exp() });

		assert!(matches!(verifier.verify(&forged), Err(AuthError::InvalidSession)));

		let expired_at = (OffsetDateTime::now_utc() - Duration::hours(2)).unix_timestamp();
		let expired = sign(
			"signing-key",
			&TestClaims { sub: "user-1", email: "u@x.io", exp: expired_at },
		);

		assert!(matches!(verifier.verify(&expired), Err(AuthError::InvalidSession)));
	}

	#[test]
	fn verify_rejects_empty_subject() {
		let verifier = SessionVerifier::new(&Secret::new("signing-key"));
		let token = sign("signing-key", &TestClaims { sub: "", email: "u@x.io", exp: future_exp() });

		assert!(matches!(verifier.verify(&token), Err(AuthError::InvalidSession)));
	}
}
