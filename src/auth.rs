//! Caller-authentication domain: redacted secrets, user identity, and session
//! verification.

pub mod identity;
pub mod secret;
pub mod session;

pub use identity::*;
pub use secret::*;
pub use session::*;
