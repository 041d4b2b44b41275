//! Consumer-side extension contracts.

pub mod refresh_lease;

pub use refresh_lease::*;
