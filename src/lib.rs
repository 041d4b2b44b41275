//! Server-side Power BI embed-token broker—authenticate the caller, run the
//! service-principal grant, fetch report metadata and mint the embed token in
//! parallel, and hand the browser a single embed configuration without ever
//! shipping Azure credentials to it.
//!
//! The crate is framework-agnostic: [`endpoint::BrokerEndpoint`] exposes the
//! whole request pipeline as plain request/response types (status code, CORS
//! headers, JSON envelope) that any HTTP router can adapt in a few lines.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod obs;
pub mod powerbi;
pub mod provider;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, tokio as _};
