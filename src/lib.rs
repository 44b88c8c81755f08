//! Cookie-credentialed HTTP client for the donation portal's admin API: transparent single-flight
//! session refresh, request queuing while the refresh runs, at-most-once replay, and a login
//! redirect hook for sessions that cannot be recovered.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod navigation;
pub mod obs;
pub mod request;
pub mod session;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::OnceCell as AsyncOnceCell;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use client::AuthenticatedClient;
#[cfg(feature = "reqwest")] pub use client::ReqwestAuthenticatedClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use request::{ApiRequest, ApiResponse, Method};

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
