// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod database;
mod http;
pub(crate) mod identity;
mod logging;

pub use database::{DatabaseConfig, DatabaseConfigLayer, DEFAULT_DATABASE_URL};
pub use http::{HttpConfig, HttpConfigLayer};
pub use identity::{
	IdentityConfig, IdentityConfigLayer, DEFAULT_IDENTITY_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
	DEFAULT_SESSION_COOKIE_NAME,
};
pub use logging::{LoggingConfig, LoggingConfigLayer};
