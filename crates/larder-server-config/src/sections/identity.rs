// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider settings.
//!
//! The API secret key and the webhook signing secret are never read from the
//! TOML file. They come from `LARDER_SERVER_IDENTITY_SECRET_KEY` and
//! `LARDER_SERVER_IDENTITY_WEBHOOK_SECRET` (or their `_FILE` variants).

use std::time::Duration;

use larder_common_config::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_IDENTITY_API_URL: &str = "https://api.clerk.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "larder_session";

pub(crate) const SECRET_KEY_VAR: &str = "LARDER_SERVER_IDENTITY_SECRET_KEY";
pub(crate) const WEBHOOK_SECRET_VAR: &str = "LARDER_SERVER_IDENTITY_WEBHOOK_SECRET";

#[derive(Debug, Clone)]
pub struct IdentityConfig {
	pub api_url: String,
	pub secret_key: Option<SecretString>,
	pub webhook_secret: Option<SecretString>,
	/// Upper bound on every provider call.
	pub request_timeout: Duration,
	pub session_cookie_name: String,
}

impl IdentityConfig {
	pub fn require_secret_key(&self) -> Result<&SecretString, ConfigError> {
		self
			.secret_key
			.as_ref()
			.ok_or_else(|| ConfigError::MissingEnvVar(SECRET_KEY_VAR.to_string()))
	}

	pub fn require_webhook_secret(&self) -> Result<&SecretString, ConfigError> {
		self
			.webhook_secret
			.as_ref()
			.ok_or_else(|| ConfigError::MissingEnvVar(WEBHOOK_SECRET_VAR.to_string()))
	}
}

impl Default for IdentityConfig {
	fn default() -> Self {
		IdentityConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfigLayer {
	#[serde(default)]
	pub api_url: Option<String>,
	#[serde(skip)]
	pub secret_key: Option<SecretString>,
	#[serde(skip)]
	pub webhook_secret: Option<SecretString>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	#[serde(default)]
	pub session_cookie_name: Option<String>,
}

impl IdentityConfigLayer {
	pub fn merge(&mut self, other: IdentityConfigLayer) {
		if other.api_url.is_some() {
			self.api_url = other.api_url;
		}
		if other.secret_key.is_some() {
			self.secret_key = other.secret_key;
		}
		if other.webhook_secret.is_some() {
			self.webhook_secret = other.webhook_secret;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.session_cookie_name.is_some() {
			self.session_cookie_name = other.session_cookie_name;
		}
	}

	pub fn finalize(self) -> IdentityConfig {
		IdentityConfig {
			api_url: self
				.api_url
				.unwrap_or_else(|| DEFAULT_IDENTITY_API_URL.to_string()),
			secret_key: self.secret_key.filter(|s| !s.is_blank()),
			webhook_secret: self.webhook_secret.filter(|s| !s.is_blank()),
			request_timeout: Duration::from_secs(
				self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
			),
			session_cookie_name: self
				.session_cookie_name
				.unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_string()),
		}
	}
}
