// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

/// Errors returned by an [`IdentityProvider`](crate::IdentityProvider).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
	#[error("HTTP request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("rate limited by identity provider")]
	RateLimited,

	#[error("identity provider rejected the backend credentials")]
	Unauthorized,

	#[error("identity provider error ({status}): {message}")]
	Api { status: u16, message: String },

	#[error("failed to parse response: {0}")]
	ParseError(String),

	#[error("identity provider did not answer within {0:?}")]
	Timeout(Duration),

	#[error("session is not active")]
	InactiveSession,

	#[error("identity provider unavailable: {0}")]
	Unavailable(String),
}

impl ProviderError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, ProviderError::NotFound(_))
	}

	/// Failures where the provider could not give an answer at all, as opposed
	/// to answering "no".
	pub fn is_unavailable(&self) -> bool {
		match self {
			ProviderError::HttpRequest(_)
			| ProviderError::RateLimited
			| ProviderError::Timeout(_)
			| ProviderError::Unavailable(_)
			| ProviderError::Unauthorized
			| ProviderError::ParseError(_) => true,
			ProviderError::Api { status, .. } => *status >= 500,
			ProviderError::NotFound(_) | ProviderError::InactiveSession => false,
		}
	}
}
