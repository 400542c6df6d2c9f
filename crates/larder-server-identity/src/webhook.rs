// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Signature verification for provider webhook deliveries.
//!
//! Deliveries are signed Svix-style. The signed content is
//! `"{svix-id}.{svix-timestamp}.{body}"`, the MAC is HMAC-SHA256 keyed with the
//! base64 part of the `whsec_` secret, and `svix-signature` carries one or more
//! space-separated `v1,<base64>` entries. Any matching entry accepts the
//! delivery.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::HeaderMap;
use larder_common_config::{Secret, SecretString};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Deliveries whose timestamp is further than this from now are rejected.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
	#[error("missing header: {0}")]
	MissingHeader(&'static str),

	#[error("invalid webhook secret: {0}")]
	InvalidSecret(String),

	#[error("invalid timestamp header")]
	InvalidTimestamp,

	#[error("timestamp outside tolerance")]
	TimestampOutOfTolerance,

	#[error("no matching signature")]
	SignatureMismatch,

	#[error("invalid payload: {0}")]
	InvalidPayload(String),
}

/// The three signing headers of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookHeaders {
	pub id: String,
	pub timestamp: String,
	pub signature: String,
}

impl WebhookHeaders {
	pub fn from_header_map(headers: &HeaderMap) -> Result<Self, WebhookError> {
		let get = |name: &'static str| {
			headers
				.get(name)
				.and_then(|v| v.to_str().ok())
				.map(str::to_string)
				.ok_or(WebhookError::MissingHeader(name))
		};

		Ok(Self {
			id: get(HEADER_ID)?,
			timestamp: get(HEADER_TIMESTAMP)?,
			signature: get(HEADER_SIGNATURE)?,
		})
	}
}

pub struct WebhookVerifier {
	key: Secret<Vec<u8>>,
	tolerance: Duration,
}

impl std::fmt::Debug for WebhookVerifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WebhookVerifier")
			.field("key", &self.key)
			.field("tolerance", &self.tolerance)
			.finish()
	}
}

impl WebhookVerifier {
	/// Build a verifier from a `whsec_<base64>` secret. The prefix is optional.
	pub fn new(secret: &SecretString) -> Result<Self, WebhookError> {
		let raw = secret.expose().trim();
		let encoded = raw.strip_prefix(SECRET_PREFIX).unwrap_or(raw);
		if encoded.is_empty() {
			return Err(WebhookError::InvalidSecret("secret is empty".to_string()));
		}

		let key = STANDARD
			.decode(encoded)
			.map_err(|e| WebhookError::InvalidSecret(format!("not base64: {e}")))?;

		Ok(Self {
			key: Secret::new(key),
			tolerance: DEFAULT_TOLERANCE,
		})
	}

	pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
		self.tolerance = tolerance;
		self
	}

	fn mac_for(&self, id: &str, timestamp: &str, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
		let mut mac = HmacSha256::new_from_slice(self.key.expose())
			.map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
		mac.update(id.as_bytes());
		mac.update(b".");
		mac.update(timestamp.as_bytes());
		mac.update(b".");
		mac.update(payload);
		Ok(mac)
	}

	/// Produce a `v1,<base64>` signature entry for a payload.
	pub fn sign(&self, id: &str, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
		let mac = self.mac_for(id, &timestamp.to_string(), payload)?;
		Ok(format!(
			"{SIGNATURE_VERSION},{}",
			STANDARD.encode(mac.finalize().into_bytes())
		))
	}

	/// Check a delivery against its signing headers.
	#[tracing::instrument(level = "debug", skip_all, fields(webhook_id = %headers.id))]
	pub fn verify(
		&self,
		headers: &WebhookHeaders,
		payload: &[u8],
		now: DateTime<Utc>,
	) -> Result<(), WebhookError> {
		let sent_at: i64 = headers
			.timestamp
			.trim()
			.parse()
			.map_err(|_| WebhookError::InvalidTimestamp)?;

		let skew = now
			.timestamp()
			.checked_sub(sent_at)
			.map(i64::unsigned_abs)
			.ok_or(WebhookError::TimestampOutOfTolerance)?;
		if skew > self.tolerance.as_secs() {
			return Err(WebhookError::TimestampOutOfTolerance);
		}

		for entry in headers.signature.split_whitespace() {
			let Some((version, encoded)) = entry.split_once(',') else {
				continue;
			};
			if version != SIGNATURE_VERSION {
				continue;
			}
			let Ok(candidate) = STANDARD.decode(encoded) else {
				continue;
			};

			let mac = self.mac_for(&headers.id, headers.timestamp.trim(), payload)?;
			if mac.verify_slice(&candidate).is_ok() {
				return Ok(());
			}
		}

		Err(WebhookError::SignatureMismatch)
	}
}
