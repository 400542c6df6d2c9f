// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client for a Clerk-style backend API.
//!
//! Every request is authenticated with the backend secret key as a bearer
//! token. The session token a browser presents is treated as the provider's
//! session id and checked with `GET /sessions/{id}`.
//!
//! Status mapping: 404 is [`ProviderError::NotFound`], 429 is
//! [`ProviderError::RateLimited`], 401/403 is [`ProviderError::Unauthorized`],
//! anything else unsuccessful is [`ProviderError::Api`].

use std::time::Duration;

use async_trait::async_trait;
use larder_common_config::SecretString;
use larder_tenancy_core::{
	role::ROLE_TAG_KEY, ExternalOrgId, PrivilegeLevel, Role, SessionContext, UserId,
};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use url::Url;

use crate::error::ProviderError;
use crate::provider::{
	IdentityProvider, ProviderInvitation, ProviderMembership, ProviderOrganization,
};

pub const DEFAULT_API_URL: &str = "https://api.clerk.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!("larder/", env!("CARGO_PKG_VERSION"));
const MEMBERSHIP_PAGE_SIZE: usize = 100;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct ClerkConfig {
	/// Base URL including the version segment, e.g. `https://api.clerk.com/v1`.
	pub api_url: String,
	pub secret_key: SecretString,
	/// Per-request timeout applied by the HTTP client.
	pub timeout: Duration,
}

impl ClerkConfig {
	pub fn new(secret_key: SecretString) -> Self {
		Self {
			api_url: DEFAULT_API_URL.to_string(),
			secret_key,
			timeout: DEFAULT_TIMEOUT,
		}
	}
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct ClerkSession {
	user_id: String,
	status: String,
	#[serde(default)]
	last_active_organization_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClerkOrganization {
	id: String,
	name: String,
}

impl From<ClerkOrganization> for ProviderOrganization {
	fn from(org: ClerkOrganization) -> Self {
		Self {
			id: ExternalOrgId::new(org.id),
			name: org.name,
		}
	}
}

#[derive(Debug, Deserialize)]
struct ClerkMembership {
	role: String,
	#[serde(default)]
	public_metadata: serde_json::Value,
	organization: ClerkOrganization,
}

impl From<ClerkMembership> for ProviderMembership {
	fn from(m: ClerkMembership) -> Self {
		let role_tag = m
			.public_metadata
			.get(ROLE_TAG_KEY)
			.and_then(serde_json::Value::as_str)
			.map(str::to_string);
		Self {
			organization_id: ExternalOrgId::new(m.organization.id),
			organization_name: m.organization.name,
			privilege: PrivilegeLevel::from_provider_role(&m.role),
			role_tag,
		}
	}
}

#[derive(Debug, Deserialize)]
struct ClerkMembershipPage {
	data: Vec<ClerkMembership>,
	#[serde(default)]
	total_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ClerkInvitation {
	id: String,
	email_address: String,
	status: String,
}

#[derive(Debug, Deserialize)]
struct ClerkErrorBody {
	errors: Vec<ClerkErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ClerkErrorEntry {
	message: String,
	#[serde(default)]
	long_message: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

#[derive(Debug, Clone)]
pub struct ClerkClient {
	config: ClerkConfig,
	base_url: Url,
	http_client: reqwest::Client,
}

impl ClerkClient {
	#[tracing::instrument(skip_all, name = "ClerkClient::new", fields(api_url = %config.api_url))]
	pub fn new(config: ClerkConfig) -> Result<Self, ProviderError> {
		let base_url = Url::parse(&config.api_url)
			.map_err(|e| ProviderError::ParseError(format!("invalid api_url: {e}")))?;
		if base_url.cannot_be_a_base() {
			return Err(ProviderError::ParseError(
				"api_url cannot be a base URL".to_string(),
			));
		}

		let http_client = reqwest::Client::builder()
			.user_agent(USER_AGENT)
			.timeout(config.timeout)
			.build()?;

		Ok(Self {
			config,
			base_url,
			http_client,
		})
	}

	fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
		let mut url = self.base_url.clone();
		url
			.path_segments_mut()
			.map_err(|_| ProviderError::ParseError("api_url cannot be a base URL".to_string()))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	async fn send<T: DeserializeOwned>(
		&self,
		request: reqwest::RequestBuilder,
		what: &str,
	) -> Result<T, ProviderError> {
		let response = request
			.bearer_auth(self.config.secret_key.expose())
			.header("Accept", "application/json")
			.send()
			.await?;

		let status = response.status();
		if status.is_success() {
			return response
				.json::<T>()
				.await
				.map_err(|e| ProviderError::ParseError(format!("{what}: {e}")));
		}

		let body = response.text().await.unwrap_or_default();
		let err = error_for_status(status, what, &body);
		tracing::debug!(status = status.as_u16(), error = %err, "identity provider request failed");
		Err(err)
	}
}

fn error_for_status(status: StatusCode, what: &str, body: &str) -> ProviderError {
	match status {
		StatusCode::NOT_FOUND => ProviderError::NotFound(what.to_string()),
		StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
		StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized,
		_ => {
			let message = serde_json::from_str::<ClerkErrorBody>(body)
				.ok()
				.and_then(|b| b.errors.into_iter().next())
				.map(|e| e.long_message.unwrap_or(e.message))
				.unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
			ProviderError::Api {
				status: status.as_u16(),
				message,
			}
		}
	}
}

#[async_trait]
impl IdentityProvider for ClerkClient {
	#[tracing::instrument(skip(self, session_token), name = "ClerkClient::get_session_context")]
	async fn get_session_context(&self, session_token: &str) -> Result<SessionContext, ProviderError> {
		let url = self.endpoint(&["sessions", session_token])?;
		let session: ClerkSession = self.send(self.http_client.get(url), "session").await?;

		if session.status != "active" {
			tracing::debug!(status = %session.status, "session not active");
			return Err(ProviderError::InactiveSession);
		}

		Ok(SessionContext {
			user_id: UserId::new(session.user_id),
			external_org_id: session.last_active_organization_id.map(ExternalOrgId::new),
		})
	}

	#[tracing::instrument(skip_all, fields(org_id = %org_id), name = "ClerkClient::get_organization")]
	async fn get_organization(
		&self,
		org_id: &ExternalOrgId,
	) -> Result<ProviderOrganization, ProviderError> {
		let url = self.endpoint(&["organizations", org_id.as_str()])?;
		let org: ClerkOrganization = self.send(self.http_client.get(url), "organization").await?;
		Ok(org.into())
	}

	#[tracing::instrument(skip_all, fields(user_id = %user_id), name = "ClerkClient::list_user_memberships")]
	async fn list_user_memberships(
		&self,
		user_id: &UserId,
	) -> Result<Vec<ProviderMembership>, ProviderError> {
		let mut memberships = Vec::new();
		let mut offset = 0usize;

		loop {
			let mut url = self.endpoint(&["users", user_id.as_str(), "organization_memberships"])?;
			url
				.query_pairs_mut()
				.append_pair("limit", &MEMBERSHIP_PAGE_SIZE.to_string())
				.append_pair("offset", &offset.to_string());

			let page: ClerkMembershipPage = self
				.send(self.http_client.get(url), "organization memberships")
				.await?;

			let fetched = page.data.len();
			memberships.extend(page.data.into_iter().map(ProviderMembership::from));
			offset += fetched;

			let total = page.total_count.unwrap_or(offset);
			if fetched < MEMBERSHIP_PAGE_SIZE || offset >= total {
				break;
			}
		}

		tracing::debug!(count = memberships.len(), "memberships listed");
		Ok(memberships)
	}

	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id), name = "ClerkClient::get_membership")]
	async fn get_membership(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
	) -> Result<ProviderMembership, ProviderError> {
		let mut url = self.endpoint(&["organizations", org_id.as_str(), "memberships"])?;
		url
			.query_pairs_mut()
			.append_pair("user_id", user_id.as_str())
			.append_pair("limit", "1");

		let page: ClerkMembershipPage = self.send(self.http_client.get(url), "membership").await?;
		page
			.data
			.into_iter()
			.next()
			.map(ProviderMembership::from)
			.ok_or_else(|| ProviderError::NotFound("membership".to_string()))
	}

	#[tracing::instrument(skip_all, fields(created_by = %created_by), name = "ClerkClient::create_organization")]
	async fn create_organization(
		&self,
		name: &str,
		created_by: &UserId,
	) -> Result<ProviderOrganization, ProviderError> {
		let url = self.endpoint(&["organizations"])?;
		let body = json!({ "name": name, "created_by": created_by.as_str() });
		let org: ClerkOrganization = self
			.send(self.http_client.post(url).json(&body), "create organization")
			.await?;
		Ok(org.into())
	}

	#[tracing::instrument(skip_all, fields(org_id = %org_id, user_id = %user_id, role = %role), name = "ClerkClient::update_membership_role")]
	async fn update_membership_role(
		&self,
		org_id: &ExternalOrgId,
		user_id: &UserId,
		role: Role,
	) -> Result<ProviderMembership, ProviderError> {
		let (privilege, tag) = role.provider_assignment();

		let url = self.endpoint(&["organizations", org_id.as_str(), "memberships", user_id.as_str()])?;
		let _: ClerkMembership = self
			.send(
				self.http_client
					.patch(url)
					.json(&json!({ "role": privilege.as_provider_role() })),
				"membership",
			)
			.await?;

		let url = self.endpoint(&[
			"organizations",
			org_id.as_str(),
			"memberships",
			user_id.as_str(),
			"metadata",
		])?;
		let updated: ClerkMembership = self
			.send(
				self.http_client
					.patch(url)
					.json(&json!({ "public_metadata": { ROLE_TAG_KEY: tag } })),
				"membership metadata",
			)
			.await?;

		Ok(updated.into())
	}

	#[tracing::instrument(skip_all, fields(org_id = %org_id, role = %role), name = "ClerkClient::create_invitation")]
	async fn create_invitation(
		&self,
		org_id: &ExternalOrgId,
		email_address: &str,
		inviter: &UserId,
		role: Role,
	) -> Result<ProviderInvitation, ProviderError> {
		let (privilege, tag) = role.provider_assignment();
		let url = self.endpoint(&["organizations", org_id.as_str(), "invitations"])?;
		let body = json!({
			"email_address": email_address,
			"inviter_user_id": inviter.as_str(),
			"role": privilege.as_provider_role(),
			"public_metadata": { ROLE_TAG_KEY: tag },
		});

		let invitation: ClerkInvitation = self
			.send(self.http_client.post(url).json(&body), "invitation")
			.await?;

		Ok(ProviderInvitation {
			id: invitation.id,
			email_address: invitation.email_address,
			status: invitation.status,
		})
	}
}
