// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The provider-facing trait and the data it returns.

use async_trait::async_trait;
use larder_tenancy_core::{ExternalOrgId, PrivilegeLevel, Role, SessionContext, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// An organization as the provider knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOrganization {
	pub id: ExternalOrgId,
	pub name: String,
}

/// One user's membership in one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMembership {
	pub organization_id: ExternalOrgId,
	pub organization_name: String,
	pub privilege: PrivilegeLevel,
	/// The `role` entry of the membership's public metadata, if it is a string.
	pub role_tag: Option<String>,
}

impl ProviderMembership {
	pub fn role(&self) -> Role {
		Role::from_membership(self.privilege, self.role_tag.as_deref())
	}
}

/// A pending invitation created at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInvitation {
	pub id: String,
	pub email_address: String,
	pub status: String,
}

/// Queries and mutations Larder needs from the hosted identity provider.
///
/// Implementations report "the provider answered no" as
/// [`ProviderError::NotFound`] and everything else as an error the caller can
/// classify with [`ProviderError::is_unavailable`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Validate a session token and return who it belongs to and which
	/// organization it is bound to.
	async fn get_session_context(&self, session_token: &str) -> Result<SessionContext, ProviderError>;

	async fn get_organization(
		&self,
		org_id: &ExternalOrgId,
	) -> Result<ProviderOrganization, ProviderError>;

	async fn list_user_memberships(
		&self,
		user_id: &UserId,
	) -> Result<Vec<ProviderMembership>, ProviderError>;

	/// The user's membership in one organization, or `NotFound`.
	async fn get_membership(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
	) -> Result<ProviderMembership, ProviderError>;

	/// Create an organization with `created_by` as its first admin.
	async fn create_organization(
		&self,
		name: &str,
		created_by: &UserId,
	) -> Result<ProviderOrganization, ProviderError>;

	/// Set both the privilege tier and the role tag that encode `role`.
	async fn update_membership_role(
		&self,
		org_id: &ExternalOrgId,
		user_id: &UserId,
		role: Role,
	) -> Result<ProviderMembership, ProviderError>;

	async fn create_invitation(
		&self,
		org_id: &ExternalOrgId,
		email_address: &str,
		inviter: &UserId,
		role: Role,
	) -> Result<ProviderInvitation, ProviderError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn membership(privilege: PrivilegeLevel, tag: Option<&str>) -> ProviderMembership {
		ProviderMembership {
			organization_id: ExternalOrgId::new("org_1"),
			organization_name: "Acme".to_string(),
			privilege,
			role_tag: tag.map(str::to_string),
		}
	}

	#[test]
	fn role_uses_precedence_rule() {
		assert_eq!(membership(PrivilegeLevel::Admin, Some("staff")).role(), Role::Admin);
		assert_eq!(membership(PrivilegeLevel::Member, Some("manager")).role(), Role::Manager);
		assert_eq!(membership(PrivilegeLevel::Member, None).role(), Role::Staff);
	}
}
