// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role resolution from provider membership.

use std::sync::Arc;
use std::time::Duration;

use larder_server_identity::IdentityProvider;
use larder_tenancy_core::{ExternalOrgId, Role, UserId};

use crate::provider_call::bounded;

/// Outcome of asking the provider about one membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipLookup {
	Member(Role),
	NotMember,
	/// The provider could not answer (down, slow, rate limited).
	Unavailable,
}

impl MembershipLookup {
	/// Role to judge permissions against. Anything short of a confirmed
	/// membership is staff.
	pub fn role_or_staff(self) -> Role {
		match self {
			MembershipLookup::Member(role) => role,
			MembershipLookup::NotMember | MembershipLookup::Unavailable => Role::Staff,
		}
	}
}

#[derive(Clone)]
pub struct RoleResolver {
	provider: Arc<dyn IdentityProvider>,
	provider_timeout: Duration,
}

impl RoleResolver {
	pub fn new(provider: Arc<dyn IdentityProvider>, provider_timeout: Duration) -> Self {
		Self {
			provider,
			provider_timeout,
		}
	}

	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id))]
	pub async fn lookup_membership(&self, user_id: &UserId, org_id: &ExternalOrgId) -> MembershipLookup {
		match bounded(self.provider_timeout, self.provider.get_membership(user_id, org_id)).await {
			Ok(membership) => MembershipLookup::Member(membership.role()),
			Err(e) if e.is_not_found() => MembershipLookup::NotMember,
			Err(e) => {
				tracing::warn!(error = %e, "identity provider unavailable during role resolution");
				MembershipLookup::Unavailable
			}
		}
	}

	/// The caller's role in the organization.
	///
	/// Non-members and provider failures resolve to [`Role::Staff`], the least
	/// privileged role.
	pub async fn resolve_role(&self, user_id: &UserId, org_id: &ExternalOrgId) -> Role {
		self.lookup_membership(user_id, org_id).await.role_or_staff()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use larder_server_identity::testing::MockIdentityProvider;
	use larder_tenancy_core::PrivilegeLevel;

	fn resolver(provider: &Arc<MockIdentityProvider>) -> RoleResolver {
		RoleResolver::new(provider.clone(), Duration::from_millis(250))
	}

	#[tokio::test]
	async fn admin_tier_wins_over_staff_tag() {
		let provider = Arc::new(MockIdentityProvider::new());
		provider.add_membership("user_1", "org_1", PrivilegeLevel::Admin, Some("staff"));

		let role = resolver(&provider)
			.resolve_role(&UserId::new("user_1"), &ExternalOrgId::new("org_1"))
			.await;
		assert_eq!(role, Role::Admin);
	}

	#[tokio::test]
	async fn manager_tag_on_member() {
		let provider = Arc::new(MockIdentityProvider::new());
		provider.add_membership("user_1", "org_1", PrivilegeLevel::Member, Some("manager"));

		let role = resolver(&provider)
			.resolve_role(&UserId::new("user_1"), &ExternalOrgId::new("org_1"))
			.await;
		assert_eq!(role, Role::Manager);
	}

	#[tokio::test]
	async fn untagged_member_is_staff() {
		let provider = Arc::new(MockIdentityProvider::new());
		provider.add_membership("user_1", "org_1", PrivilegeLevel::Member, None);

		let lookup = resolver(&provider)
			.lookup_membership(&UserId::new("user_1"), &ExternalOrgId::new("org_1"))
			.await;
		assert_eq!(lookup, MembershipLookup::Member(Role::Staff));
	}

	#[tokio::test]
	async fn no_membership_is_staff() {
		let provider = Arc::new(MockIdentityProvider::new());
		let r = resolver(&provider);
		let (user, org) = (UserId::new("user_1"), ExternalOrgId::new("org_1"));

		assert_eq!(r.lookup_membership(&user, &org).await, MembershipLookup::NotMember);
		assert_eq!(r.resolve_role(&user, &org).await, Role::Staff);
	}

	#[tokio::test]
	async fn provider_outage_fails_closed_to_staff() {
		let provider = Arc::new(MockIdentityProvider::new());
		provider.add_member("user_1", "org_1", Role::Admin);
		provider.set_unavailable(true);
		let r = resolver(&provider);
		let (user, org) = (UserId::new("user_1"), ExternalOrgId::new("org_1"));

		assert_eq!(r.lookup_membership(&user, &org).await, MembershipLookup::Unavailable);
		assert_eq!(r.resolve_role(&user, &org).await, Role::Staff);
	}

	#[tokio::test]
	async fn slow_provider_fails_closed_to_staff() {
		let provider = Arc::new(MockIdentityProvider::new());
		provider.add_member("user_1", "org_1", Role::Admin);
		provider.set_delay(Some(Duration::from_secs(2)));

		let role = RoleResolver::new(provider.clone(), Duration::from_millis(20))
			.resolve_role(&UserId::new("user_1"), &ExternalOrgId::new("org_1"))
			.await;
		assert_eq!(role, Role::Staff);
	}
}
