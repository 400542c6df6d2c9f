// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use larder_tenancy_core::{can, Denial, ExternalOrgId, Permission, Role, UserId};

use crate::roles::{MembershipLookup, RoleResolver};

/// Allow/deny check for one permission in one organization.
#[derive(Clone)]
pub struct PermissionGate {
	roles: RoleResolver,
}

impl PermissionGate {
	pub fn new(roles: RoleResolver) -> Self {
		Self { roles }
	}

	pub fn roles(&self) -> &RoleResolver {
		&self.roles
	}

	/// `Ok` carries the resolved role and means the caller may proceed.
	///
	/// The role falls back to staff when the provider cannot answer, so a
	/// provider outage can only ever deny.
	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id, permission = %permission))]
	pub async fn require_permission(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
		permission: Permission,
	) -> Result<Role, Denial> {
		let lookup = self.roles.lookup_membership(user_id, org_id).await;
		self.require_permission_for(lookup, permission)
	}

	/// [`PermissionGate::require_permission`] on a membership the caller has
	/// already looked up.
	pub fn require_permission_for(
		&self,
		lookup: MembershipLookup,
		permission: Permission,
	) -> Result<Role, Denial> {
		Self::check(lookup.role_or_staff(), permission)
	}

	/// Decide against an already-resolved role.
	pub fn check(role: Role, permission: Permission) -> Result<Role, Denial> {
		if can(role, permission) {
			Ok(role)
		} else {
			tracing::info!(role = %role, permission = %permission, "permission denied");
			Err(Denial::new(permission, role))
		}
	}
}
