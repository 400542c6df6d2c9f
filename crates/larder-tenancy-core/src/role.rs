// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Member roles and how they are derived from provider membership data.
//!
//! The provider only knows two privilege tiers. The middle `manager` tier is
//! carried as a tag in the membership's public metadata. The admin tier always
//! wins over the tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider role string for the organization admin tier.
pub const PROVIDER_ADMIN_ROLE: &str = "org:admin";
/// Provider role string for ordinary members.
pub const PROVIDER_MEMBER_ROLE: &str = "org:member";
/// Metadata key holding the auxiliary role tag.
pub const ROLE_TAG_KEY: &str = "role";

/// Privilege tier as reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeLevel {
	Admin,
	Member,
}

impl PrivilegeLevel {
	/// Anything other than the admin role string is treated as a plain member.
	pub fn from_provider_role(role: &str) -> Self {
		if role == PROVIDER_ADMIN_ROLE {
			PrivilegeLevel::Admin
		} else {
			PrivilegeLevel::Member
		}
	}

	pub fn as_provider_role(&self) -> &'static str {
		match self {
			PrivilegeLevel::Admin => PROVIDER_ADMIN_ROLE,
			PrivilegeLevel::Member => PROVIDER_MEMBER_ROLE,
		}
	}
}

/// A member's role within a tenant.
///
/// Variants are declared in ascending order of privilege, so `Ord` follows
/// the hierarchy: `Staff < Manager < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	Staff,
	Manager,
	Admin,
}

impl Role {
	pub fn all() -> &'static [Role] {
		&[Role::Staff, Role::Manager, Role::Admin]
	}

	/// Returns true if this role has at least the permissions of the given role.
	pub fn has_permission_of(&self, other: &Role) -> bool {
		self >= other
	}

	/// Precedence rule: admin tier first, then a `manager` tag, else staff.
	///
	/// Unknown tags (including an `admin` tag without the admin tier) give
	/// `Staff`.
	pub fn from_membership(privilege: PrivilegeLevel, tag: Option<&str>) -> Role {
		if privilege == PrivilegeLevel::Admin {
			return Role::Admin;
		}
		match tag.map(str::trim) {
			Some(t) if t.eq_ignore_ascii_case("manager") => Role::Manager,
			_ => Role::Staff,
		}
	}

	/// Provider tier and metadata tag that encode this role.
	pub fn provider_assignment(&self) -> (PrivilegeLevel, Option<&'static str>) {
		match self {
			Role::Admin => (PrivilegeLevel::Admin, None),
			Role::Manager => (PrivilegeLevel::Member, Some("manager")),
			Role::Staff => (PrivilegeLevel::Member, Some("staff")),
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Staff => "staff",
			Role::Manager => "manager",
			Role::Admin => "admin",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
	type Err = ParseRoleError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Role::all()
			.iter()
			.copied()
			.find(|r| r.as_str() == s)
			.ok_or_else(|| ParseRoleError(s.to_string()))
	}
}
