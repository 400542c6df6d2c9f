// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission evaluation.
//!
//! [`can`] is a pure lookup into the static table defined by
//! [`Permission::minimum_role`]. Request handlers go through the gate in
//! `larder-server-tenancy`, which resolves the caller's role first and turns a
//! refusal into a [`Denial`].

use serde::Serialize;
use tracing::instrument;

use crate::{Permission, Role};

/// Whether `role` may perform `permission`. Total and side-effect free.
#[instrument(level = "debug", ret)]
pub fn can(role: Role, permission: Permission) -> bool {
	role.has_permission_of(&permission.minimum_role())
}

/// Every permission `role` holds, in table order. Used by clients to decide
/// what to render.
pub fn permissions_for(role: Role) -> Vec<Permission> {
	Permission::all()
		.iter()
		.copied()
		.filter(|p| role.has_permission_of(&p.minimum_role()))
		.collect()
}

/// A refused permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("role {role} does not have permission {permission}")]
pub struct Denial {
	pub permission: Permission,
	pub role: Role,
}

impl Denial {
	/// Stable machine-readable code for this refusal.
	pub const CODE: &'static str = "permission_denied";

	pub fn new(permission: Permission, role: Role) -> Self {
		Self { permission, role }
	}

	/// Client-facing message. Names the permission, not the caller's role.
	pub fn message(&self) -> String {
		format!("missing permission: {}", self.permission)
	}
}
