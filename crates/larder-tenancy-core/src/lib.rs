// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core tenancy model for Larder.
//!
//! This crate has no I/O. It defines:
//!
//! - [`Tenant`]: the local record an identity-provider organization maps to
//! - [`Role`]: the three-tier role a member holds within a tenant, and the
//!   precedence rule that derives it from provider membership data
//! - [`Permission`] and [`can`]: the static permission table
//! - [`Denial`]: the structured refusal produced by the permission gate

pub mod gate;
pub mod permission;
pub mod role;
pub mod types;

pub use gate::{can, permissions_for, Denial};
pub use permission::{ParsePermissionError, Permission};
pub use role::{ParseRoleError, PrivilegeLevel, Role};
pub use types::{
	normalize_tenant_name, ExternalOrgId, InvalidSettings, NewTenant, SessionContext, Tenant, TenantId, TenantSettingsUpdate,
	UserId, DEFAULT_SHRINK_PCT, MAX_TENANT_NAME_LEN,
};
