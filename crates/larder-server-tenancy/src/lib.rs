// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant resolution and permission gating.
//!
//! - [`TenantResolver`] maps a provider organization to the local tenant,
//!   creating it on first verified access
//! - [`RoleResolver`] derives the caller's [`Role`] from provider membership
//! - [`PermissionGate`] combines the two into a single allow/deny check
//! - [`OrganizationSync`] applies provider webhook events to the store
//! - [`Tenancy`] is the handler-facing entry point over all of the above
//!
//! [`Role`]: larder_tenancy_core::Role

pub mod error;
pub mod gate;
pub mod resolver;
pub mod roles;
pub mod service;
pub mod sync;

mod provider_call;

pub use error::TenancyError;
pub use gate::PermissionGate;
pub use resolver::TenantResolver;
pub use roles::{MembershipLookup, RoleResolver};
pub use service::{AuthorizedTenant, Tenancy};
pub use sync::{OrganizationSync, SyncOutcome};
