// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for Larder tenants.
//!
//! The `tenants` table is the only place the mapping from a provider
//! organization to a local tenant lives. Its unique constraint on
//! `external_org_id` is what makes concurrent lazy creation converge on one
//! row.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod tenant;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use pool::{create_pool, health_check};
pub use tenant::{OwnedRecordCounts, TenantRepository, TenantStore};
