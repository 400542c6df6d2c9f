// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Applies provider organization events to the tenant store.
//!
//! Every event is idempotent: replaying a created or updated event converges
//! on the same row, and deleting a tenant that is already gone succeeds.

use std::sync::Arc;

use larder_server_db::TenantStore;
use larder_server_identity::OrganizationEvent;
use larder_tenancy_core::Tenant;

use crate::error::TenancyError;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
	Upserted(Tenant),
	/// `existed` is false when the tenant had already been removed.
	Deleted {
		existed: bool,
	},
	Ignored,
}

#[derive(Clone)]
pub struct OrganizationSync {
	store: Arc<dyn TenantStore>,
}

impl OrganizationSync {
	pub fn new(store: Arc<dyn TenantStore>) -> Self {
		Self { store }
	}

	#[tracing::instrument(skip_all, fields(event_type = %event.event_type()))]
	pub async fn apply(&self, event: &OrganizationEvent) -> Result<SyncOutcome, TenancyError> {
		match event {
			OrganizationEvent::Created(org) | OrganizationEvent::Updated(org) => {
				let tenant = self.store.upsert_by_external_org_id(&org.id, &org.name).await?;
				tracing::info!(tenant_id = %tenant.id, org_id = %org.id, "tenant synced from provider");
				Ok(SyncOutcome::Upserted(tenant))
			}
			OrganizationEvent::Deleted { id } => {
				let existed = self.store.delete_by_external_org_id(id).await?;
				if existed {
					tracing::info!(org_id = %id, "tenant deleted with owned records");
				} else {
					tracing::debug!(org_id = %id, "delete for unknown tenant");
				}
				Ok(SyncOutcome::Deleted { existed })
			}
			OrganizationEvent::Ignored { event_type } => {
				tracing::debug!(event_type = %event_type, "ignoring provider event");
				Ok(SyncOutcome::Ignored)
			}
		}
	}
}
