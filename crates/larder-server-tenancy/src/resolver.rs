// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mapping provider organizations to local tenants.
//!
//! A tenant row is created the first time a verified member reaches an
//! organization that has none. The store's unique constraint on
//! `external_org_id` settles concurrent first visits: the loser of the insert
//! race re-reads the winner's row.

use std::sync::Arc;
use std::time::Duration;

use larder_server_db::TenantStore;
use larder_server_identity::{IdentityProvider, ProviderError};
use larder_tenancy_core::{ExternalOrgId, NewTenant, SessionContext, Tenant, UserId};

use crate::error::TenancyError;
use crate::provider_call::bounded;

#[derive(Clone)]
pub struct TenantResolver {
	store: Arc<dyn TenantStore>,
	provider: Arc<dyn IdentityProvider>,
	provider_timeout: Duration,
}

impl TenantResolver {
	pub fn new(
		store: Arc<dyn TenantStore>,
		provider: Arc<dyn IdentityProvider>,
		provider_timeout: Duration,
	) -> Self {
		Self {
			store,
			provider,
			provider_timeout,
		}
	}

	/// The tenant the session is currently bound to.
	///
	/// Trusts the session's organization binding and never creates a row.
	#[tracing::instrument(skip_all, fields(user_id = %session.user_id))]
	pub async fn resolve_for_current_session(
		&self,
		session: &SessionContext,
	) -> Result<Option<Tenant>, TenancyError> {
		let Some(org_id) = &session.external_org_id else {
			return Ok(None);
		};
		Ok(self.store.get_by_external_org_id(org_id).await?)
	}

	/// Return the tenant for `org_id`, creating it if the user is a verified
	/// member and none exists yet.
	///
	/// An existing tenant is returned without asking the provider anything.
	/// Provider failures on the creation path are logged and reported as
	/// [`TenancyError::NoTenantSelected`].
	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id))]
	pub async fn resolve_or_create(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
	) -> Result<Tenant, TenancyError> {
		if let Some(tenant) = self.store.get_by_external_org_id(org_id).await? {
			return Ok(tenant);
		}

		let name = match self.verify_membership(user_id, org_id).await {
			Ok(Some(name)) => name,
			Ok(None) => {
				tracing::info!(user_id = %user_id, org_id = %org_id, "refusing tenant creation for non-member");
				return Err(TenancyError::NotMember);
			}
			Err(e) => {
				tracing::warn!(error = %e, org_id = %org_id, "identity provider unavailable during tenant resolution");
				return Err(TenancyError::NoTenantSelected);
			}
		};

		match self
			.store
			.create(&NewTenant::with_defaults(org_id.clone(), name))
			.await
		{
			Ok(tenant) => {
				tracing::info!(tenant_id = %tenant.id, org_id = %org_id, "tenant created on first access");
				Ok(tenant)
			}
			Err(e) if e.is_conflict() => {
				tracing::debug!(org_id = %org_id, "tenant created concurrently, re-reading");
				match self.store.get_by_external_org_id(org_id).await? {
					Some(tenant) => Ok(tenant),
					None => {
						tracing::warn!(org_id = %org_id, "tenant vanished after creation conflict");
						Err(TenancyError::NoTenantSelected)
					}
				}
			}
			Err(e) => Err(e.into()),
		}
	}

	/// The existing tenant for `org_id`, only if the provider confirms the
	/// user's membership. Never creates. Provider failures give `None`.
	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id))]
	pub async fn resolve_by_id_if_member(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
	) -> Result<Option<Tenant>, TenancyError> {
		match self.verify_membership(user_id, org_id).await {
			Ok(Some(_)) => Ok(self.store.get_by_external_org_id(org_id).await?),
			Ok(None) => Ok(None),
			Err(e) => {
				tracing::warn!(error = %e, org_id = %org_id, "identity provider unavailable during membership check");
				Ok(None)
			}
		}
	}

	/// Insert or rename the tenant for a provider organization.
	#[tracing::instrument(skip_all, fields(org_id = %org_id))]
	pub async fn upsert_from_provider(
		&self,
		org_id: &ExternalOrgId,
		name: &str,
	) -> Result<Tenant, TenancyError> {
		Ok(self.store.upsert_by_external_org_id(org_id, name).await?)
	}

	/// Ask the provider whether `user_id` belongs to `org_id`.
	///
	/// Returns the organization's name for members and `None` for non-members.
	/// The organization and the user's membership list are fetched
	/// concurrently.
	async fn verify_membership(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
	) -> Result<Option<String>, ProviderError> {
		let (organization, memberships) = tokio::join!(
			bounded(self.provider_timeout, self.provider.get_organization(org_id)),
			bounded(
				self.provider_timeout,
				self.provider.list_user_memberships(user_id)
			),
		);

		let memberships = match memberships {
			Ok(list) => list,
			Err(e) if e.is_not_found() => return Ok(None),
			Err(e) => return Err(e),
		};
		let Some(membership) = memberships
			.into_iter()
			.find(|m| &m.organization_id == org_id)
		else {
			return Ok(None);
		};

		match organization {
			Ok(org) => Ok(Some(org.name)),
			Err(e) if e.is_not_found() => Ok(None),
			Err(e) if !membership.organization_name.is_empty() => {
				tracing::debug!(error = %e, "organization lookup failed, using membership name");
				Ok(Some(membership.organization_name))
			}
			Err(e) => Err(e),
		}
	}
}
