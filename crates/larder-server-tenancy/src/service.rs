// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Handler-facing entry point.
//!
//! [`Tenancy`] bundles the resolver, the role resolver, the permission gate
//! and the webhook sync over one store and one provider. Request handlers only
//! ever talk to this type.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use larder_server_db::{DbError, TenantStore};
use larder_server_identity::{IdentityProvider, OrganizationEvent, ProviderInvitation};
use larder_tenancy_core::{
	normalize_tenant_name, ExternalOrgId, Permission, Role, SessionContext, Tenant,
	TenantSettingsUpdate, UserId,
};

use crate::error::TenancyError;
use crate::gate::PermissionGate;
use crate::provider_call::bounded;
use crate::resolver::TenantResolver;
use crate::roles::{MembershipLookup, RoleResolver};
use crate::sync::{OrganizationSync, SyncOutcome};

/// A tenant together with the caller's verified role in it.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedTenant {
	pub tenant: Tenant,
	pub role: Role,
}

#[derive(Clone)]
pub struct Tenancy {
	store: Arc<dyn TenantStore>,
	provider: Arc<dyn IdentityProvider>,
	provider_timeout: Duration,
	resolver: TenantResolver,
	gate: PermissionGate,
	sync: OrganizationSync,
}

impl Tenancy {
	pub fn new(
		store: Arc<dyn TenantStore>,
		provider: Arc<dyn IdentityProvider>,
		provider_timeout: Duration,
	) -> Self {
		let roles = RoleResolver::new(provider.clone(), provider_timeout);
		Self {
			resolver: TenantResolver::new(store.clone(), provider.clone(), provider_timeout),
			gate: PermissionGate::new(roles),
			sync: OrganizationSync::new(store.clone()),
			store,
			provider,
			provider_timeout,
		}
	}

	pub fn resolver(&self) -> &TenantResolver {
		&self.resolver
	}

	pub fn gate(&self) -> &PermissionGate {
		&self.gate
	}

	pub fn roles(&self) -> &RoleResolver {
		self.gate.roles()
	}

	pub fn store(&self) -> &Arc<dyn TenantStore> {
		&self.store
	}

	// =========================================================================
	// Session and access
	// =========================================================================

	/// Exchange a session token for the caller's identity.
	#[tracing::instrument(skip_all)]
	pub async fn session_context(&self, session_token: &str) -> Result<SessionContext, TenancyError> {
		match bounded(
			self.provider_timeout,
			self.provider.get_session_context(session_token),
		)
		.await
		{
			Ok(session) => Ok(session),
			Err(e) if !e.is_unavailable() => {
				tracing::debug!(error = %e, "session rejected");
				Err(TenancyError::NotAuthenticated)
			}
			Err(e) => {
				tracing::warn!(error = %e, "identity provider unavailable during session lookup");
				Err(TenancyError::ProviderUnavailable(e))
			}
		}
	}

	/// Verified membership plus the tenant, created on first access.
	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id))]
	pub async fn authorize_member(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
	) -> Result<AuthorizedTenant, TenancyError> {
		let role = match self.roles().lookup_membership(user_id, org_id).await {
			MembershipLookup::Member(role) => role,
			MembershipLookup::NotMember => return Err(TenancyError::NotMember),
			MembershipLookup::Unavailable => return Err(TenancyError::NoTenantSelected),
		};
		self.member_tenant(user_id, org_id, role).await
	}

	/// [`Tenancy::authorize_member`] with the permission gate in front.
	///
	/// The gate judges an unconfirmed membership as staff, so a provider
	/// outage refuses anything above staff with `PermissionDenied`. Staff-level
	/// requests still stop at `NoTenantSelected` until membership is confirmed.
	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id, permission = %permission))]
	pub async fn authorize(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
		permission: Permission,
	) -> Result<AuthorizedTenant, TenancyError> {
		let lookup = self.roles().lookup_membership(user_id, org_id).await;
		if lookup == MembershipLookup::NotMember {
			return Err(TenancyError::NotMember);
		}
		let role = self.gate.require_permission_for(lookup, permission)?;
		if lookup == MembershipLookup::Unavailable {
			return Err(TenancyError::NoTenantSelected);
		}
		self.member_tenant(user_id, org_id, role).await
	}

	async fn member_tenant(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
		role: Role,
	) -> Result<AuthorizedTenant, TenancyError> {
		let tenant = self.resolver.resolve_or_create(user_id, org_id).await?;
		tracing::debug!(tenant_id = %tenant.id, role = %role, "member authorized");
		Ok(AuthorizedTenant { tenant, role })
	}

	// =========================================================================
	// Tenant mutations
	// =========================================================================

	/// Mark onboarding complete. Repeats keep the first timestamp.
	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id))]
	pub async fn complete_onboarding(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
	) -> Result<Tenant, TenancyError> {
		let access = self.authorize_member(user_id, org_id).await?;
		let tenant = self
			.store
			.complete_onboarding(&access.tenant.id, Utc::now())
			.await
			.map_err(store_error)?;
		tracing::info!(tenant_id = %tenant.id, "onboarding completed");
		Ok(tenant)
	}

	#[tracing::instrument(skip_all, fields(user_id = %user_id, org_id = %org_id))]
	pub async fn update_settings(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
		update: TenantSettingsUpdate,
	) -> Result<Tenant, TenancyError> {
		let access = self.authorize(user_id, org_id, Permission::SettingsEdit).await?;
		let update = update.normalized()?;
		if update.is_empty() {
			return Ok(access.tenant);
		}
		let tenant = self
			.store
			.update_settings(&access.tenant.id, &update)
			.await
			.map_err(store_error)?;
		tracing::info!(tenant_id = %tenant.id, "tenant settings updated");
		Ok(tenant)
	}

	/// Create an organization at the provider with `user_id` as its admin and
	/// record the tenant straight away.
	#[tracing::instrument(skip_all, fields(user_id = %user_id))]
	pub async fn create_organization(&self, user_id: &UserId, name: &str) -> Result<Tenant, TenancyError> {
		let name = normalize_tenant_name(name)?;
		let org = bounded(
			self.provider_timeout,
			self.provider.create_organization(&name, user_id),
		)
		.await
		.map_err(TenancyError::from_provider)?;
		let tenant = self.resolver.upsert_from_provider(&org.id, &org.name).await?;
		tracing::info!(tenant_id = %tenant.id, org_id = %org.id, "organization created");
		Ok(tenant)
	}

	// =========================================================================
	// Membership management
	// =========================================================================

	#[tracing::instrument(skip_all, fields(actor = %actor, org_id = %org_id, target = %target, role = %role))]
	pub async fn change_member_role(
		&self,
		actor: &UserId,
		org_id: &ExternalOrgId,
		target: &UserId,
		role: Role,
	) -> Result<Role, TenancyError> {
		self.authorize(actor, org_id, Permission::UsersChangeRole).await?;
		if actor == target {
			return Err(TenancyError::Validation(
				"cannot change your own role".to_string(),
			));
		}
		let membership = bounded(
			self.provider_timeout,
			self.provider.update_membership_role(org_id, target, role),
		)
		.await
		.map_err(TenancyError::from_provider)?;
		tracing::info!("member role changed");
		Ok(membership.role())
	}

	#[tracing::instrument(skip_all, fields(actor = %actor, org_id = %org_id, role = %role))]
	pub async fn invite_member(
		&self,
		actor: &UserId,
		org_id: &ExternalOrgId,
		email_address: &str,
		role: Role,
	) -> Result<ProviderInvitation, TenancyError> {
		let email_address = email_address.trim();
		if !looks_like_email(email_address) {
			return Err(TenancyError::Validation(
				"email_address is not a valid address".to_string(),
			));
		}
		self.authorize(actor, org_id, Permission::UsersInvite).await?;
		let invitation = bounded(
			self.provider_timeout,
			self.provider.create_invitation(org_id, email_address, actor, role),
		)
		.await
		.map_err(TenancyError::from_provider)?;
		tracing::info!(invitation_id = %invitation.id, "invitation created");
		Ok(invitation)
	}

	// =========================================================================
	// Provider events
	// =========================================================================

	pub async fn handle_event(&self, event: &OrganizationEvent) -> Result<SyncOutcome, TenancyError> {
		self.sync.apply(event).await
	}
}

fn store_error(err: DbError) -> TenancyError {
	match err {
		DbError::NotFound(what) => TenancyError::NotFound(what),
		other => TenancyError::Store(other),
	}
}

fn looks_like_email(s: &str) -> bool {
	let Some((local, domain)) = s.split_once('@') else {
		return false;
	};
	!local.is_empty()
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
		&& !domain.contains('@')
		&& !s.chars().any(char::is_whitespace)
}
