// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`IdentityProvider`] for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use larder_tenancy_core::{ExternalOrgId, PrivilegeLevel, Role, SessionContext, UserId};
use tokio::sync::Barrier;

use crate::error::ProviderError;
use crate::provider::{
	IdentityProvider, ProviderInvitation, ProviderMembership, ProviderOrganization,
};

#[derive(Default)]
struct MockState {
	sessions: HashMap<String, SessionContext>,
	organizations: HashMap<ExternalOrgId, String>,
	memberships: HashMap<(UserId, ExternalOrgId), (PrivilegeLevel, Option<String>)>,
	invitations: Vec<(ExternalOrgId, ProviderInvitation, Role)>,
	unavailable: bool,
	rejection: Option<(u16, String)>,
	delay: Option<Duration>,
	next_id: usize,
	calls: HashMap<&'static str, usize>,
}

/// Scriptable provider. Cheap to share behind an `Arc`.
#[derive(Default)]
pub struct MockIdentityProvider {
	state: Mutex<MockState>,
	membership_barrier: Mutex<Option<Arc<Barrier>>>,
}

impl MockIdentityProvider {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_session(&self, token: &str, user: &str, org: Option<&str>) {
		self.state.lock().unwrap().sessions.insert(
			token.to_string(),
			SessionContext {
				user_id: UserId::new(user),
				external_org_id: org.map(ExternalOrgId::new),
			},
		);
	}

	pub fn add_organization(&self, id: &str, name: &str) {
		self
			.state
			.lock()
			.unwrap()
			.organizations
			.insert(ExternalOrgId::new(id), name.to_string());
	}

	pub fn rename_organization(&self, id: &str, name: &str) {
		self.add_organization(id, name);
	}

	/// Raw membership with an explicit tier and tag.
	pub fn add_membership(&self, user: &str, org: &str, privilege: PrivilegeLevel, tag: Option<&str>) {
		self.state.lock().unwrap().memberships.insert(
			(UserId::new(user), ExternalOrgId::new(org)),
			(privilege, tag.map(str::to_string)),
		);
	}

	pub fn add_member(&self, user: &str, org: &str, role: Role) {
		let (privilege, tag) = role.provider_assignment();
		self.add_membership(user, org, privilege, tag);
	}

	pub fn remove_member(&self, user: &str, org: &str) {
		self
			.state
			.lock()
			.unwrap()
			.memberships
			.remove(&(UserId::new(user), ExternalOrgId::new(org)));
	}

	/// Make every call fail as if the provider were down.
	pub fn set_unavailable(&self, unavailable: bool) {
		self.state.lock().unwrap().unavailable = unavailable;
	}

	/// Make every mutation fail with an `Api` error carrying `status` and `message`.
	pub fn reject_mutations(&self, status: u16, message: &str) {
		self.state.lock().unwrap().rejection = Some((status, message.to_string()));
	}

	/// Delay every call by `delay` before answering.
	pub fn set_delay(&self, delay: Option<Duration>) {
		self.state.lock().unwrap().delay = delay;
	}

	/// Make `list_user_memberships` wait on `barrier` before answering.
	pub fn set_membership_barrier(&self, barrier: Arc<Barrier>) {
		*self.membership_barrier.lock().unwrap() = Some(barrier);
	}

	pub fn call_count(&self, method: &str) -> usize {
		self.state.lock().unwrap().calls.get(method).copied().unwrap_or(0)
	}

	pub fn invitations(&self) -> Vec<(ExternalOrgId, ProviderInvitation, Role)> {
		self.state.lock().unwrap().invitations.clone()
	}

	pub fn role_of(&self, user: &str, org: &str) -> Option<Role> {
		self
			.state
			.lock()
			.unwrap()
			.memberships
			.get(&(UserId::new(user), ExternalOrgId::new(org)))
			.map(|(p, t)| Role::from_membership(*p, t.as_deref()))
	}

	async fn enter_mutation(&self, method: &'static str) -> Result<(), ProviderError> {
		self.enter(method).await?;
		match self.state.lock().unwrap().rejection.clone() {
			Some((status, message)) => Err(ProviderError::Api { status, message }),
			None => Ok(()),
		}
	}

	async fn enter(&self, method: &'static str) -> Result<(), ProviderError> {
		let (unavailable, delay) = {
			let mut state = self.state.lock().unwrap();
			*state.calls.entry(method).or_default() += 1;
			(state.unavailable, state.delay)
		};
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if unavailable {
			return Err(ProviderError::Unavailable("mock provider offline".to_string()));
		}
		Ok(())
	}

	fn membership_for(
		state: &MockState,
		user: &UserId,
		org: &ExternalOrgId,
	) -> Option<ProviderMembership> {
		let (privilege, tag) = state.memberships.get(&(user.clone(), org.clone()))?;
		Some(ProviderMembership {
			organization_id: org.clone(),
			organization_name: state.organizations.get(org).cloned().unwrap_or_default(),
			privilege: *privilege,
			role_tag: tag.clone(),
		})
	}
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
	async fn get_session_context(&self, session_token: &str) -> Result<SessionContext, ProviderError> {
		self.enter("get_session_context").await?;
		self
			.state
			.lock()
			.unwrap()
			.sessions
			.get(session_token)
			.cloned()
			.ok_or_else(|| ProviderError::NotFound("session".to_string()))
	}

	async fn get_organization(
		&self,
		org_id: &ExternalOrgId,
	) -> Result<ProviderOrganization, ProviderError> {
		self.enter("get_organization").await?;
		let state = self.state.lock().unwrap();
		state
			.organizations
			.get(org_id)
			.map(|name| ProviderOrganization {
				id: org_id.clone(),
				name: name.clone(),
			})
			.ok_or_else(|| ProviderError::NotFound("organization".to_string()))
	}

	async fn list_user_memberships(
		&self,
		user_id: &UserId,
	) -> Result<Vec<ProviderMembership>, ProviderError> {
		let barrier = self.membership_barrier.lock().unwrap().clone();
		if let Some(barrier) = barrier {
			barrier.wait().await;
		}
		self.enter("list_user_memberships").await?;

		let state = self.state.lock().unwrap();
		let mut memberships: Vec<_> = state
			.memberships
			.keys()
			.filter(|(u, _)| u == user_id)
			.filter_map(|(u, o)| Self::membership_for(&state, u, o))
			.collect();
		memberships.sort_by(|a, b| a.organization_id.cmp(&b.organization_id));
		Ok(memberships)
	}

	async fn get_membership(
		&self,
		user_id: &UserId,
		org_id: &ExternalOrgId,
	) -> Result<ProviderMembership, ProviderError> {
		self.enter("get_membership").await?;
		let state = self.state.lock().unwrap();
		Self::membership_for(&state, user_id, org_id)
			.ok_or_else(|| ProviderError::NotFound("membership".to_string()))
	}

	async fn create_organization(
		&self,
		name: &str,
		created_by: &UserId,
	) -> Result<ProviderOrganization, ProviderError> {
		self.enter_mutation("create_organization").await?;
		let mut state = self.state.lock().unwrap();
		state.next_id += 1;
		let id = ExternalOrgId::new(format!("org_mock_{}", state.next_id));
		state.organizations.insert(id.clone(), name.to_string());
		state
			.memberships
			.insert((created_by.clone(), id.clone()), (PrivilegeLevel::Admin, None));
		Ok(ProviderOrganization {
			id,
			name: name.to_string(),
		})
	}

	async fn update_membership_role(
		&self,
		org_id: &ExternalOrgId,
		user_id: &UserId,
		role: Role,
	) -> Result<ProviderMembership, ProviderError> {
		self.enter_mutation("update_membership_role").await?;
		let mut state = self.state.lock().unwrap();
		let key = (user_id.clone(), org_id.clone());
		if !state.memberships.contains_key(&key) {
			return Err(ProviderError::NotFound("membership".to_string()));
		}
		let (privilege, tag) = role.provider_assignment();
		state.memberships.insert(key, (privilege, tag.map(str::to_string)));
		Self::membership_for(&state, user_id, org_id)
			.ok_or_else(|| ProviderError::NotFound("membership".to_string()))
	}

	async fn create_invitation(
		&self,
		org_id: &ExternalOrgId,
		email_address: &str,
		_inviter: &UserId,
		role: Role,
	) -> Result<ProviderInvitation, ProviderError> {
		self.enter_mutation("create_invitation").await?;
		let mut state = self.state.lock().unwrap();
		if !state.organizations.contains_key(org_id) {
			return Err(ProviderError::NotFound("organization".to_string()));
		}
		state.next_id += 1;
		let invitation = ProviderInvitation {
			id: format!("orginv_mock_{}", state.next_id),
			email_address: email_address.to_string(),
			status: "pending".to_string(),
		};
		state
			.invitations
			.push((org_id.clone(), invitation.clone(), role));
		Ok(invitation)
	}
}
