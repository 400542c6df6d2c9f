// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization (tenant) HTTP handlers.
//!
//! Every handler under `/api/orgs/{org_id}` verifies membership with the
//! identity provider before touching the tenant. Role checks go through the
//! permission gate on the freshly resolved role.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::IntoResponse,
	Json,
};
use larder_server_db::OwnedRecordCounts;
use larder_server_identity::ProviderInvitation;
use larder_server_tenancy::TenancyError;
use larder_tenancy_core::{
	permissions_for, ExternalOrgId, Permission, Role, Tenant, TenantSettingsUpdate, UserId,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	error::{ErrorResponse, ServerError},
};

// =============================================================================
// Request and response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
	pub id: String,
	pub external_org_id: String,
	pub name: String,
	pub shrink_pct: f64,
	pub is_demo: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub onboarding_completed_at: Option<String>,
	pub created_at: String,
	pub updated_at: String,
}

impl From<Tenant> for TenantResponse {
	fn from(t: Tenant) -> Self {
		Self {
			id: t.id.to_string(),
			external_org_id: t.external_org_id.into_inner(),
			name: t.name,
			shrink_pct: t.shrink_pct,
			is_demo: t.is_demo,
			onboarding_completed_at: t.onboarding_completed_at.map(|at| at.to_rfc3339()),
			created_at: t.created_at.to_rfc3339(),
			updated_at: t.updated_at.to_rfc3339(),
		}
	}
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrgRequest {
	pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SelectOrgResponse {
	pub tenant: TenantResponse,
	#[schema(value_type = String, example = "manager")]
	pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessResponse {
	pub org_id: String,
	pub tenant_id: String,
	#[schema(value_type = String, example = "staff")]
	pub role: Role,
	/// Permission names granted to `role`, e.g. `products:edit`.
	pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettingsResponse {
	pub name: String,
	pub shrink_pct: f64,
	pub is_demo: bool,
	pub onboarding_completed: bool,
}

impl From<&Tenant> for SettingsResponse {
	fn from(t: &Tenant) -> Self {
		Self {
			name: t.name.clone(),
			shrink_pct: t.shrink_pct,
			is_demo: t.is_demo,
			onboarding_completed: t.is_onboarded(),
		}
	}
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub shrink_pct: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordCountsResponse {
	pub restaurants: i64,
	pub sales: i64,
	pub alerts: i64,
}

impl From<OwnedRecordCounts> for RecordCountsResponse {
	fn from(c: OwnedRecordCounts) -> Self {
		Self {
			restaurants: c.restaurants,
			sales: c.sales,
			alerts: c.alerts,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportResponse {
	pub tenant: TenantResponse,
	pub records: RecordCountsResponse,
	pub exported_at: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
	#[schema(value_type = String, example = "manager")]
	pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberRoleResponse {
	pub user_id: String,
	#[schema(value_type = String, example = "manager")]
	pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InviteMemberRequest {
	pub email_address: String,
	/// Defaults to `staff`.
	#[serde(default)]
	#[schema(value_type = Option<String>, example = "staff")]
	pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvitationResponse {
	pub id: String,
	pub email_address: String,
	pub status: String,
}

impl From<ProviderInvitation> for InvitationResponse {
	fn from(i: ProviderInvitation) -> Self {
		Self {
			id: i.id,
			email_address: i.email_address,
			status: i.status,
		}
	}
}

// =============================================================================
// Handlers
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/orgs",
    request_body = CreateOrgRequest,
    responses(
        (status = 201, description = "Organization created", body = TenantResponse),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 503, description = "Identity provider unavailable", body = ErrorResponse)
    ),
    tag = "orgs"
)]
/// Create an organization with the caller as its admin.
pub async fn create_org(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Json(payload): Json<CreateOrgRequest>,
) -> Result<impl IntoResponse, ServerError> {
	let tenant = state
		.tenancy
		.create_organization(&session.user_id, &payload.name)
		.await?;
	Ok((StatusCode::CREATED, Json(TenantResponse::from(tenant))))
}

#[utoipa::path(
    post,
    path = "/api/orgs/{org_id}/select",
    params(("org_id" = String, Path, description = "Provider organization ID")),
    responses(
        (status = 200, description = "Tenant resolved, created on first access", body = SelectOrgResponse),
        (status = 400, description = "Organization could not be resolved", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    tag = "orgs"
)]
/// Resolve the tenant for an organization the caller belongs to.
pub async fn select_org(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Path(org_id): Path<String>,
) -> Result<Json<SelectOrgResponse>, ServerError> {
	let access = state
		.tenancy
		.authorize_member(&session.user_id, &ExternalOrgId::new(org_id))
		.await?;
	Ok(Json(SelectOrgResponse {
		tenant: access.tenant.into(),
		role: access.role,
	}))
}

#[utoipa::path(
    get,
    path = "/api/orgs/{org_id}/access",
    params(("org_id" = String, Path, description = "Provider organization ID")),
    responses(
        (status = 200, description = "Caller's role and permissions", body = AccessResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    tag = "orgs"
)]
pub async fn get_access(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Path(org_id): Path<String>,
) -> Result<Json<AccessResponse>, ServerError> {
	let org_id = ExternalOrgId::new(org_id);
	let access = state.tenancy.authorize_member(&session.user_id, &org_id).await?;
	Ok(Json(AccessResponse {
		org_id: org_id.into_inner(),
		tenant_id: access.tenant.id.to_string(),
		role: access.role,
		permissions: permissions_for(access.role)
			.into_iter()
			.map(|p| p.as_str().to_string())
			.collect(),
	}))
}

#[utoipa::path(
    get,
    path = "/api/orgs/{org_id}/settings",
    params(("org_id" = String, Path, description = "Provider organization ID")),
    responses(
        (status = 200, description = "Tenant settings", body = SettingsResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a member or missing settings:view", body = ErrorResponse)
    ),
    tag = "orgs"
)]
pub async fn get_settings(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Path(org_id): Path<String>,
) -> Result<Json<SettingsResponse>, ServerError> {
	let access = state
		.tenancy
		.authorize(&session.user_id, &ExternalOrgId::new(org_id), Permission::SettingsView)
		.await?;
	Ok(Json(SettingsResponse::from(&access.tenant)))
}

#[utoipa::path(
    patch,
    path = "/api/orgs/{org_id}/settings",
    params(("org_id" = String, Path, description = "Provider organization ID")),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = SettingsResponse),
        (status = 400, description = "Invalid settings", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Missing settings:edit", body = ErrorResponse)
    ),
    tag = "orgs"
)]
pub async fn update_settings(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Path(org_id): Path<String>,
	Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ServerError> {
	let update = TenantSettingsUpdate {
		name: payload.name,
		shrink_pct: payload.shrink_pct,
	};
	let tenant = state
		.tenancy
		.update_settings(&session.user_id, &ExternalOrgId::new(org_id), update)
		.await?;
	Ok(Json(SettingsResponse::from(&tenant)))
}

#[utoipa::path(
    post,
    path = "/api/orgs/{org_id}/onboarding/complete",
    params(("org_id" = String, Path, description = "Provider organization ID")),
    responses(
        (status = 200, description = "Onboarding recorded", body = TenantResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    tag = "orgs"
)]
/// Mark onboarding complete. Any member may do this, and repeats are no-ops.
pub async fn complete_onboarding(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Path(org_id): Path<String>,
) -> Result<Json<TenantResponse>, ServerError> {
	let tenant = state
		.tenancy
		.complete_onboarding(&session.user_id, &ExternalOrgId::new(org_id))
		.await?;
	Ok(Json(tenant.into()))
}

#[utoipa::path(
    get,
    path = "/api/orgs/{org_id}/export",
    params(("org_id" = String, Path, description = "Provider organization ID")),
    responses(
        (status = 200, description = "Tenant record and owned data summary", body = ExportResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No tenant, or caller is not a member", body = ErrorResponse)
    ),
    tag = "orgs"
)]
/// Export the tenant the caller belongs to.
///
/// Never creates a tenant. Non-members and unknown organizations look the
/// same to the caller.
pub async fn export_org(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Path(org_id): Path<String>,
) -> Result<Json<ExportResponse>, ServerError> {
	let Some(tenant) = state
		.tenancy
		.resolver()
		.resolve_by_id_if_member(&session.user_id, &ExternalOrgId::new(org_id))
		.await?
	else {
		return Err(ServerError::NotFound("organization".to_string()));
	};

	let counts = state
		.tenancy
		.store()
		.owned_record_counts(&tenant.id)
		.await
		.map_err(TenancyError::Store)?;

	tracing::info!(tenant_id = %tenant.id, "tenant exported");
	Ok(Json(ExportResponse {
		tenant: tenant.into(),
		records: counts.into(),
		exported_at: chrono::Utc::now().to_rfc3339(),
	}))
}

#[utoipa::path(
    put,
    path = "/api/orgs/{org_id}/members/{user_id}/role",
    params(
        ("org_id" = String, Path, description = "Provider organization ID"),
        ("user_id" = String, Path, description = "Provider user ID of the member")
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = MemberRoleResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Missing users:change_role", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 503, description = "Identity provider unavailable", body = ErrorResponse)
    ),
    tag = "orgs"
)]
pub async fn change_member_role(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Path((org_id, user_id)): Path<(String, String)>,
	Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<MemberRoleResponse>, ServerError> {
	let target = UserId::new(user_id);
	let role = state
		.tenancy
		.change_member_role(&session.user_id, &ExternalOrgId::new(org_id), &target, payload.role)
		.await?;
	Ok(Json(MemberRoleResponse {
		user_id: target.into_inner(),
		role,
	}))
}

#[utoipa::path(
    post,
    path = "/api/orgs/{org_id}/invitations",
    params(("org_id" = String, Path, description = "Provider organization ID")),
    request_body = InviteMemberRequest,
    responses(
        (status = 201, description = "Invitation sent", body = InvitationResponse),
        (status = 400, description = "Invalid email address", body = ErrorResponse),
        (status = 403, description = "Missing users:invite", body = ErrorResponse),
        (status = 503, description = "Identity provider unavailable", body = ErrorResponse)
    ),
    tag = "orgs"
)]
pub async fn invite_member(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
	Path(org_id): Path<String>,
	Json(payload): Json<InviteMemberRequest>,
) -> Result<impl IntoResponse, ServerError> {
	let invitation = state
		.tenancy
		.invite_member(
			&session.user_id,
			&ExternalOrgId::new(org_id),
			&payload.email_address,
			payload.role.unwrap_or(Role::Staff),
		)
		.await?;
	Ok((StatusCode::CREATED, Json(InvitationResponse::from(invitation))))
}
