// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, Json};
use larder_server_tenancy::TenancyError;

use crate::{
	api::AppState,
	auth_middleware::RequireAuth,
	error::{ErrorResponse, ServerError},
	routes::orgs::TenantResponse,
};

#[utoipa::path(
    get,
    path = "/api/session/tenant",
    responses(
        (status = 200, description = "Tenant bound to the current session", body = TenantResponse),
        (status = 400, description = "Session has no organization, or it could not be resolved", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "session"
)]
/// Tenant for the organization the caller's session is bound to.
pub async fn current_tenant(
	State(state): State<AppState>,
	RequireAuth(session): RequireAuth,
) -> Result<Json<TenantResponse>, ServerError> {
	match state.tenancy.resolver().resolve_for_current_session(&session).await? {
		Some(tenant) => Ok(Json(tenant.into())),
		None => Err(TenancyError::NoTenantSelected.into()),
	}
}
