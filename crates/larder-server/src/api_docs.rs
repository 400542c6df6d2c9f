// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation, served as JSON at `/api/openapi.json`.

use axum::Json;
use utoipa::OpenApi;

use crate::{error, health, routes};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Larder Server API",
        version = "1.0.0",
        description = "Tenant resolution and permission gating for Larder restaurant organizations.",
        license(name = "Proprietary")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Liveness and database probe"),
        (name = "session", description = "Tenant bound to the caller's session"),
        (name = "orgs", description = "Organization tenants, settings and membership"),
        (name = "webhooks", description = "Identity provider organization events")
    ),
    paths(
        routes::health::health_check,
        routes::session::current_tenant,
        routes::orgs::create_org,
        routes::orgs::select_org,
        routes::orgs::get_access,
        routes::orgs::get_settings,
        routes::orgs::update_settings,
        routes::orgs::complete_onboarding,
        routes::orgs::export_org,
        routes::orgs::change_member_role,
        routes::orgs::invite_member,
        routes::webhooks::identity_webhook,
    ),
    components(schemas(
        error::ErrorResponse,
        health::HealthStatus,
        health::DatabaseHealth,
        health::HealthResponse,
        routes::orgs::TenantResponse,
        routes::orgs::CreateOrgRequest,
        routes::orgs::SelectOrgResponse,
        routes::orgs::AccessResponse,
        routes::orgs::SettingsResponse,
        routes::orgs::UpdateSettingsRequest,
        routes::orgs::RecordCountsResponse,
        routes::orgs::ExportResponse,
        routes::orgs::ChangeRoleRequest,
        routes::orgs::MemberRoleResponse,
        routes::orgs::InviteMemberRequest,
        routes::orgs::InvitationResponse,
        routes::webhooks::WebhookAckResponse,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
	Json(ApiDoc::openapi())
}
