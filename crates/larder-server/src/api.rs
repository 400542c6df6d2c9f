// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::{
	middleware,
	routing::{get, post, put},
	Router,
};
use larder_server_config::ServerConfig;
use larder_server_db::TenantRepository;
use larder_server_identity::{IdentityProvider, WebhookVerifier};
use larder_server_tenancy::Tenancy;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::{api_docs, auth_middleware::auth_layer, routes};

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub tenancy: Tenancy,
	pub webhook_verifier: Arc<WebhookVerifier>,
	pub session_cookie_name: String,
}

/// Wire the tenant store, the identity provider and the webhook verifier
/// into one shared state.
pub fn create_app_state(
	pool: SqlitePool,
	provider: Arc<dyn IdentityProvider>,
	webhook_verifier: WebhookVerifier,
	config: &ServerConfig,
) -> AppState {
	let store = Arc::new(TenantRepository::new(pool.clone()));
	let tenancy = Tenancy::new(store, provider, config.identity.request_timeout);

	tracing::debug!(
		provider_timeout_ms = config.identity.request_timeout.as_millis() as u64,
		cookie = %config.identity.session_cookie_name,
		"app state created"
	);

	AppState {
		pool,
		tenancy,
		webhook_verifier: Arc::new(webhook_verifier),
		session_cookie_name: config.identity.session_cookie_name.clone(),
	}
}

pub fn create_router(state: AppState) -> Router {
	let org_routes = Router::new()
		.route("/api/orgs", post(routes::orgs::create_org))
		.route("/api/orgs/{org_id}/select", post(routes::orgs::select_org))
		.route("/api/orgs/{org_id}/access", get(routes::orgs::get_access))
		.route(
			"/api/orgs/{org_id}/settings",
			get(routes::orgs::get_settings).patch(routes::orgs::update_settings),
		)
		.route(
			"/api/orgs/{org_id}/onboarding/complete",
			post(routes::orgs::complete_onboarding),
		)
		.route("/api/orgs/{org_id}/export", get(routes::orgs::export_org))
		.route(
			"/api/orgs/{org_id}/members/{user_id}/role",
			put(routes::orgs::change_member_role),
		)
		.route("/api/orgs/{org_id}/invitations", post(routes::orgs::invite_member));

	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/openapi.json", get(api_docs::openapi_json))
		.route("/api/session/tenant", get(routes::session::current_tenant))
		.merge(org_routes)
		.route("/api/webhooks/identity", post(routes::webhooks::identity_webhook))
		.layer(middleware::from_fn_with_state(state.clone(), auth_layer))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
