// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	body::Body,
	http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use super::support::{body_json, TestApp, ACME};

#[tokio::test]
async fn session_tenant_requires_authentication() {
	let app = TestApp::new().await;
	let response = app.get("/api/session/tenant", None).await;
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(body_json(response).await["error"], "not_authenticated");
}

#[tokio::test]
async fn session_without_org_has_no_tenant() {
	let app = TestApp::new().await;
	let response = app.get("/api/session/tenant", Some(&app.fixtures.outsider)).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "no_tenant_selected");
}

#[tokio::test]
async fn session_tenant_is_not_created_by_lookup() {
	let app = TestApp::new().await;
	let response = app.get("/api/session/tenant", Some(&app.fixtures.acme_staff)).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_bound_to_org_resolves_tenant() {
	let app = TestApp::new().await;
	let select = app
		.post(&format!("/api/orgs/{ACME}/select"), Some(&app.fixtures.acme_admin), json!({}))
		.await;
	assert_eq!(select.status(), StatusCode::OK);

	let response = app.get("/api/session/tenant", Some(&app.fixtures.acme_staff)).await;
	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;
	assert_eq!(body["external_org_id"], ACME);
	assert_eq!(body["name"], "Acme");
}

#[tokio::test]
async fn bearer_token_is_accepted() {
	let app = TestApp::new().await;
	let select = app
		.post(&format!("/api/orgs/{ACME}/select"), Some(&app.fixtures.acme_admin), json!({}))
		.await;
	assert_eq!(select.status(), StatusCode::OK);
	let request = Request::builder()
		.uri("/api/session/tenant")
		.header(
			"authorization",
			format!("Bearer {}", app.fixtures.acme_admin.session_token),
		)
		.body(Body::empty())
		.unwrap();

	let response = app.router.clone().oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_reports_database() {
	let app = TestApp::new().await;
	let response = app.get("/health", None).await;
	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;
	assert_eq!(body["status"], "healthy");
	assert_eq!(body["database"]["status"], "healthy");
}

#[tokio::test]
async fn openapi_document_is_served() {
	let app = TestApp::new().await;
	let response = app.get("/api/openapi.json", None).await;
	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;
	assert!(body["paths"]["/api/orgs/{org_id}/select"].is_object());
}
