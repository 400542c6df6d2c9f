// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::StatusCode;
use larder_server_db::testing::{count_owned_records, seed_owned_records};
use larder_tenancy_core::ExternalOrgId;
use serde_json::json;

use super::support::{body_json, TestApp, ACME};

fn event(event_type: &str, data: serde_json::Value) -> Vec<u8> {
	serde_json::to_vec(&json!({"type": event_type, "object": "event", "data": data})).unwrap()
}

#[tokio::test]
async fn created_event_upserts_tenant() {
	let app = TestApp::new().await;
	let body = event("organization.created", json!({"id": "org_new", "name": "New Kitchen"}));

	let response = app.post_signed_webhook("msg_1", &body).await;
	assert_eq!(response.status(), StatusCode::OK);

	let ack = body_json(response).await;
	assert_eq!(ack["event_type"], "organization.created");
	assert_eq!(ack["outcome"], "upserted");

	let stored = app
		.state
		.tenancy
		.store()
		.get_by_external_org_id(&ExternalOrgId::new("org_new"))
		.await
		.unwrap()
		.unwrap();
	assert_eq!(stored.name, "New Kitchen");
	assert_eq!(ack["tenant_id"], stored.id.to_string());
}

#[tokio::test]
async fn replayed_created_event_keeps_one_row() {
	let app = TestApp::new().await;
	let body = event("organization.created", json!({"id": "org_new", "name": "New Kitchen"}));

	let first = body_json(app.post_signed_webhook("msg_1", &body).await).await;
	let second = body_json(app.post_signed_webhook("msg_1", &body).await).await;
	assert_eq!(first["tenant_id"], second["tenant_id"]);
}

#[tokio::test]
async fn deleted_event_cascades_and_clears_session_tenant() {
	let app = TestApp::new().await;
	let staff = app.fixtures.acme_staff.clone();

	let selected = body_json(
		app.post(&format!("/api/orgs/{ACME}/select"), Some(&staff), json!({}))
			.await,
	)
	.await;
	let tenant_id = selected["tenant"]["id"].as_str().unwrap().to_string();
	let response = app.get("/api/session/tenant", Some(&staff)).await;
	assert_eq!(response.status(), StatusCode::OK);
	seed_owned_records(&app.state.pool, &tenant_id).await;

	let response = app
		.post_signed_webhook(
			"msg_del",
			&event("organization.deleted", json!({"id": ACME, "deleted": true})),
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await["outcome"], "deleted");
	assert_eq!(count_owned_records(&app.state.pool, &tenant_id).await, 0);

	let response = app.get("/api/session/tenant", Some(&staff)).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "no_tenant_selected");
}

#[tokio::test]
async fn deleting_unknown_org_is_acknowledged() {
	let app = TestApp::new().await;
	let response = app
		.post_signed_webhook("msg_2", &event("organization.deleted", json!({"id": "org_gone"})))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await["outcome"], "already_deleted");
}

#[tokio::test]
async fn unrelated_events_are_ignored() {
	let app = TestApp::new().await;
	let response = app
		.post_signed_webhook("msg_3", &event("user.created", json!({"id": "user_9"})))
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await["outcome"], "ignored");
}

#[tokio::test]
async fn unsigned_delivery_is_rejected() {
	let app = TestApp::new().await;
	let body = event("organization.created", json!({"id": "org_evil", "name": "Evil"}));

	let response = app.post_webhook(&[], &body).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "invalid_signature");
}

#[tokio::test]
async fn tampered_body_is_rejected() {
	let app = TestApp::new().await;
	let signed = event("organization.created", json!({"id": "org_a", "name": "Original"}));
	let tampered = event("organization.created", json!({"id": "org_a", "name": "Tampered"}));

	let ts = chrono::Utc::now().timestamp();
	let signature = app.verifier.sign("msg_4", ts, &signed).unwrap();
	let response = app
		.post_webhook(
			&[
				("svix-id", "msg_4".to_string()),
				("svix-timestamp", ts.to_string()),
				("svix-signature", signature),
			],
			&tampered,
		)
		.await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	let stored = app
		.state
		.tenancy
		.store()
		.get_by_external_org_id(&ExternalOrgId::new("org_a"))
		.await
		.unwrap();
	assert!(stored.is_none());
}

#[tokio::test]
async fn stale_timestamp_is_rejected() {
	let app = TestApp::new().await;
	let body = event("organization.created", json!({"id": "org_a", "name": "Late"}));

	let ts = chrono::Utc::now().timestamp() - 3600;
	let signature = app.verifier.sign("msg_5", ts, &body).unwrap();
	let response = app
		.post_webhook(
			&[
				("svix-id", "msg_5".to_string()),
				("svix-timestamp", ts.to_string()),
				("svix-signature", signature),
			],
			&body,
		)
		.await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "invalid_signature");
}

#[tokio::test]
async fn extreme_timestamp_is_rejected() {
	let app = TestApp::new().await;
	let body = event("organization.created", json!({"id": "org_a", "name": "Early"}));

	let response = app
		.post_webhook(
			&[
				("svix-id", "msg_7".to_string()),
				("svix-timestamp", i64::MIN.to_string()),
				("svix-signature", "v1,AAAA".to_string()),
			],
			&body,
		)
		.await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "invalid_signature");
}

#[tokio::test]
async fn blank_organization_name_is_invalid_request() {
	let app = TestApp::new().await;
	let body = event("organization.created", json!({"id": "org_blank", "name": "  "}));

	let response = app.post_signed_webhook("msg_8", &body).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "invalid_request");

	let stored = app
		.state
		.tenancy
		.store()
		.get_by_external_org_id(&ExternalOrgId::new("org_blank"))
		.await
		.unwrap();
	assert!(stored.is_none());
}

#[tokio::test]
async fn signed_garbage_is_invalid_request() {
	let app = TestApp::new().await;
	let response = app.post_signed_webhook("msg_6", b"not json").await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "invalid_request");
}
