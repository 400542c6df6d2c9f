// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::{Method, StatusCode};
use larder_server_db::testing::seed_owned_records;
use larder_tenancy_core::ExternalOrgId;
use serde_json::json;

use super::support::{body_json, run_authz_cases, AuthzCase, TestApp, TestUser, ACME, OTHER};

#[tokio::test]
async fn org_authorization() {
	let app = TestApp::new().await;
	let f = app.fixtures.clone();
	let forged = TestUser {
		user_id: "user_forged".to_string(),
		session_token: "sess_forged".to_string(),
	};

	let cases = vec![
		// Authentication
		AuthzCase {
			name: "anonymous_cannot_read_access",
			method: Method::GET,
			path: format!("/api/orgs/{ACME}/access"),
			user: None,
			body: None,
			expected_status: StatusCode::UNAUTHORIZED,
		},
		AuthzCase {
			name: "unknown_session_cannot_read_access",
			method: Method::GET,
			path: format!("/api/orgs/{ACME}/access"),
			user: Some(forged),
			body: None,
			expected_status: StatusCode::UNAUTHORIZED,
		},
		// Membership
		AuthzCase {
			name: "staff_can_select_own_org",
			method: Method::POST,
			path: format!("/api/orgs/{ACME}/select"),
			user: Some(f.acme_staff.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "outsider_cannot_select_org",
			method: Method::POST,
			path: format!("/api/orgs/{ACME}/select"),
			user: Some(f.outsider.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "other_org_admin_cannot_read_access",
			method: Method::GET,
			path: format!("/api/orgs/{ACME}/access"),
			user: Some(f.other_admin.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "other_org_admin_reads_own_access",
			method: Method::GET,
			path: format!("/api/orgs/{OTHER}/access"),
			user: Some(f.other_admin.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		// Settings
		AuthzCase {
			name: "staff_cannot_view_settings",
			method: Method::GET,
			path: format!("/api/orgs/{ACME}/settings"),
			user: Some(f.acme_staff.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "manager_can_view_settings",
			method: Method::GET,
			path: format!("/api/orgs/{ACME}/settings"),
			user: Some(f.acme_manager.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "manager_cannot_edit_settings",
			method: Method::PATCH,
			path: format!("/api/orgs/{ACME}/settings"),
			user: Some(f.acme_manager.clone()),
			body: Some(json!({"shrink_pct": 0.2})),
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "admin_can_edit_settings",
			method: Method::PATCH,
			path: format!("/api/orgs/{ACME}/settings"),
			user: Some(f.acme_admin.clone()),
			body: Some(json!({"shrink_pct": 0.2})),
			expected_status: StatusCode::OK,
		},
		// Onboarding and export
		AuthzCase {
			name: "staff_can_complete_onboarding",
			method: Method::POST,
			path: format!("/api/orgs/{ACME}/onboarding/complete"),
			user: Some(f.acme_staff.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "outsider_cannot_complete_onboarding",
			method: Method::POST,
			path: format!("/api/orgs/{ACME}/onboarding/complete"),
			user: Some(f.outsider.clone()),
			body: None,
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "staff_can_export",
			method: Method::GET,
			path: format!("/api/orgs/{ACME}/export"),
			user: Some(f.acme_staff.clone()),
			body: None,
			expected_status: StatusCode::OK,
		},
		AuthzCase {
			name: "outsider_export_is_not_found",
			method: Method::GET,
			path: format!("/api/orgs/{ACME}/export"),
			user: Some(f.outsider.clone()),
			body: None,
			expected_status: StatusCode::NOT_FOUND,
		},
		// Membership management
		AuthzCase {
			name: "manager_cannot_invite",
			method: Method::POST,
			path: format!("/api/orgs/{ACME}/invitations"),
			user: Some(f.acme_manager.clone()),
			body: Some(json!({"email_address": "cook@example.com"})),
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "admin_can_invite",
			method: Method::POST,
			path: format!("/api/orgs/{ACME}/invitations"),
			user: Some(f.acme_admin.clone()),
			body: Some(json!({"email_address": "cook@example.com", "role": "staff"})),
			expected_status: StatusCode::CREATED,
		},
		AuthzCase {
			name: "invite_rejects_bad_email",
			method: Method::POST,
			path: format!("/api/orgs/{ACME}/invitations"),
			user: Some(f.acme_admin.clone()),
			body: Some(json!({"email_address": "not an email"})),
			expected_status: StatusCode::BAD_REQUEST,
		},
		AuthzCase {
			name: "manager_cannot_change_roles",
			method: Method::PUT,
			path: format!("/api/orgs/{ACME}/members/{}/role", f.acme_staff.user_id),
			user: Some(f.acme_manager.clone()),
			body: Some(json!({"role": "manager"})),
			expected_status: StatusCode::FORBIDDEN,
		},
		AuthzCase {
			name: "admin_cannot_change_own_role",
			method: Method::PUT,
			path: format!("/api/orgs/{ACME}/members/{}/role", f.acme_admin.user_id),
			user: Some(f.acme_admin.clone()),
			body: Some(json!({"role": "staff"})),
			expected_status: StatusCode::BAD_REQUEST,
		},
		AuthzCase {
			name: "admin_change_role_of_non_member_is_not_found",
			method: Method::PUT,
			path: format!("/api/orgs/{ACME}/members/{}/role", f.outsider.user_id),
			user: Some(f.acme_admin.clone()),
			body: Some(json!({"role": "manager"})),
			expected_status: StatusCode::NOT_FOUND,
		},
		AuthzCase {
			name: "admin_can_confirm_manager_role",
			method: Method::PUT,
			path: format!("/api/orgs/{ACME}/members/{}/role", f.acme_manager.user_id),
			user: Some(f.acme_admin.clone()),
			body: Some(json!({"role": "manager"})),
			expected_status: StatusCode::OK,
		},
		// Creation
		AuthzCase {
			name: "anonymous_cannot_create_org",
			method: Method::POST,
			path: "/api/orgs".to_string(),
			user: None,
			body: Some(json!({"name": "Nope"})),
			expected_status: StatusCode::UNAUTHORIZED,
		},
		AuthzCase {
			name: "blank_org_name_is_rejected",
			method: Method::POST,
			path: "/api/orgs".to_string(),
			user: Some(f.outsider.clone()),
			body: Some(json!({"name": "   "})),
			expected_status: StatusCode::BAD_REQUEST,
		},
	];

	run_authz_cases(&app, &cases).await;
}

#[tokio::test]
async fn outsider_select_creates_nothing() {
	let app = TestApp::new().await;

	let response = app
		.post(&format!("/api/orgs/{ACME}/select"), Some(&app.fixtures.outsider), json!({}))
		.await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	assert_eq!(body_json(response).await["error"], "not_member");

	let stored = app
		.state
		.tenancy
		.store()
		.get_by_external_org_id(&ExternalOrgId::new(ACME))
		.await
		.unwrap();
	assert!(stored.is_none());
}

#[tokio::test]
async fn first_select_creates_tenant_with_defaults() {
	let app = TestApp::new().await;

	let response = app
		.post(&format!("/api/orgs/{ACME}/select"), Some(&app.fixtures.acme_manager), json!({}))
		.await;
	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;
	assert_eq!(body["role"], "manager");
	assert_eq!(body["tenant"]["name"], "Acme");
	assert_eq!(body["tenant"]["external_org_id"], ACME);
	assert_eq!(body["tenant"]["shrink_pct"], 0.1);
	assert_eq!(body["tenant"]["is_demo"], false);
}

#[tokio::test]
async fn concurrent_selects_share_one_tenant() {
	let app = TestApp::new().await;
	let path = format!("/api/orgs/{ACME}/select");

	let (a, b) = tokio::join!(
		app.post(&path, Some(&app.fixtures.acme_admin), json!({})),
		app.post(&path, Some(&app.fixtures.acme_staff), json!({})),
	);
	assert_eq!(a.status(), StatusCode::OK);
	assert_eq!(b.status(), StatusCode::OK);

	let (a, b) = (body_json(a).await, body_json(b).await);
	assert_eq!(a["tenant"]["id"], b["tenant"]["id"]);
}

#[tokio::test]
async fn access_lists_permissions_for_role() {
	let app = TestApp::new().await;

	let response = app
		.get(&format!("/api/orgs/{ACME}/access"), Some(&app.fixtures.acme_staff))
		.await;
	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;
	assert_eq!(body["role"], "staff");
	let permissions: Vec<String> = serde_json::from_value(body["permissions"].clone()).unwrap();
	assert!(permissions.contains(&"dashboard:view".to_string()));
	assert!(permissions.contains(&"inventory:edit".to_string()));
	assert!(!permissions.contains(&"products:edit".to_string()));
}

#[tokio::test]
async fn denial_names_missing_permission() {
	let app = TestApp::new().await;

	let response = app
		.patch(
			&format!("/api/orgs/{ACME}/settings"),
			Some(&app.fixtures.acme_staff),
			json!({"name": "Renamed"}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::FORBIDDEN);

	let body = body_json(response).await;
	assert_eq!(body["error"], "permission_denied");
	assert_eq!(body["permission"], "settings:edit");
}

#[tokio::test]
async fn settings_update_is_validated_and_persisted() {
	let app = TestApp::new().await;
	let path = format!("/api/orgs/{ACME}/settings");
	let admin = app.fixtures.acme_admin.clone();

	let response = app.patch(&path, Some(&admin), json!({"shrink_pct": 1.5})).await;
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(body_json(response).await["error"], "invalid_request");

	let response = app
		.patch(&path, Some(&admin), json!({"name": "  Acme Bistro  ", "shrink_pct": 0.25}))
		.await;
	assert_eq!(response.status(), StatusCode::OK);

	let response = app.get(&path, Some(&app.fixtures.acme_manager)).await;
	let body = body_json(response).await;
	assert_eq!(body["name"], "Acme Bistro");
	assert_eq!(body["shrink_pct"], 0.25);
}

#[tokio::test]
async fn onboarding_completion_is_one_way() {
	let app = TestApp::new().await;
	let path = format!("/api/orgs/{ACME}/onboarding/complete");
	let staff = app.fixtures.acme_staff.clone();

	let first = body_json(app.post(&path, Some(&staff), json!({})).await).await;
	let second = body_json(app.post(&path, Some(&staff), json!({})).await).await;

	assert!(first["onboarding_completed_at"].is_string());
	assert_eq!(first["onboarding_completed_at"], second["onboarding_completed_at"]);
}

#[tokio::test]
async fn export_counts_owned_records() {
	let app = TestApp::new().await;
	let staff = app.fixtures.acme_staff.clone();

	let selected = body_json(
		app.post(&format!("/api/orgs/{ACME}/select"), Some(&staff), json!({}))
			.await,
	)
	.await;
	let tenant_id = selected["tenant"]["id"].as_str().unwrap().to_string();
	seed_owned_records(&app.state.pool, &tenant_id).await;

	let response = app.get(&format!("/api/orgs/{ACME}/export"), Some(&staff)).await;
	assert_eq!(response.status(), StatusCode::OK);

	let body = body_json(response).await;
	assert_eq!(body["tenant"]["id"], tenant_id.as_str());
	assert_eq!(body["records"]["restaurants"], 1);
	assert_eq!(body["records"]["sales"], 1);
	assert_eq!(body["records"]["alerts"], 1);
}

#[tokio::test]
async fn export_never_creates_a_tenant() {
	let app = TestApp::new().await;

	let response = app
		.get(&format!("/api/orgs/{ACME}/export"), Some(&app.fixtures.acme_admin))
		.await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn created_org_makes_caller_admin() {
	let app = TestApp::new().await;
	let outsider = app.fixtures.outsider.clone();

	let response = app.post("/api/orgs", Some(&outsider), json!({"name": " Corner Cafe "})).await;
	assert_eq!(response.status(), StatusCode::CREATED);
	let created = body_json(response).await;
	assert_eq!(created["name"], "Corner Cafe");
	let org_id = created["external_org_id"].as_str().unwrap().to_string();

	let access = body_json(
		app.get(&format!("/api/orgs/{org_id}/access"), Some(&outsider))
			.await,
	)
	.await;
	assert_eq!(access["role"], "admin");
	assert_eq!(access["tenant_id"], created["id"]);
}

#[tokio::test]
async fn role_change_takes_effect_on_next_request() {
	let app = TestApp::new().await;
	let staff = app.fixtures.acme_staff.clone();
	let settings = format!("/api/orgs/{ACME}/settings");

	assert_eq!(app.get(&settings, Some(&staff)).await.status(), StatusCode::FORBIDDEN);

	let response = app
		.put(
			&format!("/api/orgs/{ACME}/members/{}/role", staff.user_id),
			Some(&app.fixtures.acme_admin),
			json!({"role": "manager"}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(response).await["role"], "manager");

	assert_eq!(app.get(&settings, Some(&staff)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn invitation_reaches_provider() {
	let app = TestApp::new().await;

	let response = app
		.post(
			&format!("/api/orgs/{ACME}/invitations"),
			Some(&app.fixtures.acme_admin),
			json!({"email_address": "sous@example.com", "role": "manager"}),
		)
		.await;
	assert_eq!(response.status(), StatusCode::CREATED);
	assert_eq!(body_json(response).await["email_address"], "sous@example.com");

	let invitations = app.provider.invitations();
	assert_eq!(invitations.len(), 1);
	assert_eq!(invitations[0].0, ExternalOrgId::new(ACME));
	assert_eq!(invitations[0].2, larder_tenancy_core::Role::Manager);
}

#[tokio::test]
async fn provider_rejection_keeps_provider_wording_private() {
	let app = TestApp::new().await;
	app
		.provider
		.reject_mutations(422, "instance ins_2abc signing key rotated");

	let responses = [
		app
			.post(
				&format!("/api/orgs/{ACME}/invitations"),
				Some(&app.fixtures.acme_admin),
				json!({"email_address": "sous@example.com"}),
			)
			.await,
		app
			.put(
				&format!("/api/orgs/{ACME}/members/user_staff/role"),
				Some(&app.fixtures.acme_admin),
				json!({"role": "manager"}),
			)
			.await,
		app
			.post("/api/orgs", Some(&app.fixtures.outsider), json!({"name": "Bistro"}))
			.await,
	];

	for response in responses {
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		let body = body_json(response).await;
		assert_eq!(body["error"], "invalid_request");
		assert_eq!(body["message"], larder_server_tenancy::error::PROVIDER_REJECTED);
		assert!(!body.to_string().contains("ins_2abc"));
	}
	assert!(app.provider.invitations().is_empty());
}

#[tokio::test]
async fn provider_outage_is_service_unavailable() {
	let app = TestApp::new().await;
	app.provider.set_unavailable(true);

	let response = app
		.get(&format!("/api/orgs/{ACME}/access"), Some(&app.fixtures.acme_admin))
		.await;
	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let body = body_json(response).await;
	assert_eq!(body["error"], "provider_unavailable");
	assert!(!body["message"].as_str().unwrap().contains("mock"));
}
