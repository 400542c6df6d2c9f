// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use axum::{
	body::Body,
	http::{header::HeaderName, header::HeaderValue, Method, Request, StatusCode},
	response::Response,
	Router,
};
use larder_common_config::SecretString;
use larder_server::{create_app_state, create_router, AppState};
use larder_server_config::ServerConfig;
use larder_server_db::testing::create_test_pool;
use larder_server_identity::testing::MockIdentityProvider;
use larder_server_identity::WebhookVerifier;
use larder_tenancy_core::Role;
use serde::Serialize;
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_bGFyZGVyLXRlc3Qtd2ViaG9vay1rZXkh";
pub const ACME: &str = "org_acme";
pub const OTHER: &str = "org_other";

#[derive(Clone)]
pub struct TestUser {
	pub user_id: String,
	pub session_token: String,
}

impl TestUser {
	pub fn auth_header(&self) -> (HeaderName, HeaderValue) {
		(
			HeaderName::from_static("cookie"),
			HeaderValue::from_str(&format!("larder_session={}", self.session_token)).unwrap(),
		)
	}
}

#[derive(Clone)]
pub struct Fixtures {
	pub acme_admin: TestUser,
	pub acme_manager: TestUser,
	pub acme_staff: TestUser,
	pub other_admin: TestUser,
	/// Signed in, but a member of no organization.
	pub outsider: TestUser,
}

pub struct TestApp {
	pub router: Router,
	pub fixtures: Fixtures,
	pub state: AppState,
	pub provider: Arc<MockIdentityProvider>,
	pub verifier: WebhookVerifier,
}

fn register(provider: &MockIdentityProvider, user: &str, org: Option<(&str, Role)>) -> TestUser {
	let token = format!("sess_{user}");
	provider.add_session(&token, user, org.map(|(o, _)| o));
	if let Some((o, role)) = org {
		provider.add_member(user, o, role);
	}
	TestUser {
		user_id: user.to_string(),
		session_token: token,
	}
}

impl TestApp {
	pub async fn new() -> Self {
		let pool = create_test_pool().await;
		let provider = Arc::new(MockIdentityProvider::new());
		provider.add_organization(ACME, "Acme");
		provider.add_organization(OTHER, "Other Co");

		let fixtures = Fixtures {
			acme_admin: register(&provider, "user_admin", Some((ACME, Role::Admin))),
			acme_manager: register(&provider, "user_manager", Some((ACME, Role::Manager))),
			acme_staff: register(&provider, "user_staff", Some((ACME, Role::Staff))),
			other_admin: register(&provider, "user_other", Some((OTHER, Role::Admin))),
			outsider: register(&provider, "user_outsider", None),
		};

		let mut config = ServerConfig::default();
		config.identity.request_timeout = std::time::Duration::from_millis(250);

		let secret = SecretString::new(WEBHOOK_SECRET.to_string());
		let state = create_app_state(
			pool,
			provider.clone(),
			WebhookVerifier::new(&secret).unwrap(),
			&config,
		);
		let router = create_router(state.clone());

		Self {
			router,
			fixtures,
			state,
			provider,
			verifier: WebhookVerifier::new(&secret).unwrap(),
		}
	}

	pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Response<Body> {
		self
			.request(Method::GET, path, user, Option::<()>::None)
			.await
	}

	pub async fn post(
		&self,
		path: &str,
		user: Option<&TestUser>,
		body: impl Serialize,
	) -> Response<Body> {
		self.request(Method::POST, path, user, Some(body)).await
	}

	pub async fn put(
		&self,
		path: &str,
		user: Option<&TestUser>,
		body: impl Serialize,
	) -> Response<Body> {
		self.request(Method::PUT, path, user, Some(body)).await
	}

	pub async fn patch(
		&self,
		path: &str,
		user: Option<&TestUser>,
		body: impl Serialize,
	) -> Response<Body> {
		self.request(Method::PATCH, path, user, Some(body)).await
	}

	/// POST a webhook body with explicit signing headers.
	pub async fn post_webhook(&self, headers: &[(&str, String)], body: &[u8]) -> Response<Body> {
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri("/api/webhooks/identity")
			.header("content-type", "application/json");
		for (name, value) in headers {
			builder = builder.header(*name, value.as_str());
		}
		let request = builder.body(Body::from(body.to_vec())).unwrap();

		self.router.clone().oneshot(request).await.unwrap()
	}

	/// POST a webhook body signed with the test secret at the current time.
	pub async fn post_signed_webhook(&self, id: &str, body: &[u8]) -> Response<Body> {
		let ts = chrono::Utc::now().timestamp();
		let signature = self.verifier.sign(id, ts, body).unwrap();
		self
			.post_webhook(
				&[
					("svix-id", id.to_string()),
					("svix-timestamp", ts.to_string()),
					("svix-signature", signature),
				],
				body,
			)
			.await
	}

	async fn request<T: Serialize>(
		&self,
		method: Method,
		path: &str,
		user: Option<&TestUser>,
		body: Option<T>,
	) -> Response<Body> {
		let mut builder = Request::builder().method(method).uri(path);

		if let Some(test_user) = user {
			let (name, value) = test_user.auth_header();
			builder = builder.header(name, value);
		}

		let request_body = match body {
			Some(b) => {
				builder = builder.header("content-type", "application/json");
				Body::from(serde_json::to_string(&b).unwrap())
			}
			None => Body::empty(),
		};

		let request = builder.body(request_body).unwrap();

		self.router.clone().oneshot(request).await.unwrap()
	}
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	serde_json::from_slice(&bytes).unwrap()
}

pub struct AuthzCase {
	pub name: &'static str,
	pub method: Method,
	pub path: String,
	pub user: Option<TestUser>,
	pub body: Option<serde_json::Value>,
	pub expected_status: StatusCode,
}

pub async fn run_authz_cases(app: &TestApp, cases: &[AuthzCase]) {
	for case in cases {
		let response = match (&case.method, &case.body) {
			(m, Some(body)) if *m == Method::POST => {
				app.post(&case.path, case.user.as_ref(), body.clone()).await
			}
			(m, Some(body)) if *m == Method::PUT => {
				app.put(&case.path, case.user.as_ref(), body.clone()).await
			}
			(m, Some(body)) if *m == Method::PATCH => {
				app
					.patch(&case.path, case.user.as_ref(), body.clone())
					.await
			}
			(m, None) if *m == Method::POST => {
				app.request(Method::POST, &case.path, case.user.as_ref(), Option::<()>::None).await
			}
			_ => app.get(&case.path, case.user.as_ref()).await,
		};

		if response.status() != case.expected_status {
			let (parts, body) = response.into_parts();
			let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
			let body_str = String::from_utf8_lossy(&body_bytes);
			panic!(
				"Case '{}': {} {} - expected {}, got {}\nResponse body: {}",
				case.name, case.method, case.path, case.expected_status, parts.status, body_str
			);
		}
	}
}
