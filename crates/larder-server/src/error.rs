// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use larder_server_identity::WebhookError;
use larder_server_tenancy::TenancyError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error(transparent)]
	Tenancy(#[from] TenancyError),

	#[error("webhook rejected: {0}")]
	Webhook(#[from] WebhookError),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Invalid request: {0}")]
	BadRequest(String),
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
	/// Stable machine-readable code.
	pub error: String,
	pub message: String,
	/// The missing permission, on `permission_denied`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub permission: Option<String>,
}

impl ErrorResponse {
	pub fn new(error: &str, message: impl Into<String>) -> Self {
		Self {
			error: error.to_string(),
			message: message.into(),
			permission: None,
		}
	}
}

impl ServerError {
	fn status_and_body(&self) -> (StatusCode, ErrorResponse) {
		match self {
			ServerError::Tenancy(err) => tenancy_response(err),
			ServerError::Webhook(WebhookError::InvalidPayload(msg)) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("invalid_request", format!("invalid payload: {msg}")),
			),
			ServerError::Webhook(WebhookError::InvalidSecret(_)) => {
				tracing::error!(error = %self, "webhook verifier misconfigured");
				internal()
			}
			ServerError::Webhook(err) => {
				tracing::info!(error = %err, "webhook signature rejected");
				(
					StatusCode::BAD_REQUEST,
					ErrorResponse::new("invalid_signature", "Webhook signature verification failed"),
				)
			}
			ServerError::NotFound(what) => (
				StatusCode::NOT_FOUND,
				ErrorResponse::new("not_found", format!("Not found: {what}")),
			),
			ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("invalid_request", msg.clone()),
			),
		}
	}
}

fn tenancy_response(err: &TenancyError) -> (StatusCode, ErrorResponse) {
	let code = err.code();
	match err {
		TenancyError::NotAuthenticated => (
			StatusCode::UNAUTHORIZED,
			ErrorResponse::new(code, "Authentication required"),
		),
		TenancyError::NoTenantSelected => (
			StatusCode::BAD_REQUEST,
			ErrorResponse::new(code, "No organization is selected or it could not be resolved"),
		),
		TenancyError::NotMember => (
			StatusCode::FORBIDDEN,
			ErrorResponse::new(code, "You are not a member of this organization"),
		),
		TenancyError::PermissionDenied(permission) => (
			StatusCode::FORBIDDEN,
			ErrorResponse {
				error: code.to_string(),
				message: err.to_string(),
				permission: Some(permission.to_string()),
			},
		),
		TenancyError::ProviderUnavailable(source) => {
			tracing::warn!(error = %source, "identity provider unavailable");
			(
				StatusCode::SERVICE_UNAVAILABLE,
				ErrorResponse::new(code, "The identity provider is temporarily unavailable"),
			)
		}
		TenancyError::NotFound(what) => (
			StatusCode::NOT_FOUND,
			ErrorResponse::new(code, format!("Not found: {what}")),
		),
		TenancyError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(code, msg.clone())),
		TenancyError::Store(e) => {
			tracing::error!(error = %e, "tenant store error");
			internal()
		}
	}
}

fn internal() -> (StatusCode, ErrorResponse) {
	(
		StatusCode::INTERNAL_SERVER_ERROR,
		ErrorResponse::new("internal_error", "An internal error occurred"),
	)
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = self.status_and_body();
		(status, Json(body)).into_response()
	}
}
