// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity provider webhook receiver.
//!
//! The body is verified against the signing headers before it is parsed.
//! Events other than organization created/updated/deleted are acknowledged
//! and dropped so the provider does not retry them.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;
use larder_server_identity::{parse_event, WebhookHeaders};
use larder_server_tenancy::SyncOutcome;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
	api::AppState,
	error::{ErrorResponse, ServerError},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAckResponse {
	pub event_type: String,
	/// One of `upserted`, `deleted`, `already_deleted`, `ignored`.
	pub outcome: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tenant_id: Option<String>,
}

fn describe(outcome: &SyncOutcome) -> (&'static str, Option<String>) {
	match outcome {
		SyncOutcome::Upserted(tenant) => ("upserted", Some(tenant.id.to_string())),
		SyncOutcome::Deleted { existed: true } => ("deleted", None),
		SyncOutcome::Deleted { existed: false } => ("already_deleted", None),
		SyncOutcome::Ignored => ("ignored", None),
	}
}

#[utoipa::path(
    post,
    path = "/api/webhooks/identity",
    request_body(content = String, description = "Signed organization event", content_type = "application/json"),
    responses(
        (status = 200, description = "Event applied or ignored", body = WebhookAckResponse),
        (status = 400, description = "Bad signature or malformed payload", body = ErrorResponse)
    ),
    tag = "webhooks"
)]
#[tracing::instrument(skip_all, fields(webhook_id = tracing::field::Empty))]
pub async fn identity_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<WebhookAckResponse>, ServerError> {
	let signing = WebhookHeaders::from_header_map(&headers)?;
	tracing::Span::current().record("webhook_id", signing.id.as_str());

	state.webhook_verifier.verify(&signing, &body, Utc::now())?;
	let event = parse_event(&body)?;
	let outcome = state.tenancy.handle_event(&event).await?;

	let (label, tenant_id) = describe(&outcome);
	tracing::info!(event_type = %event.event_type(), outcome = label, "webhook processed");
	Ok(Json(WebhookAckResponse {
		event_type: event.event_type().to_string(),
		outcome: label.to_string(),
		tenant_id,
	}))
}
