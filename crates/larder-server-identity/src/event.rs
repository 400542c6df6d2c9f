// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization lifecycle events pushed by the provider.

use larder_tenancy_core::{normalize_tenant_name, ExternalOrgId};
use serde::Deserialize;

use crate::provider::ProviderOrganization;
use crate::webhook::WebhookError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationEvent {
	Created(ProviderOrganization),
	Updated(ProviderOrganization),
	Deleted { id: ExternalOrgId },
	/// Any other event type. Acknowledged and dropped.
	Ignored { event_type: String },
}

impl OrganizationEvent {
	pub fn event_type(&self) -> &str {
		match self {
			OrganizationEvent::Created(_) => "organization.created",
			OrganizationEvent::Updated(_) => "organization.updated",
			OrganizationEvent::Deleted { .. } => "organization.deleted",
			OrganizationEvent::Ignored { event_type } => event_type,
		}
	}

	pub fn org_id(&self) -> Option<&ExternalOrgId> {
		match self {
			OrganizationEvent::Created(org) | OrganizationEvent::Updated(org) => Some(&org.id),
			OrganizationEvent::Deleted { id } => Some(id),
			OrganizationEvent::Ignored { .. } => None,
		}
	}
}

#[derive(Debug, Deserialize)]
struct RawEvent {
	#[serde(rename = "type")]
	event_type: String,
	#[serde(default)]
	data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OrganizationData {
	id: String,
	name: String,
}

#[derive(Debug, Deserialize)]
struct DeletedData {
	id: Option<String>,
}

/// Parse a verified webhook body.
pub fn parse_event(payload: &[u8]) -> Result<OrganizationEvent, WebhookError> {
	let raw: RawEvent =
		serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

	let org = |data: serde_json::Value| -> Result<ProviderOrganization, WebhookError> {
		let data: OrganizationData = serde_json::from_value(data)
			.map_err(|e| WebhookError::InvalidPayload(format!("{}: {e}", raw.event_type)))?;
		if data.id.is_empty() {
			return Err(WebhookError::InvalidPayload(format!("{} without id", raw.event_type)));
		}
		let name = normalize_tenant_name(&data.name)
			.map_err(|e| WebhookError::InvalidPayload(format!("{}: {}", raw.event_type, e.0)))?;
		Ok(ProviderOrganization {
			id: ExternalOrgId::new(data.id),
			name,
		})
	};

	match raw.event_type.as_str() {
		"organization.created" => Ok(OrganizationEvent::Created(org(raw.data)?)),
		"organization.updated" => Ok(OrganizationEvent::Updated(org(raw.data)?)),
		"organization.deleted" => {
			let data: DeletedData = serde_json::from_value(raw.data)
				.map_err(|e| WebhookError::InvalidPayload(format!("organization.deleted: {e}")))?;
			let id = data.id.filter(|id| !id.is_empty()).ok_or_else(|| {
				WebhookError::InvalidPayload("organization.deleted without id".to_string())
			})?;
			Ok(OrganizationEvent::Deleted {
				id: ExternalOrgId::new(id),
			})
		}
		other => Ok(OrganizationEvent::Ignored {
			event_type: other.to_string(),
		}),
	}
}
