// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use larder_server_db::DbError;
use larder_server_identity::ProviderError;
use larder_tenancy_core::{Denial, InvalidSettings, Permission};

/// Client-facing message for a provider 4xx.
pub const PROVIDER_REJECTED: &str = "the identity provider rejected the request";

/// Failures surfaced by tenancy operations.
///
/// Provider failures during resolution never show up here as
/// `ProviderUnavailable`; they degrade to `NoTenantSelected` or to the staff
/// role. `ProviderUnavailable` is only returned by provider mutations and by
/// session lookup.
#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
	#[error("not authenticated")]
	NotAuthenticated,

	#[error("no organization selected")]
	NoTenantSelected,

	#[error("not a member of this organization")]
	NotMember,

	#[error("missing permission: {0}")]
	PermissionDenied(Permission),

	#[error("identity provider unavailable: {0}")]
	ProviderUnavailable(#[source] ProviderError),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("invalid request: {0}")]
	Validation(String),

	#[error(transparent)]
	Store(#[from] DbError),
}

impl TenancyError {
	/// Stable machine-readable code.
	pub fn code(&self) -> &'static str {
		match self {
			TenancyError::NotAuthenticated => "not_authenticated",
			TenancyError::NoTenantSelected => "no_tenant_selected",
			TenancyError::NotMember => "not_member",
			TenancyError::PermissionDenied(_) => Denial::CODE,
			TenancyError::ProviderUnavailable(_) => "provider_unavailable",
			TenancyError::NotFound(_) => "not_found",
			TenancyError::Validation(_) => "invalid_request",
			TenancyError::Store(DbError::Conflict(_)) => "store_conflict",
			TenancyError::Store(_) => "internal_error",
		}
	}

	/// Classify a failed provider mutation.
	///
	/// The provider's own wording stays in the logs; callers only see
	/// [`PROVIDER_REJECTED`].
	pub(crate) fn from_provider(err: ProviderError) -> Self {
		match err {
			ProviderError::NotFound(what) => TenancyError::NotFound(what),
			ProviderError::Api { status, message } if status < 500 => {
				tracing::warn!(status, provider_message = %message, "identity provider rejected request");
				TenancyError::Validation(PROVIDER_REJECTED.to_string())
			}
			other => TenancyError::ProviderUnavailable(other),
		}
	}
}

impl From<Denial> for TenancyError {
	fn from(denial: Denial) -> Self {
		TenancyError::PermissionDenied(denial.permission)
	}
}

impl From<InvalidSettings> for TenancyError {
	fn from(err: InvalidSettings) -> Self {
		TenancyError::Validation(err.0)
	}
}
