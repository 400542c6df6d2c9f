// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier newtypes and the tenant record.
//!
//! Local tenants are keyed by a random [`TenantId`]. Everything that comes
//! from the identity provider ([`ExternalOrgId`], [`UserId`]) is an opaque
//! provider-issued string and is never parsed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Loss-rate parameter given to every newly created tenant.
pub const DEFAULT_SHRINK_PCT: f64 = 0.1;

/// Longest tenant display name accepted from a settings update.
pub const MAX_TENANT_NAME_LEN: usize = 200;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			pub fn into_inner(self) -> Uuid {
				self.0
			}

			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}
	};
}

macro_rules! define_external_id {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(String);

		impl $name {
			pub fn new(id: impl Into<String>) -> Self {
				Self(id.into())
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}

			pub fn into_inner(self) -> String {
				self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<String> for $name {
			fn from(id: String) -> Self {
				Self(id)
			}
		}

		impl From<&str> for $name {
			fn from(id: &str) -> Self {
				Self(id.to_string())
			}
		}

		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
	};
}

define_id_type!(TenantId, "Local identifier of a tenant. Immutable once issued.");
define_external_id!(ExternalOrgId, "Organization identifier issued by the identity provider.");
define_external_id!(UserId, "User identifier issued by the identity provider.");

// =============================================================================
// Tenant
// =============================================================================

/// The canonical local record for one provider organization.
///
/// Every business table hangs off [`Tenant::id`]; the provider id is only used
/// to find this row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
	pub id: TenantId,
	pub external_org_id: ExternalOrgId,
	pub name: String,
	pub shrink_pct: f64,
	pub is_demo: bool,
	pub onboarding_completed_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Tenant {
	pub fn is_onboarded(&self) -> bool {
		self.onboarding_completed_at.is_some()
	}
}

/// Fields supplied when a tenant row is inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTenant {
	pub external_org_id: ExternalOrgId,
	pub name: String,
	pub shrink_pct: f64,
	pub is_demo: bool,
}

impl NewTenant {
	/// A tenant with the default loss rate and no demo data.
	pub fn with_defaults(external_org_id: ExternalOrgId, name: impl Into<String>) -> Self {
		Self {
			external_org_id,
			name: name.into(),
			shrink_pct: DEFAULT_SHRINK_PCT,
			is_demo: false,
		}
	}
}

/// Partial update to the user-editable tenant settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantSettingsUpdate {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub shrink_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid settings: {0}")]
pub struct InvalidSettings(pub String);

/// Trim a display name and check it is non-empty and not too long.
pub fn normalize_tenant_name(name: &str) -> Result<String, InvalidSettings> {
	let trimmed = name.trim();
	if trimmed.is_empty() {
		return Err(InvalidSettings("name must not be empty".to_string()));
	}
	if trimmed.chars().count() > MAX_TENANT_NAME_LEN {
		return Err(InvalidSettings(format!(
			"name must be at most {MAX_TENANT_NAME_LEN} characters"
		)));
	}
	Ok(trimmed.to_string())
}

impl TenantSettingsUpdate {
	pub fn is_empty(&self) -> bool {
		self.name.is_none() && self.shrink_pct.is_none()
	}

	/// Trims the name and checks both fields.
	pub fn normalized(self) -> Result<Self, InvalidSettings> {
		let name = self.name.as_deref().map(normalize_tenant_name).transpose()?;

		if let Some(pct) = self.shrink_pct {
			if !pct.is_finite() || !(0.0..=1.0).contains(&pct) {
				return Err(InvalidSettings(
					"shrink_pct must be between 0 and 1".to_string(),
				));
			}
		}

		Ok(Self {
			name,
			shrink_pct: self.shrink_pct,
		})
	}
}

// =============================================================================
// Session
// =============================================================================

/// What the identity provider reports about the caller's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
	pub user_id: UserId,
	/// The organization the session is currently bound to, if any.
	pub external_org_id: Option<ExternalOrgId>,
}
