// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant repository.
//!
//! Rows are keyed by a UUID `id` stored as text and looked up by the
//! provider's `external_org_id`. Timestamps are RFC 3339 strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use larder_tenancy_core::{ExternalOrgId, NewTenant, Tenant, TenantId, TenantSettingsUpdate};
use serde::Serialize;
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row,
};
use uuid::Uuid;

use crate::error::DbError;

const TENANT_COLUMNS: &str = "id, external_org_id, name, shrink_pct, is_demo, onboarding_completed_at, created_at, updated_at";

#[async_trait]
pub trait TenantStore: Send + Sync {
	async fn get_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DbError>;
	async fn get_by_external_org_id(
		&self,
		external_org_id: &ExternalOrgId,
	) -> Result<Option<Tenant>, DbError>;
	async fn create(&self, tenant: &NewTenant) -> Result<Tenant, DbError>;
	async fn upsert_by_external_org_id(
		&self,
		external_org_id: &ExternalOrgId,
		name: &str,
	) -> Result<Tenant, DbError>;
	async fn update_settings(
		&self,
		id: &TenantId,
		update: &TenantSettingsUpdate,
	) -> Result<Tenant, DbError>;
	async fn complete_onboarding(&self, id: &TenantId, at: DateTime<Utc>) -> Result<Tenant, DbError>;
	async fn delete_by_external_org_id(&self, external_org_id: &ExternalOrgId) -> Result<bool, DbError>;
	async fn owned_record_counts(&self, id: &TenantId) -> Result<OwnedRecordCounts, DbError>;
}

/// Row counts of the business tables hanging off one tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OwnedRecordCounts {
	pub restaurants: i64,
	pub sales: i64,
	pub alerts: i64,
}

/// Repository for tenant rows.
#[derive(Clone)]
pub struct TenantRepository {
	pool: SqlitePool,
}

impl TenantRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn get_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DbError> {
		let row = sqlx::query(&format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| self.row_to_tenant(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(org_id = %external_org_id))]
	pub async fn get_by_external_org_id(
		&self,
		external_org_id: &ExternalOrgId,
	) -> Result<Option<Tenant>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {TENANT_COLUMNS} FROM tenants WHERE external_org_id = ?"
		))
		.bind(external_org_id.as_str())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_tenant(&r)).transpose()
	}

	/// Insert a new tenant.
	///
	/// # Errors
	/// Returns `DbError::Conflict` when a tenant for the same external
	/// organization already exists.
	#[tracing::instrument(skip(self, tenant), fields(org_id = %tenant.external_org_id))]
	pub async fn create(&self, tenant: &NewTenant) -> Result<Tenant, DbError> {
		let id = TenantId::generate();
		let now = Utc::now().to_rfc3339();

		let row = sqlx::query(&format!(
			r#"
			INSERT INTO tenants (id, external_org_id, name, shrink_pct, is_demo, onboarding_completed_at, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, NULL, ?, ?)
			RETURNING {TENANT_COLUMNS}
			"#
		))
		.bind(id.to_string())
		.bind(tenant.external_org_id.as_str())
		.bind(&tenant.name)
		.bind(tenant.shrink_pct)
		.bind(tenant.is_demo as i32)
		.bind(&now)
		.bind(&now)
		.fetch_one(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => DbError::Conflict(
				format!("tenant for organization {} already exists", tenant.external_org_id),
			),
			_ => DbError::Sqlx(e),
		})?;

		let created = self.row_to_tenant(&row)?;
		tracing::debug!(tenant_id = %created.id, org_id = %created.external_org_id, "tenant created");
		Ok(created)
	}

	/// Insert with defaults, or refresh the name of the existing row.
	///
	/// Never fails on an existing row, so provider events and explicit
	/// organization creation can replay it freely.
	#[tracing::instrument(skip(self, name), fields(org_id = %external_org_id))]
	pub async fn upsert_by_external_org_id(
		&self,
		external_org_id: &ExternalOrgId,
		name: &str,
	) -> Result<Tenant, DbError> {
		let new = NewTenant::with_defaults(external_org_id.clone(), name);
		let now = Utc::now().to_rfc3339();

		let row = sqlx::query(&format!(
			r#"
			INSERT INTO tenants (id, external_org_id, name, shrink_pct, is_demo, onboarding_completed_at, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, NULL, ?, ?)
			ON CONFLICT(external_org_id) DO UPDATE SET
				name = excluded.name,
				updated_at = CASE WHEN tenants.name = excluded.name THEN tenants.updated_at ELSE excluded.updated_at END
			RETURNING {TENANT_COLUMNS}
			"#
		))
		.bind(TenantId::generate().to_string())
		.bind(new.external_org_id.as_str())
		.bind(&new.name)
		.bind(new.shrink_pct)
		.bind(new.is_demo as i32)
		.bind(&now)
		.bind(&now)
		.fetch_one(&self.pool)
		.await?;

		let tenant = self.row_to_tenant(&row)?;
		tracing::debug!(tenant_id = %tenant.id, org_id = %tenant.external_org_id, "tenant upserted");
		Ok(tenant)
	}

	#[tracing::instrument(skip(self, update), fields(tenant_id = %id))]
	pub async fn update_settings(
		&self,
		id: &TenantId,
		update: &TenantSettingsUpdate,
	) -> Result<Tenant, DbError> {
		let row = sqlx::query(&format!(
			r#"
			UPDATE tenants
			SET name = COALESCE(?, name),
				shrink_pct = COALESCE(?, shrink_pct),
				updated_at = ?
			WHERE id = ?
			RETURNING {TENANT_COLUMNS}
			"#
		))
		.bind(update.name.as_deref())
		.bind(update.shrink_pct)
		.bind(Utc::now().to_rfc3339())
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(r) => {
				let tenant = self.row_to_tenant(&r)?;
				tracing::debug!(tenant_id = %tenant.id, "tenant settings updated");
				Ok(tenant)
			}
			None => Err(DbError::NotFound(format!("tenant {id}"))),
		}
	}

	/// Stamp onboarding as complete. A tenant that already finished keeps its
	/// original timestamp.
	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn complete_onboarding(
		&self,
		id: &TenantId,
		at: DateTime<Utc>,
	) -> Result<Tenant, DbError> {
		let at = at.to_rfc3339();
		let row = sqlx::query(&format!(
			r#"
			UPDATE tenants
			SET updated_at = CASE WHEN onboarding_completed_at IS NULL THEN ? ELSE updated_at END,
				onboarding_completed_at = COALESCE(onboarding_completed_at, ?)
			WHERE id = ?
			RETURNING {TENANT_COLUMNS}
			"#
		))
		.bind(&at)
		.bind(&at)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(r) => self.row_to_tenant(&r),
			None => Err(DbError::NotFound(format!("tenant {id}"))),
		}
	}

	/// Hard delete. Owned rows go with it through `ON DELETE CASCADE`.
	///
	/// # Returns
	/// `false` if no tenant existed for the organization.
	#[tracing::instrument(skip(self), fields(org_id = %external_org_id))]
	pub async fn delete_by_external_org_id(
		&self,
		external_org_id: &ExternalOrgId,
	) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM tenants WHERE external_org_id = ?")
			.bind(external_org_id.as_str())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::debug!(org_id = %external_org_id, "tenant deleted");
		}
		Ok(deleted)
	}

	#[tracing::instrument(skip(self), fields(tenant_id = %id))]
	pub async fn owned_record_counts(&self, id: &TenantId) -> Result<OwnedRecordCounts, DbError> {
		let row = sqlx::query(
			r#"
			SELECT
				(SELECT COUNT(*) FROM restaurants WHERE tenant_id = ?1) AS restaurants,
				(SELECT COUNT(*) FROM sales WHERE tenant_id = ?1) AS sales,
				(SELECT COUNT(*) FROM alerts WHERE tenant_id = ?1) AS alerts
			"#,
		)
		.bind(id.to_string())
		.fetch_one(&self.pool)
		.await?;

		Ok(OwnedRecordCounts {
			restaurants: row.get("restaurants"),
			sales: row.get("sales"),
			alerts: row.get("alerts"),
		})
	}

	fn row_to_tenant(&self, row: &SqliteRow) -> Result<Tenant, DbError> {
		let id_str: String = row.get("id");
		let is_demo: i32 = row.get("is_demo");
		let onboarding_completed_at: Option<String> = row.get("onboarding_completed_at");
		let created_at: String = row.get("created_at");
		let updated_at: String = row.get("updated_at");

		let id = Uuid::parse_str(&id_str)
			.map_err(|e| DbError::Internal(format!("Invalid tenant ID: {e}")))?;

		Ok(Tenant {
			id: TenantId::new(id),
			external_org_id: ExternalOrgId::new(row.get::<String, _>("external_org_id")),
			name: row.get("name"),
			shrink_pct: row.get("shrink_pct"),
			is_demo: is_demo != 0,
			onboarding_completed_at: onboarding_completed_at
				.map(|s| parse_timestamp(&s, "onboarding_completed_at"))
				.transpose()?,
			created_at: parse_timestamp(&created_at, "created_at")?,
			updated_at: parse_timestamp(&updated_at, "updated_at")?,
		})
	}
}

fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	chrono::DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

#[async_trait]
impl TenantStore for TenantRepository {
	async fn get_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DbError> {
		self.get_by_id(id).await
	}

	async fn get_by_external_org_id(
		&self,
		external_org_id: &ExternalOrgId,
	) -> Result<Option<Tenant>, DbError> {
		self.get_by_external_org_id(external_org_id).await
	}

	async fn create(&self, tenant: &NewTenant) -> Result<Tenant, DbError> {
		self.create(tenant).await
	}

	async fn upsert_by_external_org_id(
		&self,
		external_org_id: &ExternalOrgId,
		name: &str,
	) -> Result<Tenant, DbError> {
		self.upsert_by_external_org_id(external_org_id, name).await
	}

	async fn update_settings(
		&self,
		id: &TenantId,
		update: &TenantSettingsUpdate,
	) -> Result<Tenant, DbError> {
		self.update_settings(id, update).await
	}

	async fn complete_onboarding(&self, id: &TenantId, at: DateTime<Utc>) -> Result<Tenant, DbError> {
		self.complete_onboarding(id, at).await
	}

	async fn delete_by_external_org_id(&self, external_org_id: &ExternalOrgId) -> Result<bool, DbError> {
		self.delete_by_external_org_id(external_org_id).await
	}

	async fn owned_record_counts(&self, id: &TenantId) -> Result<OwnedRecordCounts, DbError> {
		self.owned_record_counts(id).await
	}
}
