// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

/// Create a SqlitePool with WAL mode and foreign keys enforced.
///
/// Tenant deletion relies on `ON DELETE CASCADE`, so foreign keys are always
/// switched on.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./larder.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;
	tracing::debug!("database pool created");
	Ok(pool)
}

/// Round-trip a trivial query.
pub async fn health_check(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query("SELECT 1").execute(pool).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn creates_file_database() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("larder.db").display());
		let pool = create_pool(&url).await.unwrap();

		let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(fk, 1);
	}

	#[tokio::test]
	async fn health_check_succeeds_on_open_pool() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("larder.db").display());
		let pool = create_pool(&url).await.unwrap();
		health_check(&pool).await.unwrap();
	}

	#[tokio::test]
	async fn rejects_bad_url() {
		let err = create_pool("postgres://nope").await.unwrap_err();
		assert!(matches!(err, DbError::Internal(_)));
	}
}
