// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory pools for tests.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::migrations::run_migrations;

/// A migrated in-memory database.
///
/// Pinned to one connection that never idles out, since every new in-memory
/// connection would see an empty database.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:")
		.unwrap()
		.foreign_keys(true);
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(options)
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

/// Inserts one restaurant, one sale and one alert owned by `tenant_id`.
pub async fn seed_owned_records(pool: &SqlitePool, tenant_id: &str) {
	let now = chrono::Utc::now().to_rfc3339();
	let restaurant_id = uuid::Uuid::new_v4().to_string();

	sqlx::query("INSERT INTO restaurants (id, tenant_id, name, created_at) VALUES (?, ?, ?, ?)")
		.bind(&restaurant_id)
		.bind(tenant_id)
		.bind("Main Street")
		.bind(&now)
		.execute(pool)
		.await
		.unwrap();

	sqlx::query(
		"INSERT INTO sales (id, tenant_id, restaurant_id, sold_on, quantity, created_at) VALUES (?, ?, ?, ?, ?, ?)",
	)
	.bind(uuid::Uuid::new_v4().to_string())
	.bind(tenant_id)
	.bind(&restaurant_id)
	.bind("2025-01-01")
	.bind(12.0_f64)
	.bind(&now)
	.execute(pool)
	.await
	.unwrap();

	sqlx::query(
		"INSERT INTO alerts (id, tenant_id, restaurant_id, kind, message, created_at) VALUES (?, ?, ?, ?, ?, ?)",
	)
	.bind(uuid::Uuid::new_v4().to_string())
	.bind(tenant_id)
	.bind(&restaurant_id)
	.bind("low_stock")
	.bind("Flour below par")
	.bind(&now)
	.execute(pool)
	.await
	.unwrap();
}

/// Total rows across the owned tables for `tenant_id`.
pub async fn count_owned_records(pool: &SqlitePool, tenant_id: &str) -> i64 {
	let mut total = 0;
	for table in ["restaurants", "sales", "alerts"] {
		let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE tenant_id = ?"))
			.bind(tenant_id)
			.fetch_one(pool)
			.await
			.unwrap();
		total += n;
	}
	total
}
