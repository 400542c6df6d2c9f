// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named actions a member may be allowed to perform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Role;

/// A named action, rendered as `resource:verb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Permission {
	DashboardView,
	RestaurantsView,
	ProductsView,
	SalesView,
	ForecastsView,
	InventoryView,
	AlertsView,

	RestaurantsCreate,
	RestaurantsEdit,
	ProductsCreate,
	ProductsEdit,
	IngredientsCreate,
	IngredientsEdit,

	RestaurantsDelete,
	ProductsDelete,
	IngredientsDelete,

	InventoryEdit,

	InventoryImport,
	SalesImport,
	ProductsImport,
	RestaurantsImport,

	AlertsResolve,

	ForecastsGenerate,
	RecommendationsAccept,
	ReportsGenerate,

	SettingsView,
	SettingsEdit,

	UsersInvite,
	UsersChangeRole,
}

impl Permission {
	pub fn all() -> &'static [Permission] {
		use Permission::*;
		&[
			DashboardView,
			RestaurantsView,
			ProductsView,
			SalesView,
			ForecastsView,
			InventoryView,
			AlertsView,
			RestaurantsCreate,
			RestaurantsEdit,
			ProductsCreate,
			ProductsEdit,
			IngredientsCreate,
			IngredientsEdit,
			RestaurantsDelete,
			ProductsDelete,
			IngredientsDelete,
			InventoryEdit,
			InventoryImport,
			SalesImport,
			ProductsImport,
			RestaurantsImport,
			AlertsResolve,
			ForecastsGenerate,
			RecommendationsAccept,
			ReportsGenerate,
			SettingsView,
			SettingsEdit,
			UsersInvite,
			UsersChangeRole,
		]
	}

	pub fn as_str(&self) -> &'static str {
		use Permission::*;
		match self {
			DashboardView => "dashboard:view",
			RestaurantsView => "restaurants:view",
			ProductsView => "products:view",
			SalesView => "sales:view",
			ForecastsView => "forecasts:view",
			InventoryView => "inventory:view",
			AlertsView => "alerts:view",
			RestaurantsCreate => "restaurants:create",
			RestaurantsEdit => "restaurants:edit",
			ProductsCreate => "products:create",
			ProductsEdit => "products:edit",
			IngredientsCreate => "ingredients:create",
			IngredientsEdit => "ingredients:edit",
			RestaurantsDelete => "restaurants:delete",
			ProductsDelete => "products:delete",
			IngredientsDelete => "ingredients:delete",
			InventoryEdit => "inventory:edit",
			InventoryImport => "inventory:import",
			SalesImport => "sales:import",
			ProductsImport => "products:import",
			RestaurantsImport => "restaurants:import",
			AlertsResolve => "alerts:resolve",
			ForecastsGenerate => "forecasts:generate",
			RecommendationsAccept => "recommendations:accept",
			ReportsGenerate => "reports:generate",
			SettingsView => "settings:view",
			SettingsEdit => "settings:edit",
			UsersInvite => "users:invite",
			UsersChangeRole => "users:change_role",
		}
	}

	/// Lowest role allowed to perform this action.
	///
	/// Roles are totally ordered, so every role above the minimum inherits the
	/// permission.
	pub fn minimum_role(&self) -> Role {
		use Permission::*;
		match self {
			DashboardView | RestaurantsView | ProductsView | SalesView | ForecastsView
			| InventoryView | AlertsView => Role::Staff,

			InventoryEdit | AlertsResolve => Role::Staff,

			RestaurantsCreate | RestaurantsEdit | ProductsCreate | ProductsEdit
			| IngredientsCreate | IngredientsEdit => Role::Manager,

			ForecastsGenerate | RecommendationsAccept | ReportsGenerate | SettingsView => {
				Role::Manager
			}

			RestaurantsDelete | ProductsDelete | IngredientsDelete => Role::Admin,

			InventoryImport | SalesImport | ProductsImport | RestaurantsImport => Role::Admin,

			SettingsEdit | UsersInvite | UsersChangeRole => Role::Admin,
		}
	}
}

impl fmt::Display for Permission {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct ParsePermissionError(pub String);

impl FromStr for Permission {
	type Err = ParsePermissionError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Permission::all()
			.iter()
			.copied()
			.find(|p| p.as_str() == s)
			.ok_or_else(|| ParsePermissionError(s.to_string()))
	}
}

impl From<Permission> for String {
	fn from(p: Permission) -> Self {
		p.as_str().to_string()
	}
}

impl TryFrom<String> for Permission {
	type Error = ParsePermissionError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		s.parse()
	}
}
