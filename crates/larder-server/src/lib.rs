// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP surface of the Larder server.
//!
//! Exposes tenant resolution, permission checks, tenant settings, membership
//! management and the identity provider webhook.

pub mod api;
pub mod api_docs;
pub mod auth_middleware;
pub mod error;
pub mod health;
pub mod routes;
pub mod version;

pub use api::{create_app_state, create_router, AppState};
pub use error::{ErrorResponse, ServerError};
