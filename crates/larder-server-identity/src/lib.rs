// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gateway to the hosted identity provider.
//!
//! Larder does not own users, sessions or organization membership. This crate
//! puts those queries behind the [`IdentityProvider`] trait, provides a
//! reqwest-backed [`ClerkClient`], and verifies and parses the provider's
//! organization webhooks.

pub mod clerk;
pub mod error;
pub mod event;
pub mod provider;
pub mod webhook;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clerk::{ClerkClient, ClerkConfig};
pub use error::ProviderError;
pub use event::{parse_event, OrganizationEvent};
pub use provider::{IdentityProvider, ProviderInvitation, ProviderMembership, ProviderOrganization};
pub use webhook::{WebhookError, WebhookHeaders, WebhookVerifier};
