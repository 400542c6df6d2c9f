// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session authentication middleware.
//!
//! The session token comes from the configured cookie or an
//! `Authorization: Bearer` header and is exchanged with the identity provider
//! for a [`SessionContext`]. Handlers read the result through [`RequireAuth`].

use axum::{
	body::Body,
	extract::{FromRequestParts, State},
	http::{header, request::Parts, HeaderMap, Request},
	middleware::Next,
	response::{IntoResponse, Response},
};
use larder_server_identity::ProviderError;
use larder_server_tenancy::TenancyError;
use larder_tenancy_core::SessionContext;
use tracing::instrument;

use crate::{api::AppState, error::ServerError};

/// Outcome of authenticating one request.
#[derive(Debug, Clone)]
pub enum AuthContext {
	Authenticated(SessionContext),
	Unauthenticated,
	/// A token was presented but the provider could not be asked about it.
	ProviderUnavailable,
}

#[instrument(
	name = "auth_layer",
	skip(state, request, next),
	fields(
		auth_method = tracing::field::Empty,
		user_id = tracing::field::Empty,
	)
)]
pub async fn auth_layer(
	State(state): State<AppState>,
	mut request: Request<Body>,
	next: Next,
) -> Response {
	let headers = request.headers();
	let span = tracing::Span::current();

	let token = match extract_session_cookie_with_name(headers, &state.session_cookie_name) {
		Some(token) => {
			span.record("auth_method", "cookie");
			Some(token)
		}
		None => extract_bearer_token(headers).inspect(|_| {
			span.record("auth_method", "bearer");
		}),
	};

	let ctx = match token {
		None => AuthContext::Unauthenticated,
		Some(token) => match state.tenancy.session_context(&token).await {
			Ok(session) => {
				span.record("user_id", tracing::field::display(&session.user_id));
				AuthContext::Authenticated(session)
			}
			Err(TenancyError::ProviderUnavailable(_)) => AuthContext::ProviderUnavailable,
			Err(_) => AuthContext::Unauthenticated,
		},
	};

	request.extensions_mut().insert(ctx);
	next.run(request).await
}

/// Extractor that rejects unauthenticated requests.
///
/// Responds 401 without a valid session and 503 when the provider could not
/// validate the presented token.
pub struct RequireAuth(pub SessionContext);

impl<S> FromRequestParts<S> for RequireAuth
where
	S: Send + Sync,
{
	type Rejection = Response;

	#[instrument(name = "RequireAuth::from_request_parts", skip_all)]
	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let ctx = parts
			.extensions
			.get::<AuthContext>()
			.cloned()
			.unwrap_or(AuthContext::Unauthenticated);

		match ctx {
			AuthContext::Authenticated(session) => Ok(RequireAuth(session)),
			AuthContext::Unauthenticated => {
				tracing::debug!("authentication required: no valid session");
				Err(ServerError::from(TenancyError::NotAuthenticated).into_response())
			}
			AuthContext::ProviderUnavailable => Err(ServerError::from(TenancyError::ProviderUnavailable(
				ProviderError::Unavailable("session could not be validated".to_string()),
			))
			.into_response()),
		}
	}
}

/// Read a named cookie from the `Cookie` header.
pub fn extract_session_cookie_with_name(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
	cookies.split(';').find_map(|pair| {
		let (name, value) = pair.trim().split_once('=')?;
		(name == cookie_name && !value.is_empty()).then(|| value.to_string())
	})
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
	let token = value.strip_prefix("Bearer ")?.trim();
	(!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
		let mut h = HeaderMap::new();
		h.insert(name, HeaderValue::from_str(value).unwrap());
		h
	}

	mod cookies {
		use super::*;

		#[test]
		fn finds_named_cookie_among_others() {
			let h = headers(header::COOKIE, "theme=dark; larder_session=sess_1; lang=en");
			assert_eq!(
				extract_session_cookie_with_name(&h, "larder_session"),
				Some("sess_1".to_string())
			);
		}

		#[test]
		fn other_name_is_ignored() {
			let h = headers(header::COOKIE, "larder_session=sess_1");
			assert_eq!(extract_session_cookie_with_name(&h, "__session"), None);
		}

		#[test]
		fn empty_value_is_none() {
			let h = headers(header::COOKIE, "larder_session=");
			assert_eq!(extract_session_cookie_with_name(&h, "larder_session"), None);
		}

		#[test]
		fn no_header() {
			assert_eq!(extract_session_cookie_with_name(&HeaderMap::new(), "larder_session"), None);
		}

		proptest::proptest! {
			#[test]
			fn token_found_wherever_it_sits(
				token in "[A-Za-z0-9_]{1,40}",
				before in proptest::collection::vec("[a-z]{1,8}=[a-z0-9]{0,8}", 0..4),
				after in proptest::collection::vec("[a-z]{1,8}=[a-z0-9]{0,8}", 0..4),
			) {
				let mut parts = before;
				parts.push(format!("larder_session={token}"));
				parts.extend(after);
				let h = headers(header::COOKIE, &parts.join("; "));
				proptest::prop_assert_eq!(
					extract_session_cookie_with_name(&h, "larder_session"),
					Some(token)
				);
			}
		}
	}

	mod bearer {
		use super::*;

		#[test]
		fn strips_prefix() {
			let h = headers(header::AUTHORIZATION, "Bearer sess_2");
			assert_eq!(extract_bearer_token(&h), Some("sess_2".to_string()));
		}

		#[test]
		fn other_schemes_are_ignored() {
			let h = headers(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
			assert_eq!(extract_bearer_token(&h), None);
		}

		#[test]
		fn blank_token_is_none() {
			let h = headers(header::AUTHORIZATION, "Bearer   ");
			assert_eq!(extract_bearer_token(&h), None);
		}
	}
}
