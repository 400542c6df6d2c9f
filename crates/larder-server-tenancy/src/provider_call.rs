// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::future::Future;
use std::time::Duration;

use larder_server_identity::ProviderError;

/// Run a provider call with an upper bound on how long it may take.
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, ProviderError>
where
	F: Future<Output = Result<T, ProviderError>>,
{
	match tokio::time::timeout(timeout, call).await {
		Ok(result) => result,
		Err(_) => Err(ProviderError::Timeout(timeout)),
	}
}
