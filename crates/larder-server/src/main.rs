// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Larder server binary.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use larder_server::{create_app_state, create_router, version};
use larder_server_identity::{ClerkClient, ClerkConfig, WebhookVerifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Larder server - tenancy and access control for restaurant organizations.
#[derive(Parser, Debug)]
#[command(name = "larder-server", about = "Larder tenancy server", version)]
struct Args {
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = larder_server_config::load_config()?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		identity_api = %config.identity.api_url,
		"starting larder-server"
	);

	let pool = larder_server_db::create_pool(&config.database.url).await?;
	larder_server_db::run_migrations(&pool).await?;

	let provider = ClerkClient::new(ClerkConfig {
		api_url: config.identity.api_url.clone(),
		secret_key: config.identity.require_secret_key()?.clone(),
		timeout: config.identity.request_timeout,
	})?;
	let verifier = WebhookVerifier::new(config.identity.require_webhook_secret()?)?;

	let state = create_app_state(pool, Arc::new(provider), verifier, &config);
	let app = create_router(state);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	tracing::info!("server shutdown complete");
	Ok(())
}
