// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the Larder server.
//!
//! Sources are applied lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file (`/etc/larder/server.toml` unless another path is given)
//! 3. Environment variables (`LARDER_SERVER_*`)
//!
//! ```ignore
//! let config = larder_server_config::load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub identity: IdentityConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Defaults, the system TOML file, then the process environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	])
}

/// Same as [`load_config`] with a different TOML file.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		identity: layer.identity.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	};

	validate_config(&config)?;

	info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		identity_api = %config.identity.api_url,
		identity_timeout_secs = config.identity.request_timeout.as_secs(),
		secret_key_configured = config.identity.secret_key.is_some(),
		webhook_secret_configured = config.identity.webhook_secret.is_some(),
		"Server configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &ServerConfig) -> Result<(), ConfigError> {
	if config.identity.request_timeout.is_zero() {
		return Err(ConfigError::Validation(
			"identity request timeout must be at least one second".to_string(),
		));
	}
	if config.identity.session_cookie_name.trim().is_empty() {
		return Err(ConfigError::Validation(
			"session cookie name must not be empty".to_string(),
		));
	}
	if !config.database.url.starts_with("sqlite:") {
		return Err(ConfigError::InvalidValue {
			key: "database.url".to_string(),
			message: format!("expected a sqlite: URL, got '{}'", config.database.url),
		});
	}
	Ok(())
}
