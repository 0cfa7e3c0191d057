//! Configuration module for the storefront workflow system.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files with
//! `${ENV_VAR}` / `${ENV_VAR:-default}` resolution and validates that all
//! required values are properly set before the service starts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the storefront service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this store instance.
	pub store: StoreConfig,
	/// Configuration for the order store backend.
	pub storage: StorageConfig,
	/// Configuration for notification delivery.
	pub notifier: NotifierConfig,
	/// Administrator access configuration.
	pub admin: AdminConfig,
	/// Receipt intake constraints.
	#[serde(default)]
	pub intake: IntakeConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Identity of this store instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
	/// Unique identifier, used in logs.
	pub id: String,
}

/// Configuration for the order store backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for notification delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Upper bound in seconds for a single delivery attempt.
	#[serde(default = "default_send_timeout_secs")]
	pub send_timeout_secs: u64,
	/// Address that receives receipt-submitted notifications.
	pub admin_email: String,
	/// Base URL of the customer order-history page, linked in
	/// confirmation mail.
	pub order_history_url: String,
	/// Map of notifier implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

fn default_send_timeout_secs() -> u64 {
	10
}

/// Administrator access configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminConfig {
	/// Emails that always resolve to administrators.
	#[serde(default)]
	pub allowlist: Vec<String>,
	/// Whether persisted role flags are also consulted.
	#[serde(default = "default_role_flags")]
	pub role_flags: bool,
	/// Reason sent to the customer when a rejection carries none.
	#[serde(default = "default_rejection_reason")]
	pub default_rejection_reason: String,
}

fn default_role_flags() -> bool {
	true
}

fn default_rejection_reason() -> String {
	"Payment could not be verified".to_string()
}

/// Receipt intake constraints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntakeConfig {
	/// Size ceiling for uploaded receipt files, in bytes.
	#[serde(default = "default_max_receipt_bytes")]
	pub max_receipt_bytes: usize,
	/// Allow-listed MIME types for receipt uploads.
	#[serde(default = "default_allowed_content_types")]
	pub allowed_content_types: Vec<String>,
}

impl Default for IntakeConfig {
	fn default() -> Self {
		Self {
			max_receipt_bytes: default_max_receipt_bytes(),
			allowed_content_types: default_allowed_content_types(),
		}
	}
}

fn default_max_receipt_bytes() -> usize {
	5 * 1024 * 1024 // 5 MiB
}

fn default_allowed_content_types() -> Vec<String> {
	[
		"image/jpeg",
		"image/png",
		"image/gif",
		"image/webp",
		"application/pdf",
	]
	.iter()
	.map(|s| s.to_string())
	.collect()
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of the environment variable,
/// and supports fallbacks with `${VAR_NAME:-default_value}`.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => default_value.map(str::to_string).ok_or_else(|| {
				ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name
				))
			})?,
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		raw.parse()
	}

	/// Validates the configuration to ensure all required fields are
	/// properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.store.id.is_empty() {
			return Err(ConfigError::Validation("Store ID cannot be empty".into()));
		}

		// Storage config
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		// Notifier config
		if !self
			.notifier
			.implementations
			.contains_key(&self.notifier.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary notifier '{}' not found in implementations",
				self.notifier.primary
			)));
		}
		if self.notifier.send_timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"notifier.send_timeout_secs must be at least 1".into(),
			));
		}
		if self.notifier.admin_email.is_empty() {
			return Err(ConfigError::Validation(
				"notifier.admin_email cannot be empty".into(),
			));
		}

		// Admin config: at least one way to resolve an administrator
		if self.admin.allowlist.is_empty() && !self.admin.role_flags {
			return Err(ConfigError::Validation(
				"admin section must configure an allowlist or enable role_flags".into(),
			));
		}

		// Intake config
		if self.intake.max_receipt_bytes == 0 {
			return Err(ConfigError::Validation(
				"intake.max_receipt_bytes must be greater than 0".into(),
			));
		}
		if self.intake.allowed_content_types.is_empty() {
			return Err(ConfigError::Validation(
				"intake.allowed_content_types cannot be empty".into(),
			));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string with environment variable
/// resolution, validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
