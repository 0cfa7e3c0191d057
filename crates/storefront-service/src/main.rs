//! Main entry point for the storefront service.
//!
//! This binary wires the order workflow engine to its pluggable
//! collaborators (storage backends, notification providers) and serves
//! the HTTP API until interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_config::Config;
use storefront_core::{WorkflowBuilder, WorkflowFactories};

mod server;

/// Command-line arguments for the storefront service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Builds the factory maps for all implementations this binary links.
fn default_factories() -> WorkflowFactories {
	WorkflowFactories {
		storage_factories: storefront_storage::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
		notifier_factories: storefront_notify::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect(),
	}
}

/// Main entry point for the storefront service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the workflow engine with all implementations
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

	fmt().with_env_filter(env_filter).with_target(true).init();

	tracing::info!("Started storefront service");

	// Load configuration
	let config = Config::from_file(args.config.to_str().unwrap()).await?;
	tracing::info!("Loaded configuration [{}]", config.store.id);

	let api_config = config.api.clone();

	// Build the workflow engine with implementations
	let workflow = Arc::new(WorkflowBuilder::new(config).build(default_factories())?);
	workflow.spawn_notification_listener();

	let api_enabled = api_config.as_ref().is_some_and(|api| api.enabled);
	if !api_enabled {
		tracing::warn!("API server disabled in configuration; nothing to serve");
		return Ok(());
	}

	tokio::select! {
		result = server::start_server(api_config.unwrap(), Arc::clone(&workflow)) => {
			tracing::info!("API server finished");
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Shutdown signal received");
		}
	}

	tracing::info!("Stopped storefront service");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_CONFIG: &str = r#"
[store]
id = "test-service"

[storage]
primary = "memory"
[storage.implementations.memory]

[notifier]
primary = "memory"
admin_email = "orders@example.com"
order_history_url = "https://shop.example.com/account/orders"
[notifier.implementations.memory]

[admin]
allowlist = ["root@example.com"]

[api]
enabled = true
"#;

	#[test]
	fn test_args_default_values() {
		let args = Args {
			config: PathBuf::from("config.toml"),
			log_level: "info".to_string(),
		};

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_default_factories_cover_linked_implementations() {
		let factories = default_factories();

		assert!(factories.storage_factories.contains_key("memory"));
		assert!(factories.storage_factories.contains_key("file"));
		assert!(factories.notifier_factories.contains_key("memory"));
		assert!(factories.notifier_factories.contains_key("webhook"));
	}

	#[tokio::test]
	async fn test_build_workflow_from_config() {
		let config: Config = TEST_CONFIG.parse().unwrap();

		let workflow = WorkflowBuilder::new(config)
			.build(default_factories())
			.expect("workflow builds from minimal config");

		assert_eq!(workflow.config().store.id, "test-service");
	}

	#[tokio::test]
	async fn test_build_workflow_with_file_storage() {
		let dir = tempfile::tempdir().unwrap();
		let config_str = TEST_CONFIG.replace(
			"primary = \"memory\"\n[storage.implementations.memory]",
			&format!(
				"primary = \"file\"\n[storage.implementations.file]\nstorage_path = \"{}\"",
				dir.path().display()
			),
		);

		let config: Config = config_str.parse().unwrap();
		let workflow = WorkflowBuilder::new(config)
			.build(default_factories())
			.expect("workflow builds with file storage");

		assert_eq!(workflow.config().storage.primary, "file");
	}

	#[tokio::test]
	async fn test_unknown_backend_is_config_error() {
		let config_str = TEST_CONFIG.replace(
			"primary = \"memory\"\n[storage.implementations.memory]",
			"primary = \"redis\"\n[storage.implementations.redis]",
		);

		let config: Config = config_str.parse().unwrap();
		let result = WorkflowBuilder::new(config).build(default_factories());

		assert!(matches!(
			result,
			Err(storefront_core::WorkflowError::Config(_))
		));
	}
}
