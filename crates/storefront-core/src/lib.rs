//! Core order workflow engine for the storefront system.
//!
//! This module owns the order lifecycle: the state machine definition and
//! its atomic apply-transition operation, receipt intake, the admin review
//! surface, checkout, and the read-only query projections. It coordinates
//! the external collaborators (order store, notifier, access guard) and
//! keeps notification delivery decoupled from order state through an
//! event bus.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storefront_auth::implementations::{allowlist::AllowlistGuard, role_flag::RoleFlagGuard};
use storefront_auth::{AccessGuardInterface, AccessGuardService};
use storefront_config::Config;
use storefront_notify::{NotifierFactory, NotifierService};
use storefront_storage::{StorageFactory, StorageService};
use storefront_types::OrderStatus;
use thiserror::Error;

pub mod checkout;
pub mod engine;
pub mod intake;
pub mod lifecycle;
pub mod query;
pub mod review;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::OrderWorkflow;
pub use lifecycle::TransitionEvent;
pub use review::ReviewOutcome;

/// Errors returned by workflow operations.
///
/// Every operation returns one of these as a typed result; nothing is
/// thrown as an uncaught fault. The workflow performs no automatic retry
/// on `Conflict`: retry, if desired, belongs to the calling layer with a
/// fresh state read.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
	/// The referenced order or resource does not exist.
	#[error("Order not found: {0}")]
	NotFound(String),
	/// The caller lacks the rights for this operation.
	#[error("Forbidden: {0}")]
	Forbidden(String),
	/// Malformed input: bad file type or size, missing required fields.
	#[error("Validation error: {0}")]
	Validation(String),
	/// The event is not legal from the order's current status.
	#[error("Illegal transition: {event} is not legal from {from}")]
	IllegalTransition { from: OrderStatus, event: String },
	/// A concurrent writer committed first; re-read before retrying.
	#[error("Concurrent update conflict on order {0}")]
	Conflict(String),
	/// The order store failed.
	#[error("Storage error: {0}")]
	Storage(String),
	/// The workflow could not be assembled from its configuration.
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Concrete factories for the pluggable collaborators.
///
/// The service binary fills this in with the implementations it links,
/// keyed by the names used in the configuration file.
pub struct WorkflowFactories {
	pub storage_factories: HashMap<String, StorageFactory>,
	pub notifier_factories: HashMap<String, NotifierFactory>,
}

/// Builder for constructing an OrderWorkflow with pluggable implementations.
pub struct WorkflowBuilder {
	config: Config,
}

impl WorkflowBuilder {
	/// Creates a new WorkflowBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the OrderWorkflow using the configured factories.
	///
	/// Creates the storage backend and notifier provider named in the
	/// configuration, validates each implementation's config against its
	/// own schema, and composes the access guard from the allow-list and
	/// role-flag providers.
	pub fn build(self, factories: WorkflowFactories) -> Result<OrderWorkflow, WorkflowError> {
		let config = self.config;

		// Storage backend
		let primary = &config.storage.primary;
		let storage_config = config
			.storage
			.implementations
			.get(primary)
			.ok_or_else(|| WorkflowError::Config(format!("Missing storage config '{}'", primary)))?;
		let factory = factories
			.storage_factories
			.get(primary)
			.ok_or_else(|| WorkflowError::Config(format!("Unknown storage backend '{}'", primary)))?;
		let backend = factory(storage_config).map_err(|e| {
			WorkflowError::Config(format!("Failed to create storage backend '{}': {}", primary, e))
		})?;
		backend.config_schema().validate(storage_config).map_err(|e| {
			WorkflowError::Config(format!("Invalid storage config '{}': {}", primary, e))
		})?;
		let storage = Arc::new(StorageService::new(backend));
		tracing::info!(component = "storage", implementation = %primary, "Loaded");

		// Notifier provider
		let primary = &config.notifier.primary;
		let notifier_config = config
			.notifier
			.implementations
			.get(primary)
			.ok_or_else(|| WorkflowError::Config(format!("Missing notifier config '{}'", primary)))?;
		let factory = factories
			.notifier_factories
			.get(primary)
			.ok_or_else(|| WorkflowError::Config(format!("Unknown notifier '{}'", primary)))?;
		let provider = factory(notifier_config).map_err(|e| {
			WorkflowError::Config(format!("Failed to create notifier '{}': {}", primary, e))
		})?;
		provider.config_schema().validate(notifier_config).map_err(|e| {
			WorkflowError::Config(format!("Invalid notifier config '{}': {}", primary, e))
		})?;
		let notifier = Arc::new(NotifierService::new(
			provider,
			Duration::from_secs(config.notifier.send_timeout_secs),
		));
		tracing::info!(component = "notifier", implementation = %primary, "Loaded");

		// Access guard: allow-list plus persisted role flags
		let mut providers: Vec<Box<dyn AccessGuardInterface>> = Vec::new();
		if !config.admin.allowlist.is_empty() {
			providers.push(Box::new(AllowlistGuard::new(config.admin.allowlist.clone())));
		}
		if config.admin.role_flags {
			providers.push(Box::new(RoleFlagGuard::new(storage.clone())));
		}
		let access_guard = Arc::new(AccessGuardService::new(providers));
		tracing::info!(component = "access_guard", "Loaded");

		Ok(OrderWorkflow::new(config, storage, notifier, access_guard))
	}
}
