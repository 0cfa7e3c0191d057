//! Transactional notification module for the storefront workflow system.
//!
//! This module handles the delivery of customer- and admin-facing mail.
//! Delivery is strictly fire-and-forget from the workflow's perspective:
//! the notifier is only ever invoked after a state transition has
//! committed, every send carries a bounded timeout, and failures are
//! logged rather than propagated, so a slow or dead mail provider can
//! never corrupt or block order state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use storefront_types::{truncate_id, ConfigSchema, ImplementationRegistry};
use thiserror::Error;

pub mod templates;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
	pub mod webhook;
}

/// Errors that can occur during notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// The provider failed to deliver the message.
	#[error("Delivery error: {0}")]
	Delivery(String),
	/// The provider did not answer within the bounded timeout.
	#[error("Delivery timed out after {0}s")]
	Timeout(u64),
	/// Configuration validation failed.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A rendered transactional message ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mail {
	/// Recipient address.
	pub to: String,
	/// Subject line; carries the order number for transactional mail.
	pub subject: String,
	/// Plain-text body.
	pub body: String,
}

/// Trait defining the interface for notification providers.
#[async_trait]
pub trait NotifierInterface: Send + Sync {
	/// Delivers a single message.
	async fn send(&self, mail: &Mail) -> Result<(), NotifyError>;

	/// Returns the configuration schema for this provider.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for notifier factory functions.
pub type NotifierFactory = fn(&toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError>;

/// Registry trait for notifier implementations.
pub trait NotifierRegistry: ImplementationRegistry<Factory = NotifierFactory> {}

/// Get all registered notifier implementations.
pub fn get_all_implementations() -> Vec<(&'static str, NotifierFactory)> {
	use implementations::{memory, webhook};

	vec![
		(memory::Registry::NAME, memory::Registry::factory()),
		(webhook::Registry::NAME, webhook::Registry::factory()),
	]
}

/// Service that manages notification delivery through one provider.
///
/// Wraps the provider with a bounded timeout and offers a fire-and-forget
/// dispatch used by the workflow's notification listener.
pub struct NotifierService {
	/// The underlying provider implementation.
	provider: Box<dyn NotifierInterface>,
	/// Upper bound on a single delivery attempt.
	send_timeout: Duration,
}

impl NotifierService {
	/// Creates a new NotifierService with the specified provider.
	pub fn new(provider: Box<dyn NotifierInterface>, send_timeout: Duration) -> Self {
		Self {
			provider,
			send_timeout,
		}
	}

	/// Delivers a message, bounding the attempt by the configured timeout.
	pub async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
		match tokio::time::timeout(self.send_timeout, self.provider.send(mail)).await {
			Ok(result) => result,
			Err(_) => Err(NotifyError::Timeout(self.send_timeout.as_secs())),
		}
	}

	/// Dispatches a message without blocking the caller.
	///
	/// Spawns a delivery task; failure and timeout are logged with the
	/// order id and never reach the caller.
	pub fn dispatch(self: Arc<Self>, order_id: &str, mail: Mail) {
		let notifier = self;
		let order_id = order_id.to_string();
		tokio::spawn(async move {
			if let Err(e) = notifier.send(&mail).await {
				tracing::warn!(
					order_id = %truncate_id(&order_id),
					recipient = %mail.to,
					error = %e,
					"Notification delivery failed"
				);
			}
		});
	}
}
