//! In-memory notification provider.
//!
//! Records every message instead of delivering it. Used as the dev/test
//! sink: tests assert on the recorded outbox, and development setups get
//! an info-level log line per message.

use crate::{Mail, NotifierInterface, NotifyError};
use async_trait::async_trait;
use std::sync::Arc;
use storefront_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use tokio::sync::RwLock;

/// Shared handle to the recorded messages.
pub type Outbox = Arc<RwLock<Vec<Mail>>>;

/// Notification provider that records messages in memory.
pub struct MemoryNotifier {
	outbox: Outbox,
}

impl MemoryNotifier {
	/// Creates a new MemoryNotifier with an empty outbox.
	pub fn new() -> Self {
		Self {
			outbox: Arc::new(RwLock::new(Vec::new())),
		}
	}

	/// Returns a handle to the recorded messages.
	pub fn outbox(&self) -> Outbox {
		Arc::clone(&self.outbox)
	}
}

impl Default for MemoryNotifier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl NotifierInterface for MemoryNotifier {
	async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
		tracing::info!(recipient = %mail.to, subject = %mail.subject, "Recorded notification");
		self.outbox.write().await.push(mail.clone());
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryNotifierSchema)
	}
}

/// Configuration schema for MemoryNotifier.
pub struct MemoryNotifierSchema;

impl ConfigSchema for MemoryNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// The memory notifier has no required configuration
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Registry entry for the memory notifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::NotifierFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl crate::NotifierRegistry for Registry {}

/// Factory function to create a memory notifier from configuration.
pub fn create_notifier(
	_config: &toml::Value,
) -> Result<Box<dyn NotifierInterface>, NotifyError> {
	Ok(Box::new(MemoryNotifier::new()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn records_sent_mail() {
		let notifier = MemoryNotifier::new();
		let outbox = notifier.outbox();

		let mail = Mail {
			to: "a@example.com".into(),
			subject: "subject".into(),
			body: "body".into(),
		};
		notifier.send(&mail).await.unwrap();

		let sent = outbox.read().await;
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0], mail);
	}
}
