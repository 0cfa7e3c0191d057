//! HTTP mail-gateway notification provider.
//!
//! Posts rendered messages as JSON to a configured gateway endpoint
//! (e.g. an internal mail relay or a hosted transactional-mail HTTP API).
//! Actual SMTP delivery is the gateway's concern.

use crate::{Mail, NotifierInterface, NotifyError};
use async_trait::async_trait;
use storefront_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

/// Notification provider that forwards mail to an HTTP gateway.
pub struct WebhookNotifier {
	client: reqwest::Client,
	endpoint: String,
	auth_token: Option<String>,
}

impl WebhookNotifier {
	pub fn new(endpoint: String, auth_token: Option<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			endpoint,
			auth_token,
		}
	}
}

#[async_trait]
impl NotifierInterface for WebhookNotifier {
	async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
		let mut request = self.client.post(&self.endpoint).json(mail);
		if let Some(token) = &self.auth_token {
			request = request.bearer_auth(token);
		}

		let response = request
			.send()
			.await
			.map_err(|e| NotifyError::Delivery(e.to_string()))?;

		if !response.status().is_success() {
			return Err(NotifyError::Delivery(format!(
				"gateway returned {}",
				response.status()
			)));
		}

		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WebhookNotifierSchema)
	}
}

/// Configuration schema for WebhookNotifier.
pub struct WebhookNotifierSchema;

impl ConfigSchema for WebhookNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("endpoint", FieldType::String)],
			vec![Field::new("auth_token", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Registry entry for the webhook notifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "webhook";
	type Factory = crate::NotifierFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl crate::NotifierRegistry for Registry {}

/// Factory function to create a webhook notifier from configuration.
///
/// Configuration parameters:
/// - `endpoint`: gateway URL to POST messages to
/// - `auth_token`: optional bearer token
pub fn create_notifier(config: &toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError> {
	let endpoint = config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| NotifyError::Configuration("endpoint is required".into()))?;

	let auth_token = config
		.get("auth_token")
		.and_then(|v| v.as_str())
		.map(str::to_string);

	Ok(Box::new(WebhookNotifier::new(
		endpoint.to_string(),
		auth_token,
	)))
}
