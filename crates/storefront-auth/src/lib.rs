//! Access guard module for the storefront workflow system.
//!
//! Determines whether a calling principal holds administrator rights.
//! Callers depend only on the `AccessGuardInterface` capability; the
//! service composes independent providers (a configured email allow-list
//! and a persisted role-flag lookup) and grants access if any of them
//! recognizes the principal.

use async_trait::async_trait;
use storefront_types::Principal;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod allowlist;
	pub mod role_flag;
}

/// Errors that can occur during authorization checks.
#[derive(Debug, Error)]
pub enum AuthError {
	/// A provider's backing store could not be queried.
	#[error("Role lookup error: {0}")]
	Lookup(String),
	/// Configuration validation failed.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining a single administrator-rights provider.
#[async_trait]
pub trait AccessGuardInterface: Send + Sync {
	/// Returns true if this provider recognizes the principal as an
	/// administrator.
	async fn is_admin(&self, principal: &Principal) -> Result<bool, AuthError>;
}

/// Service that composes multiple admin-rights providers.
///
/// Providers are consulted in order; the first positive answer wins. A
/// provider that errors is logged and skipped, so an unreachable role
/// store cannot lock out admins the allow-list still recognizes.
pub struct AccessGuardService {
	providers: Vec<Box<dyn AccessGuardInterface>>,
}

impl AccessGuardService {
	/// Creates a new AccessGuardService from the given providers.
	pub fn new(providers: Vec<Box<dyn AccessGuardInterface>>) -> Self {
		Self { providers }
	}

	/// Returns true if any provider recognizes the principal as an admin.
	pub async fn is_admin(&self, principal: &Principal) -> bool {
		for provider in &self.providers {
			match provider.is_admin(principal).await {
				Ok(true) => return true,
				Ok(false) => continue,
				Err(e) => {
					tracing::warn!(
						principal = %principal.id,
						error = %e,
						"Admin-rights provider failed, skipping"
					);
				},
			}
		}
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Fixed(bool);

	#[async_trait]
	impl AccessGuardInterface for Fixed {
		async fn is_admin(&self, _principal: &Principal) -> Result<bool, AuthError> {
			Ok(self.0)
		}
	}

	struct Broken;

	#[async_trait]
	impl AccessGuardInterface for Broken {
		async fn is_admin(&self, _principal: &Principal) -> Result<bool, AuthError> {
			Err(AuthError::Lookup("store unreachable".into()))
		}
	}

	#[tokio::test]
	async fn any_positive_provider_grants() {
		let guard = AccessGuardService::new(vec![Box::new(Fixed(false)), Box::new(Fixed(true))]);
		assert!(guard.is_admin(&Principal::new("a-1", "a@example.com")).await);
	}

	#[tokio::test]
	async fn erroring_provider_is_skipped() {
		let guard = AccessGuardService::new(vec![Box::new(Broken), Box::new(Fixed(true))]);
		assert!(guard.is_admin(&Principal::new("a-1", "a@example.com")).await);
	}

	#[tokio::test]
	async fn default_is_deny() {
		let guard = AccessGuardService::new(vec![Box::new(Fixed(false)), Box::new(Broken)]);
		assert!(!guard.is_admin(&Principal::new("a-1", "a@example.com")).await);
	}
}
