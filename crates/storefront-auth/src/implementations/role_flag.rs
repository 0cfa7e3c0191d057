//! Persisted role-flag admin-rights provider.
//!
//! Looks up an "is admin" flag stored per principal id. An absent record
//! means the principal holds no role; a storage fault is surfaced as a
//! lookup error so the composing service can fall back to other providers.

use crate::{AccessGuardInterface, AuthError};
use async_trait::async_trait;
use std::sync::Arc;
use storefront_storage::{StorageError, StorageService};
use storefront_types::{Principal, StorageKey};

/// Admin-rights provider backed by persisted role flags.
pub struct RoleFlagGuard {
	storage: Arc<StorageService>,
}

impl RoleFlagGuard {
	/// Creates a new RoleFlagGuard over the given storage service.
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Persists the admin flag for a principal.
	pub async fn grant_role(&self, principal_id: &str) -> Result<(), AuthError> {
		self.storage
			.store(StorageKey::AdminRoles.as_str(), principal_id, &true)
			.await
			.map_err(|e| AuthError::Lookup(e.to_string()))
	}

	/// Removes the admin flag for a principal.
	pub async fn revoke_role(&self, principal_id: &str) -> Result<(), AuthError> {
		self.storage
			.remove(StorageKey::AdminRoles.as_str(), principal_id)
			.await
			.map_err(|e| AuthError::Lookup(e.to_string()))
	}
}

#[async_trait]
impl AccessGuardInterface for RoleFlagGuard {
	async fn is_admin(&self, principal: &Principal) -> Result<bool, AuthError> {
		match self
			.storage
			.retrieve::<bool>(StorageKey::AdminRoles.as_str(), &principal.id)
			.await
		{
			Ok(flag) => Ok(flag),
			Err(StorageError::NotFound) => Ok(false),
			Err(e) => Err(AuthError::Lookup(e.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::implementations::memory::MemoryStorage;

	fn guard() -> RoleFlagGuard {
		RoleFlagGuard::new(Arc::new(StorageService::new(Box::new(
			MemoryStorage::new(),
		))))
	}

	#[tokio::test]
	async fn grant_and_revoke_round_trip() {
		let guard = guard();
		let principal = Principal::new("a-1", "someone@example.com");

		assert!(!guard.is_admin(&principal).await.unwrap());

		guard.grant_role("a-1").await.unwrap();
		assert!(guard.is_admin(&principal).await.unwrap());

		guard.revoke_role("a-1").await.unwrap();
		assert!(!guard.is_admin(&principal).await.unwrap());
	}
}
