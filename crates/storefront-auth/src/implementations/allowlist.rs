//! Allow-list admin-rights provider.
//!
//! Recognizes administrators by a configured set of email addresses.
//! Matching is case-insensitive, since mail addresses arrive in whatever
//! casing the upstream session layer preserved.

use crate::{AccessGuardInterface, AuthError};
use async_trait::async_trait;
use std::collections::HashSet;
use storefront_types::Principal;

/// Admin-rights provider backed by a static email allow-list.
pub struct AllowlistGuard {
	emails: HashSet<String>,
}

impl AllowlistGuard {
	/// Creates a new AllowlistGuard from configured addresses.
	pub fn new(emails: impl IntoIterator<Item = String>) -> Self {
		Self {
			emails: emails
				.into_iter()
				.map(|e| e.trim().to_ascii_lowercase())
				.collect(),
		}
	}
}

#[async_trait]
impl AccessGuardInterface for AllowlistGuard {
	async fn is_admin(&self, principal: &Principal) -> Result<bool, AuthError> {
		Ok(self.emails.contains(&principal.email.to_ascii_lowercase()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn matches_case_insensitively() {
		let guard = AllowlistGuard::new(vec!["Root@Example.com".to_string()]);

		assert!(guard
			.is_admin(&Principal::new("a-1", "root@example.com"))
			.await
			.unwrap());
		assert!(guard
			.is_admin(&Principal::new("a-1", "ROOT@EXAMPLE.COM"))
			.await
			.unwrap());
		assert!(!guard
			.is_admin(&Principal::new("c-1", "customer@example.com"))
			.await
			.unwrap());
	}
}
