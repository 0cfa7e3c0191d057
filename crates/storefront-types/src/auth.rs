//! Principal identity types.
//!
//! A principal is the already-authenticated caller identity handed down
//! from the HTTP layer. Session issuance and credential verification are
//! external concerns; the workflow only consumes the resolved identity.

use serde::{Deserialize, Serialize};

/// The calling identity for a workflow operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	/// Stable customer/admin identifier.
	pub id: String,
	/// Email address, used for allow-list admin checks.
	pub email: String,
}

impl Principal {
	pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			email: email.into(),
		}
	}
}
