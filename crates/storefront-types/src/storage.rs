//! Storage namespace keys for the storefront system.

use std::str::FromStr;

/// Storage namespaces for different data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Namespace for order records.
	Orders,
	/// Namespace for per-order line item records.
	LineItems,
	/// Namespace for uploaded receipt file bytes.
	ReceiptFiles,
	/// Namespace for persisted admin role flags.
	AdminRoles,
}

impl StorageKey {
	/// Returns the string representation of the storage namespace.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::LineItems => "line_items",
			StorageKey::ReceiptFiles => "receipt_files",
			StorageKey::AdminRoles => "admin_roles",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Orders,
			Self::LineItems,
			Self::ReceiptFiles,
			Self::AdminRoles,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"orders" => Ok(Self::Orders),
			"line_items" => Ok(Self::LineItems),
			"receipt_files" => Ok(Self::ReceiptFiles),
			"admin_roles" => Ok(Self::AdminRoles),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
