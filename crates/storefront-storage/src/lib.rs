//! Order store module for the storefront workflow system.
//!
//! This module provides abstractions for persistent storage of workflow
//! data. The store is the single owner of the shared mutable order record,
//! and its compare-and-swap primitive is the sole ordering mechanism for
//! concurrent transitions: a write only commits if the record still holds
//! the bytes the writer read, so racing writers cannot both succeed.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use storefront_types::{ConfigSchema, ImplementationRegistry};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// A requested record is not found.
	#[error("Not found")]
	NotFound,
	/// A conditional write lost a race: the record no longer holds the
	/// expected prior value.
	#[error("Conditional write conflict")]
	Conflict,
	/// Serialization or deserialization failed.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// The storage backend failed.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Configuration validation failed.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Backends provide raw key-value operations plus an atomic conditional
/// write. Keys are flat strings of the form `namespace:id`.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, creating or overwriting unconditionally.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Atomically replaces the value at `key` only if it currently holds
	/// `expected`.
	///
	/// `expected = None` asserts the key does not exist (insert
	/// semantics). Returns `Conflict` when the current value differs from
	/// the expectation, and `NotFound` when a value was expected but the
	/// key is absent. The comparison and the write are atomic with respect
	/// to every other mutation of this backend.
	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<&[u8]>,
		value: Vec<u8>,
	) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists all keys starting with the given prefix.
	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations, used by the workflow builder to wire up the backend
/// named in the configuration.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

fn make_key(namespace: &str, id: &str) -> String {
	format!("{}:{}", namespace, id)
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level backend and provides convenient
/// methods for storing and retrieving typed data with automatic JSON
/// serialization, plus the conditional-update operations the lifecycle
/// engine builds its race protection on.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn encode<T: Serialize>(data: &T) -> Result<Vec<u8>, StorageError> {
		serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
		serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Stores a serializable value, creating or overwriting it.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes = Self::encode(data)?;
		self.backend.set_bytes(&make_key(namespace, id), bytes).await
	}

	/// Inserts a serializable value, failing with `Conflict` if the record
	/// already exists.
	pub async fn insert<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes = Self::encode(data)?;
		self.backend
			.compare_and_swap(&make_key(namespace, id), None, bytes)
			.await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&make_key(namespace, id)).await?;
		Self::decode(&bytes)
	}

	/// Retrieves and deserializes every record in a namespace.
	///
	/// Records deleted between the key scan and the read are skipped.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		let prefix = format!("{}:", namespace);
		let keys = self.backend.keys(&prefix).await?;

		let mut records = Vec::with_capacity(keys.len());
		for key in keys {
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => records.push(Self::decode(&bytes)?),
				Err(StorageError::NotFound) => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(records)
	}

	/// Updates an existing value in storage.
	///
	/// Returns `NotFound` if the record doesn't exist, making it
	/// semantically different from store() which creates or overwrites.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = make_key(namespace, id);
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}
		let bytes = Self::encode(data)?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Conditionally replaces a record: the write commits only if the
	/// stored record still equals `expected`.
	///
	/// Both sides are serialized and compared byte-for-byte, giving
	/// optimistic concurrency over the whole prior record. A caller whose
	/// expectation is stale receives `Conflict` and must re-read before
	/// retrying.
	pub async fn swap<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		expected: &T,
		replacement: &T,
	) -> Result<(), StorageError> {
		let expected_bytes = Self::encode(expected)?;
		let replacement_bytes = Self::encode(replacement)?;
		self.backend
			.compare_and_swap(
				&make_key(namespace, id),
				Some(&expected_bytes),
				replacement_bytes,
			)
			.await
	}

	/// Stores raw bytes (uploaded files) without JSON encoding.
	pub async fn store_raw(
		&self,
		namespace: &str,
		id: &str,
		data: Vec<u8>,
	) -> Result<(), StorageError> {
		self.backend.set_bytes(&make_key(namespace, id), data).await
	}

	/// Retrieves raw bytes stored with `store_raw`.
	pub async fn retrieve_raw(&self, namespace: &str, id: &str) -> Result<Vec<u8>, StorageError> {
		self.backend.get_bytes(&make_key(namespace, id)).await
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&make_key(namespace, id)).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&make_key(namespace, id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::implementations::memory::MemoryStorage;
	use super::*;
	use serde::{Deserialize, Serialize};

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Record {
		name: String,
		count: u32,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn swap_commits_when_expectation_holds() {
		let storage = service();
		let v1 = Record {
			name: "a".into(),
			count: 1,
		};
		let v2 = Record {
			name: "a".into(),
			count: 2,
		};

		storage.store("records", "r1", &v1).await.unwrap();
		storage.swap("records", "r1", &v1, &v2).await.unwrap();

		let stored: Record = storage.retrieve("records", "r1").await.unwrap();
		assert_eq!(stored, v2);
	}

	#[tokio::test]
	async fn swap_with_stale_expectation_conflicts() {
		let storage = service();
		let v1 = Record {
			name: "a".into(),
			count: 1,
		};
		let v2 = Record {
			name: "a".into(),
			count: 2,
		};
		let v3 = Record {
			name: "a".into(),
			count: 3,
		};

		storage.store("records", "r1", &v1).await.unwrap();
		storage.swap("records", "r1", &v1, &v2).await.unwrap();

		// Second writer still expects v1
		let result = storage.swap("records", "r1", &v1, &v3).await;
		assert!(matches!(result, Err(StorageError::Conflict)));

		let stored: Record = storage.retrieve("records", "r1").await.unwrap();
		assert_eq!(stored, v2);
	}

	#[tokio::test]
	async fn insert_refuses_existing_record() {
		let storage = service();
		let v1 = Record {
			name: "a".into(),
			count: 1,
		};

		storage.insert("records", "r1", &v1).await.unwrap();
		let result = storage.insert("records", "r1", &v1).await;
		assert!(matches!(result, Err(StorageError::Conflict)));
	}

	#[tokio::test]
	async fn swap_on_missing_record_is_not_found() {
		let storage = service();
		let v1 = Record {
			name: "a".into(),
			count: 1,
		};
		let result = storage.swap("records", "missing", &v1, &v1).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn retrieve_all_scans_one_namespace() {
		let storage = service();
		for i in 0..3u32 {
			let record = Record {
				name: format!("r{}", i),
				count: i,
			};
			storage
				.store("records", &format!("r{}", i), &record)
				.await
				.unwrap();
		}
		storage
			.store(
				"other",
				"x",
				&Record {
					name: "x".into(),
					count: 99,
				},
			)
			.await
			.unwrap();

		let records: Vec<Record> = storage.retrieve_all("records").await.unwrap();
		assert_eq!(records.len(), 3);
		assert!(records.iter().all(|r| r.count < 3));
	}

	#[tokio::test]
	async fn raw_round_trip() {
		let storage = service();
		let bytes = vec![0xff, 0xd8, 0xff, 0xe0];
		storage
			.store_raw("receipt_files", "f1", bytes.clone())
			.await
			.unwrap();
		assert_eq!(
			storage.retrieve_raw("receipt_files", "f1").await.unwrap(),
			bytes
		);
	}
}
