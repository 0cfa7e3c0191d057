//! File-based storage backend implementation.
//!
//! Stores one file per record under a namespace directory, providing
//! simple persistence without an external database. Writes go through a
//! temp-file-plus-rename so readers never observe a torn record, and all
//! mutations are serialized behind a store-wide mutex so the conditional
//! write is atomic. An fs2 advisory lock on the store directory claims
//! single-writer ownership across processes at startup.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use fs2::FileExt;
use std::path::{Path, PathBuf};
use storefront_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use tokio::fs;
use tokio::sync::Mutex;

const LOCK_FILE: &str = ".storefront.lock";

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing record files.
	base_path: PathBuf,
	/// Serializes every mutation, making compare-and-swap atomic.
	write_lock: Mutex<()>,
	/// Held for the lifetime of the store; releases on drop.
	_owner_lock: std::fs::File,
}

impl FileStorage {
	/// Opens (or creates) a file store at the given directory.
	///
	/// Fails if another process already owns the directory.
	pub fn new(base_path: PathBuf) -> Result<Self, StorageError> {
		std::fs::create_dir_all(&base_path).map_err(|e| StorageError::Backend(e.to_string()))?;

		let lock_path = base_path.join(LOCK_FILE);
		let owner_lock = std::fs::OpenOptions::new()
			.create(true)
			.write(true)
			.truncate(false)
			.open(&lock_path)
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		owner_lock.try_lock_exclusive().map_err(|_| {
			StorageError::Backend(format!(
				"storage directory {} is already in use by another process",
				base_path.display()
			))
		})?;

		Ok(Self {
			base_path,
			write_lock: Mutex::new(()),
			_owner_lock: owner_lock,
		})
	}

	/// Converts a `namespace:id` key to a filesystem path.
	fn file_path(&self, key: &str) -> PathBuf {
		match key.split_once(':') {
			Some((namespace, id)) => self
				.base_path
				.join(sanitize(namespace))
				.join(format!("{}.bin", sanitize(id))),
			None => self.base_path.join(format!("{}.bin", sanitize(key))),
		}
	}

	async fn read_current(&self, path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
		match fs::read(path).await {
			Ok(data) => Ok(Some(data)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	/// Writes atomically by writing to a temp file then renaming.
	async fn write_atomic(&self, path: &Path, value: Vec<u8>) -> Result<(), StorageError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

/// Replaces path-hostile characters in a key component.
fn sanitize(part: &str) -> String {
	part.replace(['/', '\\', ':'], "_")
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.file_path(key);
		self.read_current(&path)
			.await?
			.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		self.write_atomic(&self.file_path(key), value).await
	}

	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<&[u8]>,
		value: Vec<u8>,
	) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		let path = self.file_path(key);
		let current = self.read_current(&path).await?;

		match (current, expected) {
			(Some(current), Some(expected)) if current.as_slice() == expected => {},
			(Some(_), Some(_)) => return Err(StorageError::Conflict),
			(Some(_), None) => return Err(StorageError::Conflict),
			(None, Some(_)) => return Err(StorageError::NotFound),
			(None, None) => {},
		}

		self.write_atomic(&path, value).await
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		match fs::remove_file(self.file_path(key)).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.read_current(&self.file_path(key)).await?.is_some())
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let (namespace, id_prefix) = match prefix.split_once(':') {
			Some((namespace, rest)) => (namespace, rest),
			None => (prefix, ""),
		};

		let dir = self.base_path.join(sanitize(namespace));
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}
			if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
				if stem.starts_with(id_prefix) {
					keys.push(format!("{}:{}", namespace, stem));
				}
			}
		}
		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![Field::new("storage_path", FieldType::String)], vec![]);
		schema.validate(config)
	}
}

/// Registry entry for the file storage backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: directory the store owns (created if absent)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("storage_path is required".into()))?;

	Ok(Box::new(FileStorage::new(PathBuf::from(path))?))
}
