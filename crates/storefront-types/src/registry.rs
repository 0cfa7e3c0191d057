//! Registry trait for self-registering implementations.
//!
//! Each pluggable implementation module (storage backend, notifier
//! provider, access-guard provider) exposes a Registry struct implementing
//! this trait, tying its configuration name to its factory function.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this
	/// implementation, e.g. "memory" for `storage.implementations.memory`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory function for this implementation.
	fn factory() -> Self::Factory;
}
