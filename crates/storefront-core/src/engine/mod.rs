//! Order workflow engine.
//!
//! The OrderWorkflow struct holds the external collaborators and exposes
//! the workflow operations implemented across the sibling modules:
//! checkout, receipt intake, admin review, and the query surface. Each
//! operation is a short-lived transaction against the order store; no
//! persistent in-process workflow state exists.

pub mod event_bus;

use crate::WorkflowError;
use self::event_bus::EventBus;
use std::sync::Arc;
use storefront_auth::AccessGuardService;
use storefront_config::Config;
use storefront_notify::{templates, NotifierService};
use storefront_storage::{StorageError, StorageService};
use storefront_types::{Order, OrderEvent, StorageKey};
use tokio::sync::broadcast;

/// Size of the event-bus channel.
///
/// Events are small and consumed promptly by the notification listener;
/// the capacity only matters when the listener falls behind.
const EVENT_BUS_CAPACITY: usize = 1000;

/// Main workflow engine coordinating the order lifecycle.
///
/// The order record is the only shared mutable resource. It is owned
/// exclusively by the order store, and all mutation goes through the
/// apply-transition operation in `lifecycle`.
pub struct OrderWorkflow {
	/// Service configuration.
	pub(crate) config: Config,
	/// Order store service.
	pub(crate) storage: Arc<StorageService>,
	/// Notification delivery service.
	pub(crate) notifier: Arc<NotifierService>,
	/// Administrator rights resolution.
	pub(crate) access_guard: Arc<AccessGuardService>,
	/// Event bus for post-commit side effects.
	pub(crate) event_bus: EventBus,
}

impl OrderWorkflow {
	/// Creates a new workflow engine over the given collaborators.
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		notifier: Arc<NotifierService>,
		access_guard: Arc<AccessGuardService>,
	) -> Self {
		Self {
			config,
			storage,
			notifier,
			access_guard,
			event_bus: EventBus::new(EVENT_BUS_CAPACITY),
		}
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns a reference to the storage service.
	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	/// Returns a reference to the event bus.
	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Starts the notification listener.
	///
	/// The listener subscribes to the event bus and dispatches the
	/// corresponding transactional mail for each committed transition.
	/// It runs until the workflow is dropped. Because it only ever sees
	/// events published after a commit, mail delivery can neither block
	/// nor roll back a transition.
	pub fn spawn_notification_listener(&self) {
		let mut receiver = self.event_bus.subscribe();
		let notifier = Arc::clone(&self.notifier);
		let admin_email = self.config.notifier.admin_email.clone();
		let history_url = self.config.notifier.order_history_url.clone();

		tokio::spawn(async move {
			loop {
				match receiver.recv().await {
					Ok(event) => {
						let order_id = event.order_id().to_string();
						let mail = match &event {
							OrderEvent::ReceiptAttached { order } => {
								Some(templates::receipt_submitted(order, &admin_email))
							},
							OrderEvent::Confirmed { order } => {
								Some(templates::order_confirmed(order, &history_url))
							},
							OrderEvent::Rejected { order, reason } => {
								Some(templates::order_rejected(order, reason))
							},
							// Creation and overrides carry no mail
							OrderEvent::Created { .. } | OrderEvent::StatusOverridden { .. } => None,
						};

						if let Some(mail) = mail {
							Arc::clone(&notifier).dispatch(&order_id, mail);
						}
					},
					Err(broadcast::error::RecvError::Lagged(missed)) => {
						tracing::warn!(missed, "Notification listener lagged, mail dropped");
					},
					Err(broadcast::error::RecvError::Closed) => break,
				}
			}
		});
	}

	/// Reads an order, mapping the store's absence error to the workflow
	/// taxonomy.
	pub(crate) async fn read_order(&self, order_id: &str) -> Result<Order, WorkflowError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => WorkflowError::NotFound(order_id.to_string()),
				other => WorkflowError::Storage(other.to_string()),
			})
	}
}
