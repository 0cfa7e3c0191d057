//! Event bus for intra-service communication.
//!
//! A thin wrapper over a tokio broadcast channel. The workflow publishes
//! an event after each committed transition; the notification listener
//! (and any other observer) subscribes. Publishing never blocks and never
//! fails the publishing operation: with no subscribers the event is
//! simply dropped.

use storefront_types::OrderEvent;
use tokio::sync::broadcast;

/// Broadcast bus carrying workflow events.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<OrderEvent>,
}

impl EventBus {
	/// Creates a new event bus with the given channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns the number of subscribers the event reached; an error means
	/// there were none, which callers may ignore.
	pub fn publish(&self, event: OrderEvent) -> Result<usize, broadcast::error::SendError<OrderEvent>> {
		self.sender.send(event)
	}

	/// Creates a new subscription receiving all future events.
	pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
		self.sender.subscribe()
	}
}
