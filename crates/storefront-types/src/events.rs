//! Event types for intra-service communication.
//!
//! Events are published on the workflow event bus after a transition has
//! committed. The notification listener reacts to them, keeping mail
//! delivery decoupled from order state: a failed or slow notification can
//! never affect an already-committed transition.

use crate::{Order, OrderStatus};
use serde::{Deserialize, Serialize};

/// Events emitted by the order workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// An order has been created at checkout.
	Created { order: Order },
	/// A customer attached payment evidence; the order awaits review.
	ReceiptAttached { order: Order },
	/// An admin verified the transfer and confirmed the order.
	Confirmed { order: Order },
	/// An admin rejected the evidence and cancelled the order.
	Rejected { order: Order, reason: String },
	/// An admin manually corrected the fulfillment status.
	StatusOverridden {
		order_id: String,
		from: OrderStatus,
		to: OrderStatus,
	},
}

impl OrderEvent {
	/// The id of the order this event concerns.
	pub fn order_id(&self) -> &str {
		match self {
			OrderEvent::Created { order }
			| OrderEvent::ReceiptAttached { order }
			| OrderEvent::Confirmed { order }
			| OrderEvent::Rejected { order, .. } => &order.id,
			OrderEvent::StatusOverridden { order_id, .. } => order_id,
		}
	}
}
