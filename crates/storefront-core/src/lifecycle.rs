//! Order state machine.
//!
//! Defines the legal transition table and the single atomic
//! apply-transition operation every mutation goes through. The table is
//! one exhaustive match over the event enum, so adding an event without
//! deciding its legality fails to compile.

use crate::engine::OrderWorkflow;
use crate::WorkflowError;
use storefront_storage::StorageError;
use storefront_types::{
	current_timestamp, truncate_id, Order, OrderStatus, PaymentStatus, Principal, StorageKey,
};
use tracing::instrument;

/// A state machine edge with its mutation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionEvent {
	/// A customer attached payment evidence.
	ReceiptAttached { reference: String },
	/// An admin verified the bank transfer.
	AdminConfirmed,
	/// An admin rejected the payment evidence.
	AdminRejected { reason: String },
	/// An admin manually corrected the fulfillment status.
	Override { target: OrderStatus },
}

impl TransitionEvent {
	/// Stable event name used in errors and logs.
	pub fn name(&self) -> &'static str {
		match self {
			TransitionEvent::ReceiptAttached { .. } => "receipt_attached",
			TransitionEvent::AdminConfirmed => "admin_confirmed",
			TransitionEvent::AdminRejected { .. } => "admin_rejected",
			TransitionEvent::Override { .. } => "status_override",
		}
	}
}

/// Resolves the target status for an event fired from `from`.
///
/// Returns None when the edge is not in the legal transition table.
/// The override path is operational tooling: it may move an order
/// anywhere within the operational status set, but never out of the
/// terminal `cancelled` state and never into `pending_review` (review is
/// only entered by attaching evidence).
pub fn transition_target(from: OrderStatus, event: &TransitionEvent) -> Option<OrderStatus> {
	match event {
		TransitionEvent::ReceiptAttached { .. } => {
			matches!(from, OrderStatus::Pending).then_some(OrderStatus::PendingReview)
		},
		TransitionEvent::AdminConfirmed => {
			matches!(from, OrderStatus::PendingReview).then_some(OrderStatus::Processing)
		},
		TransitionEvent::AdminRejected { .. } => {
			matches!(from, OrderStatus::PendingReview).then_some(OrderStatus::Cancelled)
		},
		TransitionEvent::Override { target } => {
			let from_allowed = !matches!(from, OrderStatus::Cancelled);
			let target_allowed = !matches!(target, OrderStatus::PendingReview);
			(from_allowed && target_allowed).then_some(*target)
		},
	}
}

impl OrderWorkflow {
	/// Applies a transition to an order as one atomic conditional update.
	///
	/// The caller states the status it believes the order is in. A
	/// mismatch at read time is an `IllegalTransition` (stale-state logic
	/// error); a mismatch at write time, meaning another writer committed
	/// between our read and our write, is a `Conflict`. The two checks are
	/// complementary: the first catches stale-state logic, the second
	/// catches same-state races. On conflict the engine never retries,
	/// since replaying an admin action is not idempotent.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), event = %event.name(), actor = %actor.id))]
	pub async fn apply_transition(
		&self,
		order_id: &str,
		expected: OrderStatus,
		event: TransitionEvent,
		actor: &Principal,
	) -> Result<Order, WorkflowError> {
		let current = self.read_order(order_id).await?;

		if current.status != expected {
			return Err(WorkflowError::IllegalTransition {
				from: current.status,
				event: event.name().to_string(),
			});
		}

		let target = transition_target(expected, &event).ok_or_else(|| {
			WorkflowError::IllegalTransition {
				from: expected,
				event: event.name().to_string(),
			}
		})?;

		let mut updated = current.clone();
		updated.status = target;
		match &event {
			TransitionEvent::ReceiptAttached { reference } => {
				updated.receipt_reference = Some(reference.clone());
				updated.payment_status = PaymentStatus::Pending;
			},
			TransitionEvent::AdminConfirmed => {
				updated.payment_status = PaymentStatus::Paid;
			},
			TransitionEvent::AdminRejected { .. } => {
				updated.payment_status = PaymentStatus::Failed;
			},
			// Overrides are fulfillment bookkeeping; payment is untouched
			TransitionEvent::Override { .. } => {},
		}
		updated.updated_at = current_timestamp();

		self.storage
			.swap(StorageKey::Orders.as_str(), order_id, &current, &updated)
			.await
			.map_err(|e| match e {
				// Both a changed record and a vanished record mean a
				// concurrent writer got there first.
				StorageError::Conflict | StorageError::NotFound => {
					WorkflowError::Conflict(order_id.to_string())
				},
				other => WorkflowError::Storage(other.to_string()),
			})?;

		tracing::info!(from = %expected, to = %target, "Order transition committed");
		Ok(updated)
	}
}
