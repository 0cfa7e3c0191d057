//! Admin review surface.
//!
//! Confirm/reject operations over the lifecycle engine, gated by the
//! access guard. Both pin their expected prior status to `pending_review`,
//! which makes double-confirmation and confirm-after-reject impossible
//! independent of the store's compare-and-swap protection. Customer mail
//! is dispatched fire-and-forget after the transition commits; the
//! outcome of an operation is determined solely by whether the state
//! change committed.

use crate::engine::OrderWorkflow;
use crate::lifecycle::TransitionEvent;
use crate::WorkflowError;
use storefront_types::{truncate_id, Order, OrderEvent, OrderStatus, Principal};
use tracing::instrument;

/// Result of a confirmation request.
#[derive(Debug, Clone)]
pub enum ReviewOutcome {
	/// The transition committed; the customer is being notified.
	Confirmed(Order),
	/// The order was already confirmed earlier; nothing changed and no
	/// second mail goes out.
	AlreadyConfirmed(Order),
}

impl ReviewOutcome {
	/// The order in its post-operation state.
	pub fn order(&self) -> &Order {
		match self {
			ReviewOutcome::Confirmed(order) | ReviewOutcome::AlreadyConfirmed(order) => order,
		}
	}

	/// True when the request was absorbed as a repeat.
	pub fn is_repeat(&self) -> bool {
		matches!(self, ReviewOutcome::AlreadyConfirmed(_))
	}
}

impl OrderWorkflow {
	async fn require_admin(&self, principal: &Principal) -> Result<(), WorkflowError> {
		if self.access_guard.is_admin(principal).await {
			Ok(())
		} else {
			Err(WorkflowError::Forbidden(
				"administrator rights required".into(),
			))
		}
	}

	/// Confirms a reviewed order: payment becomes `paid`, fulfillment
	/// moves to `processing`, and the customer receives a confirmation.
	///
	/// Confirmation links get re-delivered by mail clients and double
	/// clicks, so a repeat on an order that is already `processing` is
	/// absorbed as a no-op success instead of surfacing the illegal
	/// transition. This is the one deliberate exception in the error
	/// contract.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), admin = %admin.id))]
	pub async fn confirm_order(
		&self,
		order_id: &str,
		admin: &Principal,
	) -> Result<ReviewOutcome, WorkflowError> {
		self.require_admin(admin).await?;

		match self
			.apply_transition(
				order_id,
				OrderStatus::PendingReview,
				TransitionEvent::AdminConfirmed,
				admin,
			)
			.await
		{
			Ok(order) => {
				self.event_bus
					.publish(OrderEvent::Confirmed {
						order: order.clone(),
					})
					.ok();
				Ok(ReviewOutcome::Confirmed(order))
			},
			Err(WorkflowError::IllegalTransition { .. }) => {
				let order = self.read_order(order_id).await?;
				if order.status == OrderStatus::Processing {
					tracing::debug!("Repeated confirmation absorbed as no-op");
					Ok(ReviewOutcome::AlreadyConfirmed(order))
				} else {
					Err(WorkflowError::IllegalTransition {
						from: order.status,
						event: "admin_confirmed".to_string(),
					})
				}
			},
			Err(e) => Err(e),
		}
	}

	/// Rejects a reviewed order: payment becomes `failed`, the order is
	/// cancelled, and the customer receives the reason.
	///
	/// An empty or absent reason falls back to the configured default.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), admin = %admin.id))]
	pub async fn reject_order(
		&self,
		order_id: &str,
		admin: &Principal,
		reason: Option<String>,
	) -> Result<Order, WorkflowError> {
		self.require_admin(admin).await?;

		let reason = reason
			.filter(|r| !r.trim().is_empty())
			.unwrap_or_else(|| self.config.admin.default_rejection_reason.clone());

		let order = self
			.apply_transition(
				order_id,
				OrderStatus::PendingReview,
				TransitionEvent::AdminRejected {
					reason: reason.clone(),
				},
				admin,
			)
			.await?;

		self.event_bus
			.publish(OrderEvent::Rejected {
				order: order.clone(),
				reason,
			})
			.ok();

		Ok(order)
	}

	/// Manually overrides an order's fulfillment status.
	///
	/// Operational bookkeeping for shipping/delivery corrections: still
	/// CAS-protected against concurrent writers, but free to move between
	/// operational statuses. Sends no mail and never touches the payment
	/// state.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), admin = %admin.id, target = %target))]
	pub async fn override_status(
		&self,
		order_id: &str,
		admin: &Principal,
		target: OrderStatus,
	) -> Result<Order, WorkflowError> {
		self.require_admin(admin).await?;

		let current = self.read_order(order_id).await?;
		let from = current.status;

		let order = self
			.apply_transition(order_id, from, TransitionEvent::Override { target }, admin)
			.await?;

		self.event_bus
			.publish(OrderEvent::StatusOverridden {
				order_id: order_id.to_string(),
				from,
				to: target,
			})
			.ok();

		Ok(order)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil;
	use storefront_types::PaymentStatus;

	#[tokio::test]
	async fn confirm_marks_paid_and_mails_customer() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;

		let outcome = harness
			.workflow
			.confirm_order(&order.id, &testutil::admin())
			.await
			.unwrap();

		assert!(!outcome.is_repeat());
		assert_eq!(outcome.order().status, OrderStatus::Processing);
		assert_eq!(outcome.order().payment_status, PaymentStatus::Paid);

		let mail = harness.sent_mail().await;
		// Receipt-submitted mail to the admin, confirmation to the customer
		assert_eq!(mail.len(), 2);
		assert!(mail
			.iter()
			.any(|m| m.to == "ada@example.com" && m.body.contains("account/orders")));
	}

	#[tokio::test]
	async fn repeated_confirm_is_noop_without_second_mail() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;

		harness
			.workflow
			.confirm_order(&order.id, &testutil::admin())
			.await
			.unwrap();
		let second = harness
			.workflow
			.confirm_order(&order.id, &testutil::admin())
			.await
			.unwrap();

		assert!(second.is_repeat());
		assert_eq!(second.order().status, OrderStatus::Processing);

		let mail = harness.sent_mail().await;
		assert_eq!(mail.len(), 2, "no duplicate confirmation mail");
	}

	#[tokio::test]
	async fn reject_cancels_with_reason() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;

		let rejected = harness
			.workflow
			.reject_order(&order.id, &testutil::admin(), Some("amount mismatch".into()))
			.await
			.unwrap();

		assert_eq!(rejected.status, OrderStatus::Cancelled);
		assert_eq!(rejected.payment_status, PaymentStatus::Failed);

		let mail = harness.sent_mail().await;
		assert_eq!(mail.len(), 2);
		assert!(mail.iter().any(|m| m.body.contains("amount mismatch")));
	}

	#[tokio::test]
	async fn reject_without_reason_uses_default() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;

		harness
			.workflow
			.reject_order(&order.id, &testutil::admin(), None)
			.await
			.unwrap();

		let mail = harness.sent_mail().await;
		assert!(mail
			.iter()
			.any(|m| m.body.contains("Payment could not be verified")));
	}

	#[tokio::test]
	async fn confirm_after_reject_is_illegal() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;

		harness
			.workflow
			.reject_order(&order.id, &testutil::admin(), None)
			.await
			.unwrap();

		let result = harness
			.workflow
			.confirm_order(&order.id, &testutil::admin())
			.await;
		assert!(matches!(
			result,
			Err(WorkflowError::IllegalTransition {
				from: OrderStatus::Cancelled,
				..
			})
		));
	}

	#[tokio::test]
	async fn review_on_pending_order_is_illegal() {
		let harness = testutil::harness().await;
		let order = harness.pending_order().await;

		assert!(matches!(
			harness
				.workflow
				.confirm_order(&order.id, &testutil::admin())
				.await,
			Err(WorkflowError::IllegalTransition { .. })
		));
		assert!(matches!(
			harness
				.workflow
				.reject_order(&order.id, &testutil::admin(), None)
				.await,
			Err(WorkflowError::IllegalTransition { .. })
		));

		let stored = harness.workflow.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::Pending);
		assert_eq!(stored.payment_status, PaymentStatus::Unpaid);
	}

	#[tokio::test]
	async fn non_admin_is_forbidden_untouched() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;

		let result = harness
			.workflow
			.confirm_order(&order.id, &testutil::non_admin())
			.await;
		assert!(matches!(result, Err(WorkflowError::Forbidden(_))));

		let stored = harness.workflow.get_order(&order.id).await.unwrap();
		assert_eq!(stored.status, OrderStatus::PendingReview);
	}

	#[tokio::test]
	async fn override_moves_fulfillment_without_payment() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;
		harness
			.workflow
			.confirm_order(&order.id, &testutil::admin())
			.await
			.unwrap();

		let shipped = harness
			.workflow
			.override_status(&order.id, &testutil::admin(), OrderStatus::Shipped)
			.await
			.unwrap();
		assert_eq!(shipped.status, OrderStatus::Shipped);
		assert_eq!(shipped.payment_status, PaymentStatus::Paid);

		// Overrides are mail-silent
		let mail = harness.sent_mail().await;
		assert_eq!(mail.len(), 2);
	}

	#[tokio::test]
	async fn override_cannot_leave_cancelled() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;
		harness
			.workflow
			.reject_order(&order.id, &testutil::admin(), None)
			.await
			.unwrap();

		let result = harness
			.workflow
			.override_status(&order.id, &testutil::admin(), OrderStatus::Processing)
			.await;
		assert!(matches!(
			result,
			Err(WorkflowError::IllegalTransition { .. })
		));
	}

	#[tokio::test]
	async fn concurrent_review_settles_exactly_once() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;

		let confirm = {
			let workflow = harness.workflow.clone();
			let order_id = order.id.clone();
			tokio::spawn(async move {
				workflow
					.confirm_order(&order_id, &testutil::admin())
					.await
					.map(|_| ())
			})
		};
		let reject = {
			let workflow = harness.workflow.clone();
			let order_id = order.id.clone();
			tokio::spawn(async move {
				workflow
					.reject_order(&order_id, &testutil::admin(), None)
					.await
					.map(|_| ())
			})
		};

		let confirm = confirm.await.unwrap();
		let reject = reject.await.unwrap();

		// Exactly one admin action wins
		assert!(
			confirm.is_ok() != reject.is_ok(),
			"confirm: {:?}, reject: {:?}",
			confirm,
			reject
		);

		// The loser saw a typed error, never a silent double-apply
		let loser = if confirm.is_ok() { reject.clone() } else { confirm.clone() };
		assert!(matches!(
			loser,
			Err(WorkflowError::Conflict(_)) | Err(WorkflowError::IllegalTransition { .. })
		));

		// Final state is consistent with the winner, never mixed
		let stored = harness.workflow.get_order(&order.id).await.unwrap();
		match stored.status {
			OrderStatus::Processing => {
				assert!(confirm.is_ok());
				assert_eq!(stored.payment_status, PaymentStatus::Paid);
			},
			OrderStatus::Cancelled => {
				assert!(reject.is_ok());
				assert_eq!(stored.payment_status, PaymentStatus::Failed);
			},
			other => panic!("unexpected final status {}", other),
		}
	}
}
