//! Receipt intake.
//!
//! Accepts an uploaded payment-evidence file from the order's owning
//! customer, validates it, persists the file, and moves the order into
//! review. The file is persisted before the transition is attempted, so a
//! caller that gives up mid-upload leaves no partial order mutation; the
//! admin notification fires only after the transition has committed.

use crate::engine::OrderWorkflow;
use crate::lifecycle::TransitionEvent;
use crate::WorkflowError;
use storefront_types::{
	truncate_id, Order, OrderEvent, OrderStatus, Principal, ReceiptUpload, StorageKey,
};
use tracing::instrument;
use uuid::Uuid;

impl OrderWorkflow {
	fn validate_upload(&self, upload: &ReceiptUpload) -> Result<(), WorkflowError> {
		let intake = &self.config.intake;

		if !intake
			.allowed_content_types
			.iter()
			.any(|allowed| allowed.eq_ignore_ascii_case(&upload.content_type))
		{
			return Err(WorkflowError::Validation(format!(
				"unsupported receipt type '{}'",
				upload.content_type
			)));
		}

		if upload.data.is_empty() {
			return Err(WorkflowError::Validation("receipt file is empty".into()));
		}

		if upload.data.len() > intake.max_receipt_bytes {
			return Err(WorkflowError::Validation(format!(
				"receipt file of {} bytes exceeds the {} byte limit",
				upload.data.len(),
				intake.max_receipt_bytes
			)));
		}

		Ok(())
	}

	/// Attaches payment evidence to a pending order.
	///
	/// Only the order's owner may attach a receipt, and only while the
	/// order is `pending`: receipts are immutable once accepted, so a
	/// second upload is rejected as an illegal transition. On success the
	/// order lands in `pending_review` and the configured admin address
	/// is notified fire-and-forget.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), owner = %owner.id))]
	pub async fn attach_receipt(
		&self,
		order_id: &str,
		owner: &Principal,
		upload: ReceiptUpload,
	) -> Result<Order, WorkflowError> {
		self.validate_upload(&upload)?;

		let order = self.read_order(order_id).await?;

		if order.owner_id != owner.id {
			return Err(WorkflowError::Forbidden(
				"receipts may only be attached to your own orders".into(),
			));
		}

		if order.status != OrderStatus::Pending {
			return Err(WorkflowError::IllegalTransition {
				from: order.status,
				event: "receipt_attached".to_string(),
			});
		}

		// Persist the evidence first; the transition only fires once the
		// upload is durably stored.
		let reference = Uuid::new_v4().to_string();
		self.storage
			.store_raw(StorageKey::ReceiptFiles.as_str(), &reference, upload.data)
			.await
			.map_err(|e| WorkflowError::Storage(e.to_string()))?;

		let updated = self
			.apply_transition(
				order_id,
				OrderStatus::Pending,
				TransitionEvent::ReceiptAttached { reference },
				owner,
			)
			.await?;

		self.event_bus
			.publish(OrderEvent::ReceiptAttached {
				order: updated.clone(),
			})
			.ok();

		Ok(updated)
	}

	/// Returns the stored bytes of an order's receipt.
	pub async fn receipt_file(&self, reference: &str) -> Result<Vec<u8>, WorkflowError> {
		self.storage
			.retrieve_raw(StorageKey::ReceiptFiles.as_str(), reference)
			.await
			.map_err(|e| match e {
				storefront_storage::StorageError::NotFound => {
					WorkflowError::NotFound(reference.to_string())
				},
				other => WorkflowError::Storage(other.to_string()),
			})
	}
}
