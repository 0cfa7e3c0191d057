//! Order creation.
//!
//! Checkout validates the cart snapshot handed over by the (external)
//! cart layer, fixes the monetary totals, and persists the order with its
//! line items. The order row and the line-item record are separate
//! writes, so a failure between them triggers a compensating delete of
//! the just-created order. This is the one place the workflow ever
//! deletes an order.

use crate::engine::OrderWorkflow;
use crate::WorkflowError;
use chrono::DateTime;
use rust_decimal::Decimal;
use storefront_types::{
	current_timestamp, truncate_id, CreateOrderRequest, Order, OrderEvent, OrderStatus,
	PaymentStatus, Principal, StorageKey,
};
use tracing::instrument;
use uuid::Uuid;

/// Generates the human-readable order reference.
///
/// Shape: `SF-YYYYMMDD-XXXXXX`, date from the creation timestamp plus a
/// random suffix. Uniqueness comes from the suffix; the date component is
/// for humans sorting paper.
fn generate_order_number(created_at: u64) -> String {
	let date = DateTime::from_timestamp(created_at as i64, 0)
		.map(|dt| dt.format("%Y%m%d").to_string())
		.unwrap_or_else(|| "00000000".to_string());
	let suffix: String = Uuid::new_v4()
		.simple()
		.to_string()
		.chars()
		.take(6)
		.collect::<String>()
		.to_uppercase();
	format!("SF-{}-{}", date, suffix)
}

fn validate_request(request: &CreateOrderRequest) -> Result<(), WorkflowError> {
	if request.line_items.is_empty() {
		return Err(WorkflowError::Validation(
			"order must contain at least one line item".into(),
		));
	}
	for item in &request.line_items {
		if item.quantity == 0 {
			return Err(WorkflowError::Validation(format!(
				"line item '{}' has zero quantity",
				item.product_id
			)));
		}
		if item.unit_price < Decimal::ZERO {
			return Err(WorkflowError::Validation(format!(
				"line item '{}' has a negative unit price",
				item.product_id
			)));
		}
	}
	if request.shipping_cost < Decimal::ZERO {
		return Err(WorkflowError::Validation("negative shipping cost".into()));
	}
	let address = &request.shipping_address;
	if address.recipient_name.trim().is_empty() {
		return Err(WorkflowError::Validation("recipient name is required".into()));
	}
	if !address.email.contains('@') {
		return Err(WorkflowError::Validation(
			"a valid contact email is required".into(),
		));
	}
	Ok(())
}

impl OrderWorkflow {
	/// Creates an order from a validated cart snapshot.
	///
	/// The total is fixed here from the request's price snapshots and
	/// never recomputed. If persisting the line items fails after the
	/// order row committed, the row is deleted best-effort before the
	/// error surfaces, leaving no orphan.
	#[instrument(skip_all, fields(owner = %owner.id))]
	pub async fn create_order(
		&self,
		owner: &Principal,
		request: CreateOrderRequest,
	) -> Result<Order, WorkflowError> {
		validate_request(&request)?;

		let now = current_timestamp();
		let id = Uuid::new_v4().to_string();
		let total_amount = request
			.line_items
			.iter()
			.map(|item| item.subtotal())
			.sum::<Decimal>()
			+ request.shipping_cost;

		let order = Order {
			id: id.clone(),
			order_number: generate_order_number(now),
			owner_id: owner.id.clone(),
			status: OrderStatus::Pending,
			payment_status: PaymentStatus::Unpaid,
			total_amount,
			shipping_cost: request.shipping_cost,
			shipping_address: request.shipping_address,
			payment_method: request.payment_method,
			receipt_reference: None,
			created_at: now,
			updated_at: now,
		};

		self.storage
			.insert(StorageKey::Orders.as_str(), &id, &order)
			.await
			.map_err(|e| WorkflowError::Storage(e.to_string()))?;

		if let Err(e) = self
			.storage
			.store(StorageKey::LineItems.as_str(), &id, &request.line_items)
			.await
		{
			// Compensating delete: no order row without its line items
			if let Err(cleanup) = self.storage.remove(StorageKey::Orders.as_str(), &id).await {
				tracing::error!(
					order_id = %truncate_id(&id),
					error = %cleanup,
					"Failed to roll back order after line-item write failure"
				);
			}
			return Err(WorkflowError::Storage(e.to_string()));
		}

		tracing::info!(
			order_id = %truncate_id(&id),
			order_number = %order.order_number,
			total = %order.total_amount,
			"Order created"
		);

		self.event_bus
			.publish(OrderEvent::Created {
				order: order.clone(),
			})
			.ok();

		Ok(order)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil;
	use async_trait::async_trait;
	use storefront_storage::implementations::memory::MemoryStorage;
	use storefront_storage::{StorageError, StorageInterface};
	use storefront_types::ConfigSchema;

	#[tokio::test]
	async fn creates_pending_order_with_fixed_total() {
		let harness = testutil::harness().await;
		let order = harness
			.workflow
			.create_order(&testutil::customer(), testutil::create_request())
			.await
			.unwrap();

		assert_eq!(order.status, OrderStatus::Pending);
		assert_eq!(order.payment_status, PaymentStatus::Unpaid);
		assert_eq!(order.owner_id, "c-1");
		// 2 x 12.50 + 49.00 + 5.00 shipping
		assert_eq!(order.total_amount, Decimal::new(7900, 2));
		assert!(order.receipt_reference.is_none());

		let items = harness.workflow.line_items(&order.id).await.unwrap();
		assert_eq!(items.len(), 2);
	}

	#[tokio::test]
	async fn order_number_is_human_readable() {
		let harness = testutil::harness().await;
		let order = harness.pending_order().await;

		let parts: Vec<&str> = order.order_number.split('-').collect();
		assert_eq!(parts.len(), 3);
		assert_eq!(parts[0], "SF");
		assert_eq!(parts[1].len(), 8);
		assert_eq!(parts[2].len(), 6);
	}

	#[tokio::test]
	async fn rejects_empty_and_malformed_requests() {
		let harness = testutil::harness().await;

		let mut request = testutil::create_request();
		request.line_items.clear();
		assert!(matches!(
			harness
				.workflow
				.create_order(&testutil::customer(), request)
				.await,
			Err(WorkflowError::Validation(_))
		));

		let mut request = testutil::create_request();
		request.line_items[0].quantity = 0;
		assert!(matches!(
			harness
				.workflow
				.create_order(&testutil::customer(), request)
				.await,
			Err(WorkflowError::Validation(_))
		));

		let mut request = testutil::create_request();
		request.shipping_address.email = "not-an-email".into();
		assert!(matches!(
			harness
				.workflow
				.create_order(&testutil::customer(), request)
				.await,
			Err(WorkflowError::Validation(_))
		));
	}

	/// Backend that fails every write into one namespace.
	struct FailingBackend {
		inner: MemoryStorage,
		fail_prefix: &'static str,
	}

	#[async_trait]
	impl StorageInterface for FailingBackend {
		async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
			self.inner.get_bytes(key).await
		}

		async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
			if key.starts_with(self.fail_prefix) {
				return Err(StorageError::Backend("disk full".into()));
			}
			self.inner.set_bytes(key, value).await
		}

		async fn compare_and_swap(
			&self,
			key: &str,
			expected: Option<&[u8]>,
			value: Vec<u8>,
		) -> Result<(), StorageError> {
			if key.starts_with(self.fail_prefix) {
				return Err(StorageError::Backend("disk full".into()));
			}
			self.inner.compare_and_swap(key, expected, value).await
		}

		async fn delete(&self, key: &str) -> Result<(), StorageError> {
			self.inner.delete(key).await
		}

		async fn exists(&self, key: &str) -> Result<bool, StorageError> {
			self.inner.exists(key).await
		}

		async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
			self.inner.keys(prefix).await
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			self.inner.config_schema()
		}
	}

	#[tokio::test]
	async fn line_item_failure_rolls_back_the_order() {
		let backend = FailingBackend {
			inner: MemoryStorage::new(),
			fail_prefix: "line_items:",
		};
		let harness = testutil::harness_with_backend(Box::new(backend)).await;

		let result = harness
			.workflow
			.create_order(&testutil::customer(), testutil::create_request())
			.await;
		assert!(matches!(result, Err(WorkflowError::Storage(_))));

		// No orphan order row survives
		let (orders, _) = harness.workflow.list_orders(None).await.unwrap();
		assert!(orders.is_empty());
	}
}
