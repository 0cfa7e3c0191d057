//! Read-only order projections.
//!
//! Lists and aggregate statistics built by filtering and reducing the
//! order store's contents. These reads are not linearizable with writes;
//! a display that is a moment stale is acceptable.

use crate::engine::OrderWorkflow;
use crate::WorkflowError;
use rust_decimal::Decimal;
use std::collections::HashMap;
use storefront_storage::StorageError;
use storefront_types::{
	Order, OrderLineItem, OrderStats, OrderStatus, PaymentStatus, StorageKey,
};

impl OrderWorkflow {
	/// Returns a single order by id.
	pub async fn get_order(&self, order_id: &str) -> Result<Order, WorkflowError> {
		self.read_order(order_id).await
	}

	/// Returns the line items of an order.
	pub async fn line_items(&self, order_id: &str) -> Result<Vec<OrderLineItem>, WorkflowError> {
		self.storage
			.retrieve(StorageKey::LineItems.as_str(), order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => WorkflowError::NotFound(order_id.to_string()),
				other => WorkflowError::Storage(other.to_string()),
			})
	}

	/// Lists orders, optionally filtered by status, newest first, with
	/// aggregate statistics over the returned set.
	pub async fn list_orders(
		&self,
		filter: Option<OrderStatus>,
	) -> Result<(Vec<Order>, OrderStats), WorkflowError> {
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all(StorageKey::Orders.as_str())
			.await
			.map_err(|e| WorkflowError::Storage(e.to_string()))?;

		if let Some(status) = filter {
			orders.retain(|order| order.status == status);
		}

		orders.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| a.id.cmp(&b.id))
		});

		let stats = compute_stats(&orders);
		Ok((orders, stats))
	}
}

/// Reduces a set of orders to count-per-status and verified revenue.
fn compute_stats(orders: &[Order]) -> OrderStats {
	let mut count_by_status: HashMap<String, usize> = OrderStatus::all()
		.map(|status| (status.as_str().to_string(), 0))
		.collect();
	let mut revenue = Decimal::ZERO;

	for order in orders {
		*count_by_status
			.entry(order.status.as_str().to_string())
			.or_default() += 1;
		if order.payment_status == PaymentStatus::Paid {
			revenue += order.total_amount;
		}
	}

	OrderStats {
		total_count: orders.len(),
		count_by_status,
		revenue,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil;

	#[tokio::test]
	async fn lists_newest_first_with_stats() {
		let harness = testutil::harness().await;

		let o1 = harness.pending_order().await;
		let o2 = harness.reviewed_order().await;
		harness
			.workflow
			.confirm_order(&o2.id, &testutil::admin())
			.await
			.unwrap();
		let o3 = harness.reviewed_order().await;
		harness
			.workflow
			.reject_order(&o3.id, &testutil::admin(), None)
			.await
			.unwrap();

		let (orders, stats) = harness.workflow.list_orders(None).await.unwrap();
		assert_eq!(orders.len(), 3);
		assert!(orders.iter().any(|o| o.id == o1.id));

		assert_eq!(stats.total_count, 3);
		assert_eq!(stats.count_by_status["pending"], 1);
		assert_eq!(stats.count_by_status["processing"], 1);
		assert_eq!(stats.count_by_status["cancelled"], 1);
		assert_eq!(stats.count_by_status["shipped"], 0);

		// Revenue counts verified payments only: one confirmed order
		assert_eq!(stats.revenue, o2.total_amount);
	}

	#[tokio::test]
	async fn filter_narrows_to_one_status() {
		let harness = testutil::harness().await;

		harness.pending_order().await;
		let reviewed = harness.reviewed_order().await;

		let (orders, stats) = harness
			.workflow
			.list_orders(Some(OrderStatus::PendingReview))
			.await
			.unwrap();
		assert_eq!(orders.len(), 1);
		assert_eq!(orders[0].id, reviewed.id);
		assert_eq!(stats.total_count, 1);
		assert_eq!(stats.revenue, Decimal::ZERO);
	}

	#[tokio::test]
	async fn total_amount_survives_transitions() {
		let harness = testutil::harness().await;
		let order = harness.reviewed_order().await;
		let original_total = order.total_amount;

		harness
			.workflow
			.confirm_order(&order.id, &testutil::admin())
			.await
			.unwrap();
		harness
			.workflow
			.override_status(&order.id, &testutil::admin(), OrderStatus::Shipped)
			.await
			.unwrap();

		let stored = harness.workflow.get_order(&order.id).await.unwrap();
		assert_eq!(stored.total_amount, original_total);
		assert_eq!(stored.shipping_cost, order.shipping_cost);
	}
}
