//! API types for HTTP endpoints and request/response structures.
//!
//! Wire types use camelCase field names; the domain model stays
//! snake_case internally.

use crate::{Order, OrderLineItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request body for creating an order at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
	/// Purchased products with price snapshots taken by the cart layer.
	pub line_items: Vec<OrderLineItem>,
	/// Delivery and contact snapshot.
	pub shipping_address: ShippingAddress,
	/// Shipping cost computed by the cart layer.
	pub shipping_cost: Decimal,
	/// Settlement method chosen at checkout.
	pub payment_method: PaymentMethod,
}

/// Request body for rejecting an order under review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectRequest {
	/// Human-supplied rejection reason; a configured default is used
	/// when absent.
	pub reason: Option<String>,
}

/// Request body for the manual status override endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRequest {
	/// Target fulfillment status.
	pub status: OrderStatus,
}

/// Order representation returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
	pub id: String,
	pub order_number: String,
	pub status: OrderStatus,
	pub payment_status: PaymentStatus,
	pub total_amount: Decimal,
	pub shipping_cost: Decimal,
	pub shipping_address: ShippingAddress,
	pub payment_method: PaymentMethod,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub receipt_reference: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub line_items: Option<Vec<OrderLineItem>>,
	pub created_at: u64,
	pub updated_at: u64,
}

impl OrderResponse {
	/// Builds a response from an order, optionally including line items.
	pub fn from_order(order: Order, line_items: Option<Vec<OrderLineItem>>) -> Self {
		Self {
			id: order.id,
			order_number: order.order_number,
			status: order.status,
			payment_status: order.payment_status,
			total_amount: order.total_amount,
			shipping_cost: order.shipping_cost,
			shipping_address: order.shipping_address,
			payment_method: order.payment_method,
			receipt_reference: order.receipt_reference,
			line_items,
			created_at: order.created_at,
			updated_at: order.updated_at,
		}
	}
}

/// Aggregate statistics over the order collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
	/// Total number of orders matching the query.
	pub total_count: usize,
	/// Number of orders per lifecycle status.
	pub count_by_status: HashMap<String, usize>,
	/// Sum of order totals over orders whose payment is verified.
	pub revenue: Decimal,
}

/// Response body for the order list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
	pub orders: Vec<OrderResponse>,
	pub stats: OrderStats,
}

/// Response body for admin review actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
	pub order: OrderResponse,
	/// True when a repeated confirmation was absorbed as a no-op.
	#[serde(default)]
	pub already_confirmed: bool,
}

/// Standard error body returned by all endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Stable machine-readable error code.
	pub error: String,
	/// Human-readable detail.
	pub message: String,
}
