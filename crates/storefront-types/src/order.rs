//! Order model for the storefront workflow system.
//!
//! This module defines the order record, its line items, and the status
//! enums that drive the bank-transfer payment-confirmation state machine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A customer's purchase request with line items, shipping details, and a
/// lifecycle status.
///
/// An order is created once at checkout and mutated only through the
/// lifecycle engine's transition operation. Monetary fields are fixed at
/// creation; the workflow owns `status`, `payment_status`,
/// `receipt_reference`, and `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier, assigned at creation.
	pub id: String,
	/// Human-readable unique reference used in customer-facing communication.
	pub order_number: String,
	/// Identifier of the customer who created the order.
	pub owner_id: String,
	/// Current workflow position; the single source of truth.
	pub status: OrderStatus,
	/// Financial settlement state, tracked independently from fulfillment.
	pub payment_status: PaymentStatus,
	/// Grand total including shipping, fixed at creation.
	pub total_amount: Decimal,
	/// Shipping cost component of the total, fixed at creation.
	pub shipping_cost: Decimal,
	/// Snapshot of the customer's contact and delivery data at order time.
	pub shipping_address: ShippingAddress,
	/// Settlement method chosen at checkout.
	pub payment_method: PaymentMethod,
	/// Reference to the uploaded payment evidence; set exactly once,
	/// never cleared.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub receipt_reference: Option<String>,
	/// Timestamp when this order was created (Unix seconds).
	pub created_at: u64,
	/// Timestamp of the last committed transition (Unix seconds).
	pub updated_at: u64,
}

/// A single purchased product within an order.
///
/// Product name, image, and unit price are denormalized snapshots taken at
/// order time so later catalog edits cannot alter a placed order. Line
/// items are written atomically with the order and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
	/// Catalog identifier of the purchased product.
	pub product_id: String,
	/// Product name at order time.
	pub product_name: String,
	/// Product image URL at order time.
	pub product_image: String,
	/// Unit price at order time.
	pub unit_price: Decimal,
	/// Number of units purchased.
	pub quantity: u32,
}

impl OrderLineItem {
	/// Line subtotal: unit price times quantity.
	pub fn subtotal(&self) -> Decimal {
		self.unit_price * Decimal::from(self.quantity)
	}
}

/// Snapshot of customer contact and delivery data taken at order time.
///
/// The order must remain addressable for communication even if the
/// customer's profile changes later, so this is a copy, not a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
	pub recipient_name: String,
	/// Destination for all customer-facing workflow mail.
	pub email: String,
	pub phone: String,
	pub street: String,
	pub city: String,
	pub postal_code: String,
	pub country: String,
}

/// Workflow position of an order.
///
/// Transitions between variants are validated by the lifecycle engine;
/// no component writes this field directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	/// Created at checkout, awaiting payment evidence.
	Pending,
	/// Evidence attached, awaiting an admin decision.
	PendingReview,
	/// Admin confirmed the payment; order is being prepared.
	Processing,
	/// Order handed to the carrier.
	Shipped,
	/// Order received by the customer.
	Delivered,
	/// Terminal escape state; requires a fresh order to purchase again.
	Cancelled,
}

impl OrderStatus {
	/// Returns an iterator over all status variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::PendingReview,
			Self::Processing,
			Self::Shipped,
			Self::Delivered,
			Self::Cancelled,
		]
		.into_iter()
	}

	/// String form matching the serde representation.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "pending",
			OrderStatus::PendingReview => "pending_review",
			OrderStatus::Processing => "processing",
			OrderStatus::Shipped => "shipped",
			OrderStatus::Delivered => "delivered",
			OrderStatus::Cancelled => "cancelled",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Financial settlement state of an order.
///
/// Kept separate from `OrderStatus` because fulfillment and settlement can
/// diverge in edge cases (e.g., a shipped order later found unpaid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
	/// No payment evidence submitted yet.
	Unpaid,
	/// Evidence submitted, verification outstanding.
	Pending,
	/// Admin verified the transfer.
	Paid,
	/// Admin rejected the evidence.
	Failed,
}

impl fmt::Display for PaymentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			PaymentStatus::Unpaid => "unpaid",
			PaymentStatus::Pending => "pending",
			PaymentStatus::Paid => "paid",
			PaymentStatus::Failed => "failed",
		};
		f.write_str(s)
	}
}

/// Settlement method chosen at checkout.
///
/// Bank transfers are settled out-of-band and drive the receipt-review
/// workflow; no gateway integration exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
	BankTransfer,
}

/// An uploaded payment-evidence file as received by the intake surface.
#[derive(Clone)]
pub struct ReceiptUpload {
	/// Original file name supplied by the client, if any.
	pub file_name: Option<String>,
	/// Declared MIME type of the upload.
	pub content_type: String,
	/// Raw file bytes.
	pub data: Vec<u8>,
}

impl fmt::Debug for ReceiptUpload {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReceiptUpload")
			.field("file_name", &self.file_name)
			.field("content_type", &self.content_type)
			.field("size_bytes", &self.data.len())
			.finish()
	}
}
