//! Transactional mail templates for the order workflow.
//!
//! One function per workflow side effect. Subjects always carry the
//! human-readable order number, since that is the reference customers and
//! admins use out-of-band.

use crate::Mail;
use storefront_types::Order;

/// Admin notification: a customer submitted payment evidence.
pub fn receipt_submitted(order: &Order, admin_email: &str) -> Mail {
	Mail {
		to: admin_email.to_string(),
		subject: format!("Payment receipt submitted for order {}", order.order_number),
		body: format!(
			"A bank-transfer receipt was uploaded for order {} ({} total).\n\
			 The order is awaiting review.",
			order.order_number, order.total_amount
		),
	}
}

/// Customer notification: an admin verified the transfer.
pub fn order_confirmed(order: &Order, history_url: &str) -> Mail {
	Mail {
		to: order.shipping_address.email.clone(),
		subject: format!("Your order {} is confirmed", order.order_number),
		body: format!(
			"Hi {},\n\n\
			 We received your bank transfer for order {} and your payment is confirmed.\n\
			 Your order is now being prepared for shipment.\n\n\
			 You can follow its progress here: {}",
			order.shipping_address.recipient_name, order.order_number, history_url
		),
	}
}

/// Customer notification: an admin rejected the payment evidence.
pub fn order_rejected(order: &Order, reason: &str) -> Mail {
	Mail {
		to: order.shipping_address.email.clone(),
		subject: format!("Your order {} could not be confirmed", order.order_number),
		body: format!(
			"Hi {},\n\n\
			 We could not verify the payment receipt for order {}.\n\
			 Reason: {}\n\n\
			 The order has been cancelled. If you believe this is a mistake,\n\
			 please place a new order and contact support with your transfer details.",
			order.shipping_address.recipient_name, order.order_number, reason
		),
	}
}
