//! Shared fixtures for workflow tests.

use crate::engine::OrderWorkflow;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use storefront_auth::implementations::{allowlist::AllowlistGuard, role_flag::RoleFlagGuard};
use storefront_auth::AccessGuardService;
use storefront_config::Config;
use storefront_notify::implementations::memory::{MemoryNotifier, Outbox};
use storefront_notify::{Mail, NotifierService};
use storefront_storage::implementations::memory::MemoryStorage;
use storefront_storage::{StorageInterface, StorageService};
use storefront_types::{
	CreateOrderRequest, Order, OrderLineItem, PaymentMethod, Principal, ReceiptUpload,
	ShippingAddress,
};

const CONFIG_TOML: &str = r#"
[store]
id = "test-store"

[storage]
primary = "memory"
[storage.implementations.memory]

[notifier]
primary = "memory"
send_timeout_secs = 5
admin_email = "orders@example.com"
order_history_url = "https://shop.example.com/account/orders"
[notifier.implementations.memory]

[admin]
allowlist = ["root@example.com"]
"#;

pub(crate) fn customer() -> Principal {
	Principal::new("c-1", "ada@example.com")
}

pub(crate) fn other_customer() -> Principal {
	Principal::new("c-2", "bob@example.com")
}

pub(crate) fn admin() -> Principal {
	Principal::new("a-1", "root@example.com")
}

pub(crate) fn non_admin() -> Principal {
	Principal::new("c-9", "mallory@example.com")
}

pub(crate) fn create_request() -> CreateOrderRequest {
	CreateOrderRequest {
		line_items: vec![
			OrderLineItem {
				product_id: "p-1".into(),
				product_name: "Ceramic mug".into(),
				product_image: "https://cdn.example.com/mug.jpg".into(),
				unit_price: Decimal::new(1250, 2),
				quantity: 2,
			},
			OrderLineItem {
				product_id: "p-2".into(),
				product_name: "Pour-over kettle".into(),
				product_image: "https://cdn.example.com/kettle.jpg".into(),
				unit_price: Decimal::new(4900, 2),
				quantity: 1,
			},
		],
		shipping_address: ShippingAddress {
			recipient_name: "Ada".into(),
			email: "ada@example.com".into(),
			phone: "+1 555 0100".into(),
			street: "1 Loop Rd".into(),
			city: "Springfield".into(),
			postal_code: "12345".into(),
			country: "US".into(),
		},
		shipping_cost: Decimal::new(500, 2),
		payment_method: PaymentMethod::BankTransfer,
	}
}

pub(crate) fn jpeg_upload(size: usize) -> ReceiptUpload {
	ReceiptUpload {
		file_name: Some("transfer.jpg".into()),
		content_type: "image/jpeg".into(),
		data: vec![0xff; size],
	}
}

/// Waits for spawned notification tasks to settle.
pub(crate) async fn settle() {
	tokio::time::sleep(Duration::from_millis(50)).await;
}

pub(crate) struct Harness {
	pub workflow: Arc<OrderWorkflow>,
	pub outbox: Outbox,
}

impl Harness {
	/// Creates an order in `pending`.
	pub async fn pending_order(&self) -> Order {
		self.workflow
			.create_order(&customer(), create_request())
			.await
			.unwrap()
	}

	/// Creates an order and attaches a valid receipt, landing in
	/// `pending_review`.
	pub async fn reviewed_order(&self) -> Order {
		let order = self.pending_order().await;
		self.workflow
			.attach_receipt(&order.id, &customer(), jpeg_upload(1024))
			.await
			.unwrap()
	}

	/// Returns all mail recorded so far, after letting dispatch settle.
	pub async fn sent_mail(&self) -> Vec<Mail> {
		settle().await;
		self.outbox.read().await.clone()
	}
}

pub(crate) async fn harness() -> Harness {
	harness_with_backend(Box::new(MemoryStorage::new())).await
}

pub(crate) async fn harness_with_backend(backend: Box<dyn StorageInterface>) -> Harness {
	let config: Config = CONFIG_TOML.parse().unwrap();

	let storage = Arc::new(StorageService::new(backend));

	let recorder = MemoryNotifier::new();
	let outbox = recorder.outbox();
	let notifier = Arc::new(NotifierService::new(
		Box::new(recorder),
		Duration::from_secs(config.notifier.send_timeout_secs),
	));

	let access_guard = Arc::new(AccessGuardService::new(vec![
		Box::new(AllowlistGuard::new(config.admin.allowlist.clone())),
		Box::new(RoleFlagGuard::new(storage.clone())),
	]));

	let workflow = Arc::new(OrderWorkflow::new(config, storage, notifier, access_guard));
	workflow.spawn_notification_listener();

	Harness { workflow, outbox }
}
