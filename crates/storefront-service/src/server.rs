//! HTTP server for the storefront API.
//!
//! Routes the order workflow operations, extracts the calling principal
//! from the headers populated by the upstream session layer, and maps the
//! workflow error taxonomy onto HTTP status codes.

use axum::{
	body::Bytes,
	extract::{DefaultBodyLimit, Path, Query, State},
	http::{header, HeaderMap, StatusCode},
	response::{IntoResponse, Json, Response},
	routing::{get, post},
	Router,
};
use serde::Deserialize;
use std::sync::Arc;
use storefront_config::ApiConfig;
use storefront_core::{OrderWorkflow, WorkflowError};
use storefront_types::{
	CreateOrderRequest, ErrorResponse, OrderListResponse, OrderResponse, OrderStatus,
	OverrideRequest, Principal, ReceiptUpload, RejectRequest, ReviewResponse,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the workflow engine for processing requests.
	pub workflow: Arc<OrderWorkflow>,
}

/// Workflow error wrapper carrying the HTTP mapping.
pub struct ApiError(WorkflowError);

impl From<WorkflowError> for ApiError {
	fn from(err: WorkflowError) -> Self {
		Self(err)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, code) = match &self.0 {
			WorkflowError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
			WorkflowError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
			WorkflowError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
			WorkflowError::IllegalTransition { .. } => {
				(StatusCode::CONFLICT, "ILLEGAL_TRANSITION")
			},
			WorkflowError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
			WorkflowError::Storage(_) | WorkflowError::Config(_) => {
				(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
			},
		};

		if status.is_server_error() {
			tracing::error!(error = %self.0, "Request failed");
		} else {
			tracing::debug!(error = %self.0, "Request rejected");
		}

		(
			status,
			Json(ErrorResponse {
				error: code.to_string(),
				message: self.0.to_string(),
			}),
		)
			.into_response()
	}
}

/// Resolves the calling principal from the session-layer headers.
///
/// Authentication itself is out of scope; an upstream proxy or session
/// layer is expected to populate `x-principal-id` and
/// `x-principal-email` for authenticated requests.
fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, ApiError> {
	let read = |name: &str| {
		headers
			.get(name)
			.and_then(|v| v.to_str().ok())
			.map(str::trim)
			.filter(|v| !v.is_empty())
			.map(str::to_string)
	};

	match (read("x-principal-id"), read("x-principal-email")) {
		(Some(id), Some(email)) => Ok(Principal { id, email }),
		_ => Err(ApiError(WorkflowError::Forbidden(
			"missing principal headers".into(),
		))),
	}
}

/// Builds the API router over the given workflow engine.
pub fn router(workflow: Arc<OrderWorkflow>) -> Router {
	let state = AppState { workflow };

	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", post(handle_create_order).get(handle_list_orders))
				.route("/orders/{id}", get(handle_get_order))
				.route("/orders/{id}/receipt", post(handle_attach_receipt))
				.route("/orders/{id}/confirm", post(handle_confirm_order))
				.route("/orders/{id}/reject", post(handle_reject_order))
				.route("/orders/{id}/status", post(handle_override_status)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(DefaultBodyLimit::disable())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	workflow: Arc<OrderWorkflow>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(workflow);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Storefront API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
	let principal = principal_from_headers(&headers)?;
	let order = state.workflow.create_order(&principal, request).await?;
	let items = state.workflow.line_items(&order.id).await.ok();
	Ok((
		StatusCode::CREATED,
		Json(OrderResponse::from_order(order, items)),
	))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
	status: Option<OrderStatus>,
}

/// Handles GET /api/orders requests.
async fn handle_list_orders(
	State(state): State<AppState>,
	Query(query): Query<ListQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
	let (orders, stats) = state.workflow.list_orders(query.status).await?;
	Ok(Json(OrderListResponse {
		orders: orders
			.into_iter()
			.map(|order| OrderResponse::from_order(order, None))
			.collect(),
		stats,
	}))
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
	let order = state.workflow.get_order(&id).await?;
	let items = state.workflow.line_items(&id).await.ok();
	Ok(Json(OrderResponse::from_order(order, items)))
}

/// Handles POST /api/orders/{id}/receipt requests.
///
/// The receipt file travels as the raw request body; its MIME type is the
/// request `Content-Type` and an optional `x-file-name` header carries
/// the original file name.
async fn handle_attach_receipt(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<OrderResponse>, ApiError> {
	let principal = principal_from_headers(&headers)?;

	let content_type = headers
		.get(header::CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.unwrap_or("application/octet-stream")
		.to_string();
	let file_name = headers
		.get("x-file-name")
		.and_then(|v| v.to_str().ok())
		.map(str::to_string);

	let upload = ReceiptUpload {
		file_name,
		content_type,
		data: body.to_vec(),
	};

	let order = state
		.workflow
		.attach_receipt(&id, &principal, upload)
		.await?;
	Ok(Json(OrderResponse::from_order(order, None)))
}

/// Handles POST /api/orders/{id}/confirm requests.
async fn handle_confirm_order(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> Result<Json<ReviewResponse>, ApiError> {
	let principal = principal_from_headers(&headers)?;
	let outcome = state.workflow.confirm_order(&id, &principal).await?;
	Ok(Json(ReviewResponse {
		already_confirmed: outcome.is_repeat(),
		order: OrderResponse::from_order(outcome.order().clone(), None),
	}))
}

/// Handles POST /api/orders/{id}/reject requests.
async fn handle_reject_order(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
	Json(request): Json<RejectRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
	let principal = principal_from_headers(&headers)?;
	let order = state
		.workflow
		.reject_order(&id, &principal, request.reason)
		.await?;
	Ok(Json(OrderResponse::from_order(order, None)))
}

/// Handles POST /api/orders/{id}/status requests.
async fn handle_override_status(
	State(state): State<AppState>,
	Path(id): Path<String>,
	headers: HeaderMap,
	Json(request): Json<OverrideRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
	let principal = principal_from_headers(&headers)?;
	let order = state
		.workflow
		.override_status(&id, &principal, request.status)
		.await?;
	Ok(Json(OrderResponse::from_order(order, None)))
}
