//! HTTP handlers for purchase orders, batch generation, and payments

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::types::{PaginatedResponse, Pagination};

use crate::error::AppResult;
use crate::services::batch::{AssignedCodes, BatchService, GeneratedBatch};
use crate::services::order::{
    OrderHeader, OrderInput, OrderResponse, OrderService, PaymentInput, PaymentView,
};
use crate::AppState;

/// Create a purchase order
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<OrderInput>,
) -> AppResult<Json<OrderResponse>> {
    let service = OrderService::new(state.db);
    let order = service.create_order(input).await?;
    Ok(Json(order))
}

/// List purchase orders
pub async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<OrderHeader>>> {
    let service = OrderService::new(state.db);
    let orders = service
        .list_orders(pagination.page, pagination.per_page)
        .await?;
    Ok(Json(orders))
}

/// Get one order with items and computed totals
pub async fn get_order(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
) -> AppResult<Json<OrderResponse>> {
    let service = OrderService::new(state.db);
    let order = service.get_order(po_id).await?;
    Ok(Json(order))
}

/// Update an order and its line items
pub async fn update_order(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
    Json(input): Json<OrderInput>,
) -> AppResult<Json<OrderResponse>> {
    let service = OrderService::new(state.db);
    let order = service.update_order(po_id, input).await?;
    Ok(Json(order))
}

/// Delete an order that has no generated batches
pub async fn delete_order(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let service = OrderService::new(state.db);
    service.delete_order(po_id).await?;
    Ok(Json(serde_json::json!({ "deleted": po_id })))
}

/// Assign batch and piece codes to an order's lines for label printing
pub async fn assign_codes(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
) -> AppResult<Json<Vec<AssignedCodes>>> {
    let service = BatchService::new(state.db);
    let codes = service.assign_codes(po_id).await?;
    Ok(Json(codes))
}

/// Mark an order arrived, creating batches and pieces
pub async fn mark_arrived(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
) -> AppResult<Json<Vec<GeneratedBatch>>> {
    let service = BatchService::new(state.db);
    let batches = service.mark_arrived(po_id).await?;
    Ok(Json(batches))
}

/// Record a payment against an order
pub async fn record_payment(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
    Json(input): Json<PaymentInput>,
) -> AppResult<Json<PaymentView>> {
    let service = OrderService::new(state.db);
    let payment = service.record_payment(po_id, input).await?;
    Ok(Json(payment))
}

/// List payments for an order
pub async fn list_payments(
    State(state): State<AppState>,
    Path(po_id): Path<i64>,
) -> AppResult<Json<Vec<PaymentView>>> {
    let service = OrderService::new(state.db);
    let payments = service.list_payments(po_id).await?;
    Ok(Json(payments))
}
