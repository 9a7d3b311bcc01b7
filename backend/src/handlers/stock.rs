//! HTTP handlers for stock counts, products, and reserved stock

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use shared::models::BatchStockCount;

use crate::error::AppResult;
use crate::services::stock::{
    ProductFilter, ProductView, ReservedView, StockCountFilter, StockService,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReservedQuery {
    pub client_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NoteInput {
    pub note: String,
}

/// Per-batch stock counts with id ranges
pub async fn stock_counts(
    State(state): State<AppState>,
    Query(filter): Query<StockCountFilter>,
) -> AppResult<Json<Vec<BatchStockCount>>> {
    let service = StockService::new(state.db);
    let counts = service.stock_counts(filter).await?;
    Ok(Json(counts))
}

/// List pieces with optional filters
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<ProductView>>> {
    let service = StockService::new(state.db);
    let products = service.list_products(filter).await?;
    Ok(Json(products))
}

/// List reserved stock, optionally for one client
pub async fn list_reserved(
    State(state): State<AppState>,
    Query(query): Query<ReservedQuery>,
) -> AppResult<Json<Vec<ReservedView>>> {
    let service = StockService::new(state.db);
    let reserved = service.list_reserved(query.client_id).await?;
    Ok(Json(reserved))
}

/// Attach a note to a reservation
pub async fn annotate_reserved(
    State(state): State<AppState>,
    Path(reserved_id): Path<i64>,
    Json(input): Json<NoteInput>,
) -> AppResult<Json<ReservedView>> {
    let service = StockService::new(state.db);
    let reserved = service.annotate_reserved(reserved_id, &input.note).await?;
    Ok(Json(reserved))
}
