//! HTTP handlers for scan-driven stock transitions

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::services::scan::{
    BatchCountersView, BulkMarkOutInput, BulkScanResponse, ClearReservedInput, ConfirmSaleInput,
    MarkOutInput, PieceLookup, ReturnInput, ScanService, TransitionOutcome, UndoSaleInput,
};
use crate::AppState;

/// Look up a piece by item id or short barcode
pub async fn lookup_piece(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<PieceLookup>> {
    let service = ScanService::new(state.db);
    let piece = service.lookup(&code).await?;
    Ok(Json(piece))
}

/// Dispatch one piece to a client
pub async fn mark_out(
    State(state): State<AppState>,
    Json(input): Json<MarkOutInput>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = ScanService::new(state.db);
    let outcome = service.mark_out(input).await?;
    Ok(Json(outcome))
}

/// Dispatch many pieces; per-piece success or failure
pub async fn mark_out_bulk(
    State(state): State<AppState>,
    Json(input): Json<BulkMarkOutInput>,
) -> AppResult<Json<BulkScanResponse>> {
    let service = ScanService::new(state.db);
    let response = service.mark_out_bulk(input).await?;
    Ok(Json(response))
}

/// Confirm the sale of a dispatched piece
pub async fn confirm_sale(
    State(state): State<AppState>,
    Json(input): Json<ConfirmSaleInput>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = ScanService::new(state.db);
    let outcome = service.confirm_sale(input).await?;
    Ok(Json(outcome))
}

/// Invoice everything a client has reserved
pub async fn clear_reserved(
    State(state): State<AppState>,
    Json(input): Json<ClearReservedInput>,
) -> AppResult<Json<BulkScanResponse>> {
    let service = ScanService::new(state.db);
    let response = service.clear_reserved(input).await?;
    Ok(Json(response))
}

/// Revert a confirmed sale
pub async fn undo_sale(
    State(state): State<AppState>,
    Json(input): Json<UndoSaleInput>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = ScanService::new(state.db);
    let outcome = service.undo_sale(input).await?;
    Ok(Json(outcome))
}

/// Return a dispatched piece before invoicing
pub async fn return_before_invoice(
    State(state): State<AppState>,
    Json(input): Json<ReturnInput>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = ScanService::new(state.db);
    let outcome = service.return_before_invoice(input).await?;
    Ok(Json(outcome))
}

/// Return a sold piece into availability
pub async fn return_after_sale(
    State(state): State<AppState>,
    Json(input): Json<ReturnInput>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = ScanService::new(state.db);
    let outcome = service.return_after_sale(input).await?;
    Ok(Json(outcome))
}

/// Read a batch's counters
pub async fn get_batch_counters(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
) -> AppResult<Json<BatchCountersView>> {
    let service = ScanService::new(state.db);
    let counters = service.batch_counters(batch_id).await?;
    Ok(Json(counters))
}

/// Rebuild a batch's counters from the movement log
pub async fn recount_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<i64>,
) -> AppResult<Json<BatchCountersView>> {
    let service = ScanService::new(state.db);
    let counters = service.recount_batch(batch_id).await?;
    Ok(Json(counters))
}
