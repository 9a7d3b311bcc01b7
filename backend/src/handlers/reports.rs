//! HTTP handlers for reports

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::services::report::{
    DeliveryGroup, MovementView, ReportFilter, ReportService, ReturnView,
};
use crate::AppState;

/// Movement history over a date range
pub async fn movement_report(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<Vec<MovementView>>> {
    let service = ReportService::new(state.db);
    let movements = service.movements(filter).await?;
    Ok(Json(movements))
}

/// Returns over a date range
pub async fn returns_report(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<Vec<ReturnView>>> {
    let service = ReportService::new(state.db);
    let returns = service.returns(filter).await?;
    Ok(Json(returns))
}

/// Sold pieces grouped by delivery order
pub async fn delivery_report(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<Vec<DeliveryGroup>>> {
    let service = ReportService::new(state.db);
    let deliveries = service.deliveries(filter).await?;
    Ok(Json(deliveries))
}
