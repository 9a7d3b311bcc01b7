//! HTTP handlers for the dashboard

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::dashboard::{DashboardService, DashboardSummary, MonthlySales};
use crate::AppState;

fn service(state: &AppState) -> DashboardService {
    DashboardService::new(
        state.db.clone(),
        state.config.dashboard.slab_low_stock_threshold,
        state.config.dashboard.monument_low_stock_threshold,
    )
}

/// Stock summary with low-stock flags
pub async fn dashboard_summary(State(state): State<AppState>) -> AppResult<Json<DashboardSummary>> {
    let summary = service(&state).summary().await?;
    Ok(Json(summary))
}

/// Pieces sold per month over the trailing year
pub async fn monthly_sales(State(state): State<AppState>) -> AppResult<Json<Vec<MonthlySales>>> {
    let sales = service(&state).monthly_sales().await?;
    Ok(Json(sales))
}
