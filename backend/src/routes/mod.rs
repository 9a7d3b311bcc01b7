//! Route definitions for the Stone Inventory Management Platform

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Purchase orders, arrival, payments
        .nest("/orders", order_routes())
        // Client directory
        .nest("/clients", client_routes())
        // Scan-driven stock transitions
        .nest("/scan", scan_routes())
        // Stock counts, products, reserved stock
        .nest("/stock", stock_routes())
        // Reports
        .nest("/reports", report_routes())
        // Dashboard
        .nest("/dashboard", dashboard_routes())
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_order).get(handlers::list_orders))
        .route(
            "/:po_id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/:po_id/codes", post(handlers::assign_codes))
        .route("/:po_id/arrive", post(handlers::mark_arrived))
        .route(
            "/:po_id/payments",
            post(handlers::record_payment).get(handlers::list_payments),
        )
}

fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_client).get(handlers::list_clients))
        .route("/:client_id", get(handlers::get_client))
        .route("/:client_id", put(handlers::update_client))
        .route("/:client_id", delete(handlers::delete_client))
}

fn scan_routes() -> Router<AppState> {
    Router::new()
        // Wildcard: item ids embed slashes ("MN-X-I1/2")
        .route("/lookup/*code", get(handlers::lookup_piece))
        .route("/out", post(handlers::mark_out))
        .route("/out/bulk", post(handlers::mark_out_bulk))
        .route("/sold", post(handlers::confirm_sale))
        .route("/sold/clear-reserved", post(handlers::clear_reserved))
        .route("/undo-sale", post(handlers::undo_sale))
        .route("/return/before-invoice", post(handlers::return_before_invoice))
        .route("/return/after-sale", post(handlers::return_after_sale))
        .route("/batches/:batch_id/counters", get(handlers::get_batch_counters))
        .route("/batches/:batch_id/recount", post(handlers::recount_batch))
}

fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/counts", get(handlers::stock_counts))
        .route("/products", get(handlers::list_products))
        .route("/reserved", get(handlers::list_reserved))
        .route("/reserved/:reserved_id/note", put(handlers::annotate_reserved))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/movements", get(handlers::movement_report))
        .route("/returns", get(handlers::returns_report))
        .route("/deliveries", get(handlers::delivery_report))
}

fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(handlers::dashboard_summary))
        .route("/monthly-sales", get(handlers::monthly_sales))
}
