//! Error handling for the Stone Inventory Management Platform
//!
//! All handlers return `AppResult<T>`; errors serialize to a consistent
//! `{ "error": { code, message, field } }` envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Invoice number already in use: {0}")]
    DuplicateInvoice(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Piece {piece_id} is {actual}, expected {expected}")]
    Precondition {
        piece_id: String,
        expected: String,
        actual: String,
    },

    #[error("Quantity is locked: {0}")]
    QuantityLocked(String),

    #[error("Payment exceeds order total")]
    PaymentExceedsTotal,

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::DuplicateInvoice(invoice) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_INVOICE".to_string(),
                    message: format!("Invoice number {} is already in use", invoice),
                    field: Some("po_invoice_no".to_string()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::Precondition {
                piece_id,
                expected,
                actual,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "PRECONDITION_FAILED".to_string(),
                    message: format!(
                        "Piece {} is {}, expected {}",
                        piece_id, actual, expected
                    ),
                    field: None,
                },
            ),
            AppError::QuantityLocked(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "QUANTITY_LOCKED".to_string(),
                    message: msg.clone(),
                    field: Some("quantity".to_string()),
                },
            ),
            AppError::PaymentExceedsTotal => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "PAYMENT_EXCEEDS_TOTAL".to_string(),
                    message: "Payment amount exceeds the remaining order total".to_string(),
                    field: Some("amount".to_string()),
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
