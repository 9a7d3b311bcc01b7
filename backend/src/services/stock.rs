//! Stock queries: per-batch counts, available products, reserved list

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use shared::codes::make_piece_code;
use shared::models::{BatchStockCount, Category, PieceStatus};

use crate::error::{AppError, AppResult};

/// Stock query service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Filters for the stock-count listing
#[derive(Debug, Default, Deserialize)]
pub struct StockCountFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Filters for the available-product listing
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, FromRow)]
struct StockCountRow {
    batch_id: i64,
    batch_code: String,
    product_name: String,
    category: String,
    size: Option<String>,
    colour: Option<String>,
    batch_quantity: i32,
    out_count: i32,
    sold_count: i32,
    returned_count: i32,
    arrival_date: NaiveDate,
}

/// One piece in the product listing
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductView {
    pub stock_id: i64,
    pub item_id: String,
    pub barcode_short: String,
    pub batch_code: String,
    pub product_name: String,
    pub category: String,
    pub size: Option<String>,
    pub status: String,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub delivery_order_no: Option<String>,
}

/// One reserved piece with its client context
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReservedView {
    pub reserved_id: i64,
    pub stock_id: i64,
    pub item_id: String,
    pub batch_code: String,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub delivery_order_no: Option<String>,
    pub note: Option<String>,
    pub reserved_at: DateTime<Utc>,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Per-batch stock counts with piece id ranges
    pub async fn stock_counts(&self, filter: StockCountFilter) -> AppResult<Vec<BatchStockCount>> {
        let category = Self::parse_category_filter(filter.category.as_deref())?;
        let search = filter
            .search
            .map(|s| format!("%{}%", s.trim().to_lowercase()));

        let rows = sqlx::query_as::<_, StockCountRow>(
            r#"
            SELECT b.batch_id, b.batch_code, i.item_name AS product_name, b.category,
                   MIN(p.size) AS size, i.colour, b.batch_quantity,
                   b.out_count, b.sold_count, b.returned_count, b.arrival_date
            FROM stock_batches b
            JOIN purchase_order_items i ON i.po_item_id = b.po_item_id
            LEFT JOIN pieces p ON p.batch_id = b.batch_id
            WHERE ($1::text IS NULL OR b.category = $1)
              AND ($2::text IS NULL OR LOWER(i.item_name) LIKE $2
                   OR LOWER(b.batch_code) LIKE $2)
            GROUP BY b.batch_id, b.batch_code, i.item_name, b.category, i.colour,
                     b.batch_quantity, b.out_count, b.sold_count, b.returned_count,
                     b.arrival_date
            ORDER BY b.arrival_date DESC, b.batch_id DESC
            "#,
        )
        .bind(category.map(|c| c.as_str().to_string()))
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Self::rollup).collect())
    }

    /// List pieces, optionally filtered by category, status, or a search
    /// over names and codes
    pub async fn list_products(&self, filter: ProductFilter) -> AppResult<Vec<ProductView>> {
        let category = Self::parse_category_filter(filter.category.as_deref())?;
        let status = match filter.status.as_deref() {
            None | Some("") => None,
            Some(s) => Some(
                PieceStatus::parse(s)
                    .ok_or_else(|| AppError::Validation {
                        field: "status".to_string(),
                        message: format!("Unknown status: {}", s),
                    })?
                    .as_str()
                    .to_string(),
            ),
        };
        let search = filter
            .search
            .map(|s| format!("%{}%", s.trim().to_lowercase()));

        let products = sqlx::query_as::<_, ProductView>(
            r#"
            SELECT p.stock_id, p.item_id, p.barcode_short, b.batch_code,
                   p.product_name, p.category, p.size, p.status,
                   p.client_id, c.client_name, p.delivery_order_no
            FROM pieces p
            JOIN stock_batches b ON b.batch_id = p.batch_id
            LEFT JOIN clients c ON c.client_id = p.client_id
            WHERE ($1::text IS NULL OR p.category = $1)
              AND ($2::text IS NULL OR p.status = $2)
              AND ($3::text IS NULL OR LOWER(p.product_name) LIKE $3
                   OR LOWER(p.item_id) LIKE $3 OR LOWER(p.barcode_short) LIKE $3)
            ORDER BY p.stock_id
            "#,
        )
        .bind(category.map(|c| c.as_str().to_string()))
        .bind(status)
        .bind(search)
        .fetch_all(&self.db)
        .await?;
        Ok(products)
    }

    /// Everything currently dispatched to clients, pending invoice
    pub async fn list_reserved(&self, client_id: Option<i64>) -> AppResult<Vec<ReservedView>> {
        let reserved = sqlx::query_as::<_, ReservedView>(
            r#"
            SELECT r.reserved_id, r.stock_id, r.item_id, r.batch_code,
                   r.client_id, c.client_name, r.delivery_order_no, r.note,
                   r.reserved_at
            FROM reserved_stocks r
            LEFT JOIN clients c ON c.client_id = r.client_id
            WHERE ($1::bigint IS NULL OR r.client_id = $1)
            ORDER BY r.reserved_at DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.db)
        .await?;
        Ok(reserved)
    }

    /// Attach a free-text note to a reservation
    pub async fn annotate_reserved(&self, reserved_id: i64, note: &str) -> AppResult<ReservedView> {
        sqlx::query("UPDATE reserved_stocks SET note = $1 WHERE reserved_id = $2")
            .bind(note)
            .bind(reserved_id)
            .execute(&self.db)
            .await?;

        sqlx::query_as::<_, ReservedView>(
            r#"
            SELECT r.reserved_id, r.stock_id, r.item_id, r.batch_code,
                   r.client_id, c.client_name, r.delivery_order_no, r.note,
                   r.reserved_at
            FROM reserved_stocks r
            LEFT JOIN clients c ON c.client_id = r.client_id
            WHERE r.reserved_id = $1
            "#,
        )
        .bind(reserved_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reservation".to_string()))
    }

    fn parse_category_filter(label: Option<&str>) -> AppResult<Option<Category>> {
        match label {
            None | Some("") => Ok(None),
            Some(l) => Category::parse(l)
                .map(Some)
                .ok_or_else(|| AppError::Validation {
                    field: "category".to_string(),
                    message: format!("Unknown category: {}", l),
                }),
        }
    }

    fn rollup(row: StockCountRow) -> BatchStockCount {
        // Piece ids are contiguous 1..=quantity and never reused, so the
        // label range is fully determined by the batch code
        let id_range = if row.batch_quantity > 1 {
            format!(
                "{} - {}",
                make_piece_code(&row.batch_code, 1),
                make_piece_code(&row.batch_code, row.batch_quantity as usize)
            )
        } else {
            make_piece_code(&row.batch_code, 1)
        };

        BatchStockCount {
            batch_id: row.batch_id,
            batch_code: row.batch_code,
            product_name: row.product_name,
            category: Category::from_label(&row.category),
            size: row.size.unwrap_or_default(),
            colour: row.colour.unwrap_or_default(),
            id_range,
            quantity: row.batch_quantity,
            out: row.out_count,
            sold: row.sold_count,
            returned: row.returned_count,
            available: row.batch_quantity - row.out_count - row.sold_count,
            arrival_date: row.arrival_date,
        }
    }
}
