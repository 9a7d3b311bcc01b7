//! Reporting: movement history, returns, deliveries

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
}

/// Date-range filter; either bound may be open
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub client_id: Option<i64>,
}

/// One movement log entry with its piece and client context
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovementView {
    pub movement_id: i64,
    pub stock_id: i64,
    pub item_id: String,
    pub batch_code: String,
    pub product_name: String,
    pub event: String,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub delivery_order_no: Option<String>,
    pub delivery_mode: Option<String>,
    pub reason: Option<String>,
    pub scan_date: DateTime<Utc>,
}

/// One returned piece
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReturnView {
    pub return_id: i64,
    pub stock_id: i64,
    pub item_id: String,
    pub batch_code: String,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub return_type: String,
    pub reason: Option<String>,
    pub return_date: DateTime<Utc>,
}

/// Sold pieces grouped under one delivery order
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryGroup {
    pub delivery_order_no: String,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub piece_count: i64,
    pub item_ids: Vec<String>,
}

#[derive(Debug, FromRow)]
struct DeliveryRow {
    delivery_order_no: String,
    client_id: Option<i64>,
    client_name: Option<String>,
    item_id: String,
}

impl ReportService {
    /// Create a new ReportService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Movement log over a date range, newest first
    pub async fn movements(&self, filter: ReportFilter) -> AppResult<Vec<MovementView>> {
        let movements = sqlx::query_as::<_, MovementView>(
            r#"
            SELECT m.movement_id, m.stock_id, p.item_id, b.batch_code,
                   p.product_name, m.event, m.client_id, c.client_name,
                   m.delivery_order_no, m.delivery_mode, m.reason, m.scan_date
            FROM stock_movements m
            JOIN pieces p ON p.stock_id = m.stock_id
            JOIN stock_batches b ON b.batch_id = p.batch_id
            LEFT JOIN clients c ON c.client_id = m.client_id
            WHERE ($1::date IS NULL OR m.scan_date >= $1)
              AND ($2::date IS NULL OR m.scan_date < $2 + INTERVAL '1 day')
              AND ($3::bigint IS NULL OR m.client_id = $3)
            ORDER BY m.scan_date DESC, m.movement_id DESC
            "#,
        )
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.client_id)
        .fetch_all(&self.db)
        .await?;
        Ok(movements)
    }

    /// Returns over a date range, newest first
    pub async fn returns(&self, filter: ReportFilter) -> AppResult<Vec<ReturnView>> {
        let returns = sqlx::query_as::<_, ReturnView>(
            r#"
            SELECT r.return_id, r.stock_id, r.item_id, r.batch_code,
                   r.client_id, c.client_name, r.return_type, r.reason,
                   r.return_date
            FROM return_list r
            LEFT JOIN clients c ON c.client_id = r.client_id
            WHERE ($1::date IS NULL OR r.return_date >= $1)
              AND ($2::date IS NULL OR r.return_date < $2 + INTERVAL '1 day')
              AND ($3::bigint IS NULL OR r.client_id = $3)
            ORDER BY r.return_date DESC, r.return_id DESC
            "#,
        )
        .bind(filter.start)
        .bind(filter.end)
        .bind(filter.client_id)
        .fetch_all(&self.db)
        .await?;
        Ok(returns)
    }

    /// Sold pieces grouped by delivery order
    pub async fn deliveries(&self, filter: ReportFilter) -> AppResult<Vec<DeliveryGroup>> {
        let rows = sqlx::query_as::<_, DeliveryRow>(
            r#"
            SELECT p.delivery_order_no, p.client_id, c.client_name, p.item_id
            FROM pieces p
            LEFT JOIN clients c ON c.client_id = p.client_id
            WHERE p.status = 'sold' AND p.delivery_order_no IS NOT NULL
              AND ($1::bigint IS NULL OR p.client_id = $1)
            ORDER BY p.delivery_order_no, p.stock_id
            "#,
        )
        .bind(filter.client_id)
        .fetch_all(&self.db)
        .await?;

        let mut groups: Vec<DeliveryGroup> = Vec::new();
        for row in rows {
            match groups
                .last_mut()
                .filter(|g| g.delivery_order_no == row.delivery_order_no)
            {
                Some(group) => {
                    group.piece_count += 1;
                    group.item_ids.push(row.item_id);
                }
                None => groups.push(DeliveryGroup {
                    delivery_order_no: row.delivery_order_no,
                    client_id: row.client_id,
                    client_name: row.client_name,
                    piece_count: 1,
                    item_ids: vec![row.item_id],
                }),
            }
        }
        Ok(groups)
    }
}
