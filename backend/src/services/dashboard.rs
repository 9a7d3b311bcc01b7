//! Dashboard aggregates: stock totals, low-stock alerts, monthly sales

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use shared::models::Category;

use crate::error::AppResult;

/// Dashboard service
#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
    slab_low_stock_threshold: i64,
    monument_low_stock_threshold: i64,
}

/// Per-category stock statistics
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category: Category,
    pub total: i64,
    pub available: i64,
    pub out: i64,
    pub sold: i64,
    pub low_stock: bool,
}

/// Top-level dashboard summary
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_pieces: i64,
    pub total_available: i64,
    pub total_out: i64,
    pub total_sold: i64,
    pub categories: Vec<CategoryStats>,
}

/// Sales count for one month
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthlySales {
    pub month: NaiveDate,
    pub pieces_sold: i64,
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    category: String,
    total: i64,
    available: i64,
    out: i64,
    sold: i64,
}

impl DashboardService {
    /// Create a new DashboardService instance
    pub fn new(db: PgPool, slab_threshold: i64, monument_threshold: i64) -> Self {
        Self {
            db,
            slab_low_stock_threshold: slab_threshold,
            monument_low_stock_threshold: monument_threshold,
        }
    }

    /// Overall stock summary with per-category low-stock flags
    pub async fn summary(&self) -> AppResult<DashboardSummary> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT category,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'available') AS available,
                   COUNT(*) FILTER (WHERE status = 'out') AS out,
                   COUNT(*) FILTER (WHERE status = 'sold') AS sold
            FROM pieces
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let categories: Vec<CategoryStats> = rows
            .into_iter()
            .map(|row| {
                let category = Category::from_label(&row.category);
                let threshold = match category {
                    Category::Monuments => self.monument_low_stock_threshold,
                    Category::Granite | Category::Quartz => self.slab_low_stock_threshold,
                };
                CategoryStats {
                    category,
                    total: row.total,
                    available: row.available,
                    out: row.out,
                    sold: row.sold,
                    low_stock: row.available < threshold,
                }
            })
            .collect();

        Ok(DashboardSummary {
            total_pieces: categories.iter().map(|c| c.total).sum(),
            total_available: categories.iter().map(|c| c.available).sum(),
            total_out: categories.iter().map(|c| c.out).sum(),
            total_sold: categories.iter().map(|c| c.sold).sum(),
            categories,
        })
    }

    /// Pieces sold per month over the trailing year. A sale only counts
    /// while the piece is still sold; undone sales and returns drop out.
    pub async fn monthly_sales(&self) -> AppResult<Vec<MonthlySales>> {
        let today = Utc::now().date_naive();
        let year_ago = today
            .with_day(1)
            .unwrap_or(today)
            .checked_sub_months(chrono::Months::new(11))
            .unwrap_or(today);

        let sales = sqlx::query_as::<_, MonthlySales>(
            r#"
            SELECT DATE_TRUNC('month', m.scan_date)::date AS month,
                   COUNT(DISTINCT m.stock_id) AS pieces_sold
            FROM stock_movements m
            JOIN pieces p ON p.stock_id = m.stock_id
            WHERE m.event = 'clear_to_sold'
              AND p.status = 'sold'
              AND m.scan_date >= $1
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(year_ago)
        .fetch_all(&self.db)
        .await?;
        Ok(sales)
    }
}
