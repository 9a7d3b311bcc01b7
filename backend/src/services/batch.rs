//! Batch generation at arrival
//!
//! When an order's goods land, each line item becomes a stock batch with one
//! piece row per unit. Batch codes come from `shared::codes` and are written
//! exactly once; regenerating for an already-batched line is a no-op, so the
//! arrival flow can be retried safely.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use shared::codes::{make_batch_code, make_piece_code, random_short_code};
use shared::models::{ArrivalStatus, Category};
use shared::validation::validate_batch_invoice;

use crate::error::{AppError, AppResult};

/// Redraws before a short-code collision is treated as exhaustion
const SHORT_CODE_ATTEMPTS: usize = 5;

/// Batch generation service
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    po_item_id: i64,
    item_name: String,
    category: String,
    quantity_ordered: i32,
    height_cm: Option<Decimal>,
    width_cm: Option<Decimal>,
    thickness_cm: Option<Decimal>,
    batch_created: bool,
    batch_code: Option<String>,
}

/// Codes assigned to one line item
#[derive(Debug, Clone, Serialize)]
pub struct AssignedCodes {
    pub po_item_id: i64,
    pub batch_code: String,
    pub piece_ids: Vec<String>,
}

/// One batch created at arrival
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedBatch {
    pub po_item_id: i64,
    pub batch_id: i64,
    pub batch_code: String,
    pub batch_quantity: i32,
    pub piece_ids: Vec<String>,
}

impl BatchService {
    /// Create a new BatchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Assign batch and piece codes to every line of an order without
    /// creating stock. Codes are derived from the invoice number and the
    /// line's 1-based position, so they are stable across calls.
    pub async fn assign_codes(&self, po_id: i64) -> AppResult<Vec<AssignedCodes>> {
        let invoice = self.invoice_for(po_id).await?;
        Self::require_invoice(&invoice)?;
        let items = self.items_for(po_id).await?;

        let mut tx = self.db.begin().await?;
        let mut assigned = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let category = Category::from_label(&item.category);
            let batch_code = match &item.batch_code {
                // Codes are written once; later edits to the invoice must
                // not reshuffle printed labels
                Some(code) => code.clone(),
                None => make_batch_code(category, &invoice, index + 1),
            };
            let piece_ids = (1..=item.quantity_ordered as usize)
                .map(|i| make_piece_code(&batch_code, i))
                .collect();

            sqlx::query(
                r#"
                UPDATE purchase_order_items
                SET batch_code = $1, arrival_status = $2
                WHERE po_item_id = $3 AND NOT batch_created
                "#,
            )
            .bind(&batch_code)
            .bind(ArrivalStatus::QrGenerated.as_str())
            .bind(item.po_item_id)
            .execute(&mut *tx)
            .await?;

            assigned.push(AssignedCodes {
                po_item_id: item.po_item_id,
                batch_code,
                piece_ids,
            });
        }

        tx.commit().await?;
        tracing::info!(po_id, lines = assigned.len(), "batch codes assigned");
        Ok(assigned)
    }

    /// Mark an order arrived: create a batch and its pieces for every line
    /// that does not have one yet. Already-batched lines are skipped.
    pub async fn mark_arrived(&self, po_id: i64) -> AppResult<Vec<GeneratedBatch>> {
        let invoice = self.invoice_for(po_id).await?;
        Self::require_invoice(&invoice)?;
        let items = self.items_for(po_id).await?;

        let mut tx = self.db.begin().await?;
        let mut created = Vec::new();

        for (index, item) in items.iter().enumerate() {
            if item.batch_created {
                continue;
            }

            let category = Category::from_label(&item.category);
            let batch_code = match &item.batch_code {
                Some(code) => code.clone(),
                None => make_batch_code(category, &invoice, index + 1),
            };

            let batch_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO stock_batches
                    (po_item_id, batch_code, category, batch_quantity, arrival_date)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING batch_id
                "#,
            )
            .bind(item.po_item_id)
            .bind(&batch_code)
            .bind(category.as_str())
            .bind(item.quantity_ordered)
            .bind(Utc::now().date_naive())
            .fetch_one(&mut *tx)
            .await?;

            let size = Self::size_label(item);
            let mut piece_ids = Vec::with_capacity(item.quantity_ordered as usize);
            for i in 1..=item.quantity_ordered as usize {
                let item_id = make_piece_code(&batch_code, i);
                // Short codes carry a UNIQUE constraint; redraw on collision
                let mut inserted = false;
                for _ in 0..SHORT_CODE_ATTEMPTS {
                    let row = sqlx::query_scalar::<_, i64>(
                        r#"
                        INSERT INTO pieces
                            (batch_id, po_item_id, item_id, barcode_short,
                             product_name, category, size)
                        VALUES ($1, $2, $3, $4, $5, $6, $7)
                        ON CONFLICT (barcode_short) DO NOTHING
                        RETURNING stock_id
                        "#,
                    )
                    .bind(batch_id)
                    .bind(item.po_item_id)
                    .bind(&item_id)
                    .bind(random_short_code())
                    .bind(&item.item_name)
                    .bind(category.as_str())
                    .bind(&size)
                    .fetch_optional(&mut *tx)
                    .await?;
                    if row.is_some() {
                        inserted = true;
                        break;
                    }
                }
                if !inserted {
                    return Err(anyhow::anyhow!(
                        "could not allocate a unique short code for {item_id}"
                    )
                    .into());
                }
                piece_ids.push(item_id);
            }

            sqlx::query(
                r#"
                UPDATE purchase_order_items
                SET batch_created = TRUE, batch_code = $1, arrival_status = $2
                WHERE po_item_id = $3
                "#,
            )
            .bind(&batch_code)
            .bind(ArrivalStatus::Arrived.as_str())
            .bind(item.po_item_id)
            .execute(&mut *tx)
            .await?;

            created.push(GeneratedBatch {
                po_item_id: item.po_item_id,
                batch_id,
                batch_code,
                batch_quantity: item.quantity_ordered,
                piece_ids,
            });
        }

        tx.commit().await?;
        tracing::info!(po_id, batches = created.len(), "order marked arrived");
        Ok(created)
    }

    fn require_invoice(invoice: &str) -> AppResult<()> {
        validate_batch_invoice(invoice).map_err(|message| AppError::Validation {
            field: "po_invoice_no".to_string(),
            message: message.to_string(),
        })
    }

    async fn invoice_for(&self, po_id: i64) -> AppResult<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT po_invoice_no FROM purchase_orders WHERE po_id = $1",
        )
        .bind(po_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))
    }

    async fn items_for(&self, po_id: i64) -> AppResult<Vec<ItemRow>> {
        let items = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT po_item_id, item_name, category, quantity_ordered,
                   height_cm, width_cm, thickness_cm, batch_created, batch_code
            FROM purchase_order_items
            WHERE po_id = $1
            ORDER BY po_item_id
            "#,
        )
        .bind(po_id)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    fn size_label(item: &ItemRow) -> Option<String> {
        match (item.height_cm, item.width_cm) {
            (Some(h), Some(w)) => {
                let mut label = format!("{}x{}", h.normalize(), w.normalize());
                if let Some(t) = item.thickness_cm {
                    label.push_str(&format!("x{}", t.normalize()));
                }
                Some(label)
            }
            _ => None,
        }
    }
}
