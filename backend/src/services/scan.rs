//! Scan service: applies stock ledger transitions to pieces
//!
//! Every status change goes through [`ScanService::apply_transition`]: a
//! compare-and-swap on the piece row inside a transaction, a single-statement
//! counter update on the batch, reserved-stock bookkeeping, and an append to
//! the movement log. The swap's WHERE clause carries the expected status, so
//! two concurrent scans of the same piece can never both succeed.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use shared::ledger::{replay, LedgerEvent};
use shared::models::DeliveryMode;
use shared::validation::{validate_bulk_ids, validate_delivery_order_no};

use crate::error::{AppError, AppResult};

/// Scan service for dispatch, sale, and return transitions
#[derive(Clone)]
pub struct ScanService {
    db: PgPool,
}

/// Piece row as read inside a transition
#[derive(Debug, FromRow)]
struct PieceRow {
    stock_id: i64,
    batch_id: i64,
    item_id: String,
    status: String,
    client_id: Option<i64>,
}

/// Batch counters as stored
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BatchCountersView {
    pub batch_id: i64,
    pub batch_code: String,
    pub batch_quantity: i32,
    pub out_count: i32,
    pub sold_count: i32,
    pub returned_count: i32,
    pub available: i32,
}

/// Outcome of a single applied transition
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub item_id: String,
    pub status: String,
    pub batch: BatchCountersView,
}

/// Input for dispatching a single piece to a client
#[derive(Debug, Deserialize)]
pub struct MarkOutInput {
    pub item_id: String,
    pub client_id: i64,
    pub delivery_order_no: Option<String>,
    pub note: Option<String>,
}

/// Input for dispatching many pieces in one scan session
#[derive(Debug, Deserialize)]
pub struct BulkMarkOutInput {
    pub item_ids: Vec<String>,
    pub client_id: i64,
    pub delivery_order_no: Option<String>,
    pub note: Option<String>,
}

/// Input for confirming the sale of a dispatched piece
#[derive(Debug, Deserialize)]
pub struct ConfirmSaleInput {
    pub item_id: String,
    pub delivery_order_no: String,
}

/// Input for invoicing everything a client currently has out
#[derive(Debug, Deserialize)]
pub struct ClearReservedInput {
    pub client_id: i64,
    pub delivery_order_no: String,
}

/// Input for reverting a confirmed sale
#[derive(Debug, Deserialize)]
pub struct UndoSaleInput {
    pub item_id: String,
    pub reason: Option<String>,
}

/// Input for a return scan
#[derive(Debug, Deserialize)]
pub struct ReturnInput {
    pub item_id: String,
    pub reason: Option<String>,
}

/// One piece that could not be transitioned during a bulk operation
#[derive(Debug, Clone, Serialize)]
pub struct BulkFailureEntry {
    pub item_id: String,
    pub reason: String,
}

/// Bulk operations succeed or fail per piece, never all-or-nothing
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkScanResponse {
    pub applied: Vec<String>,
    pub failures: Vec<BulkFailureEntry>,
}

/// Piece details for a barcode lookup
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PieceLookup {
    pub stock_id: i64,
    pub item_id: String,
    pub barcode_short: String,
    pub batch_code: String,
    pub product_name: String,
    pub category: String,
    pub size: Option<String>,
    pub status: String,
    pub client_id: Option<i64>,
    pub delivery_order_no: Option<String>,
}

impl ScanService {
    /// Create a new ScanService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Dispatch one piece to a client
    pub async fn mark_out(&self, input: MarkOutInput) -> AppResult<TransitionOutcome> {
        self.apply_transition(
            &input.item_id,
            LedgerEvent::MarkOut,
            Some(input.client_id),
            input.delivery_order_no.as_deref(),
            DeliveryMode::SingleScan,
            input.note.as_deref(),
        )
        .await
    }

    /// Dispatch many pieces; each piece succeeds or fails on its own
    pub async fn mark_out_bulk(&self, input: BulkMarkOutInput) -> AppResult<BulkScanResponse> {
        validate_bulk_ids(&input.item_ids).map_err(|msg| AppError::Validation {
            field: "item_ids".to_string(),
            message: msg.to_string(),
        })?;

        let mut response = BulkScanResponse::default();
        for item_id in &input.item_ids {
            let result = self
                .apply_transition(
                    item_id,
                    LedgerEvent::MarkOut,
                    Some(input.client_id),
                    input.delivery_order_no.as_deref(),
                    DeliveryMode::BulkScan,
                    input.note.as_deref(),
                )
                .await;
            match result {
                Ok(outcome) => response.applied.push(outcome.item_id),
                Err(err @ (AppError::Precondition { .. } | AppError::NotFound(_))) => {
                    response.failures.push(BulkFailureEntry {
                        item_id: item_id.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        tracing::info!(
            applied = response.applied.len(),
            failed = response.failures.len(),
            "bulk mark-out completed"
        );
        Ok(response)
    }

    /// Confirm the sale of a dispatched piece
    pub async fn confirm_sale(&self, input: ConfirmSaleInput) -> AppResult<TransitionOutcome> {
        validate_delivery_order_no(&input.delivery_order_no).map_err(|msg| {
            AppError::Validation {
                field: "delivery_order_no".to_string(),
                message: msg.to_string(),
            }
        })?;

        self.apply_transition(
            &input.item_id,
            LedgerEvent::ClearToSold,
            None,
            Some(&input.delivery_order_no),
            DeliveryMode::SingleScan,
            None,
        )
        .await
    }

    /// Invoice everything a client currently has reserved
    pub async fn clear_reserved(&self, input: ClearReservedInput) -> AppResult<BulkScanResponse> {
        validate_delivery_order_no(&input.delivery_order_no).map_err(|msg| {
            AppError::Validation {
                field: "delivery_order_no".to_string(),
                message: msg.to_string(),
            }
        })?;

        let item_ids = sqlx::query_scalar::<_, String>(
            "SELECT item_id FROM reserved_stocks WHERE client_id = $1 ORDER BY reserved_at",
        )
        .bind(input.client_id)
        .fetch_all(&self.db)
        .await?;

        if item_ids.is_empty() {
            return Err(AppError::NotFound("Reserved stock for client".to_string()));
        }

        let mut response = BulkScanResponse::default();
        for item_id in &item_ids {
            let result = self
                .apply_transition(
                    item_id,
                    LedgerEvent::ClearToSold,
                    None,
                    Some(&input.delivery_order_no),
                    DeliveryMode::ReservedClear,
                    None,
                )
                .await;
            match result {
                Ok(outcome) => response.applied.push(outcome.item_id),
                Err(err @ (AppError::Precondition { .. } | AppError::NotFound(_))) => {
                    response.failures.push(BulkFailureEntry {
                        item_id: item_id.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(response)
    }

    /// Revert a confirmed sale back to dispatched
    pub async fn undo_sale(&self, input: UndoSaleInput) -> AppResult<TransitionOutcome> {
        self.apply_transition(
            &input.item_id,
            LedgerEvent::UndoSale,
            None,
            None,
            DeliveryMode::SingleScan,
            input.reason.as_deref(),
        )
        .await
    }

    /// Return a dispatched piece before it was invoiced
    pub async fn return_before_invoice(&self, input: ReturnInput) -> AppResult<TransitionOutcome> {
        self.apply_transition(
            &input.item_id,
            LedgerEvent::ReturnBeforeInvoice,
            None,
            None,
            DeliveryMode::SingleScan,
            input.reason.as_deref(),
        )
        .await
    }

    /// Return a sold piece back into availability
    pub async fn return_after_sale(&self, input: ReturnInput) -> AppResult<TransitionOutcome> {
        self.apply_transition(
            &input.item_id,
            LedgerEvent::ReturnAfterSale,
            None,
            None,
            DeliveryMode::SingleScan,
            input.reason.as_deref(),
        )
        .await
    }

    /// Look up a piece by its full item id or its short barcode payload
    pub async fn lookup(&self, code: &str) -> AppResult<PieceLookup> {
        sqlx::query_as::<_, PieceLookup>(
            r#"
            SELECT p.stock_id, p.item_id, p.barcode_short, b.batch_code,
                   p.product_name, p.category, p.size, p.status,
                   p.client_id, p.delivery_order_no
            FROM pieces p
            JOIN stock_batches b ON b.batch_id = p.batch_id
            WHERE p.item_id = $1 OR p.barcode_short = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Piece".to_string()))
    }

    /// Rebuild a batch's counters from its movement log. The log is the
    /// source of truth; the stored counters are a cache.
    pub async fn recount_batch(&self, batch_id: i64) -> AppResult<BatchCountersView> {
        let batch_quantity = sqlx::query_scalar::<_, i32>(
            "SELECT batch_quantity FROM stock_batches WHERE batch_id = $1",
        )
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        let event_names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT m.event
            FROM stock_movements m
            JOIN pieces p ON p.stock_id = m.stock_id
            WHERE p.batch_id = $1
            ORDER BY m.movement_id
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.db)
        .await?;

        let events = event_names
            .iter()
            .filter_map(|name| LedgerEvent::parse(name));
        let counters = replay(batch_quantity, events);

        sqlx::query(
            r#"
            UPDATE stock_batches
            SET out_count = $1, sold_count = $2, returned_count = $3, updated_at = NOW()
            WHERE batch_id = $4
            "#,
        )
        .bind(counters.out)
        .bind(counters.sold)
        .bind(counters.returned)
        .bind(batch_id)
        .execute(&self.db)
        .await?;

        tracing::info!(batch_id, "batch counters rebuilt from movement log");
        self.batch_counters(batch_id).await
    }

    /// Apply one ledger event to one piece. The UPDATE's status guard is the
    /// concurrency barrier: zero rows affected means another scan won.
    async fn apply_transition(
        &self,
        code: &str,
        event: LedgerEvent,
        client_id: Option<i64>,
        delivery_order_no: Option<&str>,
        mode: DeliveryMode,
        reason: Option<&str>,
    ) -> AppResult<TransitionOutcome> {
        let expected = event.expected_status();
        let next = event.next_status();

        let mut tx = self.db.begin().await?;

        let piece = sqlx::query_as::<_, PieceRow>(
            r#"
            SELECT stock_id, batch_id, item_id, status, client_id
            FROM pieces
            WHERE item_id = $1 OR barcode_short = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Piece".to_string()))?;

        // Reject stale scans before writing anything; the status guard on
        // the UPDATE below still decides races
        if piece.status != expected.as_str() {
            return Err(AppError::Precondition {
                piece_id: piece.item_id,
                expected: expected.as_str().to_string(),
                actual: piece.status,
            });
        }

        let updated = match event {
            LedgerEvent::MarkOut | LedgerEvent::ClearToSold => {
                sqlx::query(
                    r#"
                    UPDATE pieces
                    SET status = $1,
                        client_id = COALESCE($2, client_id),
                        delivery_order_no = COALESCE($3, delivery_order_no),
                        updated_at = NOW()
                    WHERE stock_id = $4 AND status = $5
                    "#,
                )
                .bind(next.as_str())
                .bind(client_id)
                .bind(delivery_order_no)
                .bind(piece.stock_id)
                .bind(expected.as_str())
                .execute(&mut *tx)
                .await?
            }
            LedgerEvent::UndoSale => {
                sqlx::query(
                    r#"
                    UPDATE pieces
                    SET status = $1, updated_at = NOW()
                    WHERE stock_id = $2 AND status = $3
                    "#,
                )
                .bind(next.as_str())
                .bind(piece.stock_id)
                .bind(expected.as_str())
                .execute(&mut *tx)
                .await?
            }
            LedgerEvent::ReturnBeforeInvoice | LedgerEvent::ReturnAfterSale => {
                sqlx::query(
                    r#"
                    UPDATE pieces
                    SET status = $1, client_id = NULL, delivery_order_no = NULL,
                        updated_at = NOW()
                    WHERE stock_id = $2 AND status = $3
                    "#,
                )
                .bind(next.as_str())
                .bind(piece.stock_id)
                .bind(expected.as_str())
                .execute(&mut *tx)
                .await?
            }
        };

        if updated.rows_affected() == 0 {
            // Lost the race or the piece was never in the expected state
            let actual = sqlx::query_scalar::<_, String>(
                "SELECT status FROM pieces WHERE stock_id = $1",
            )
            .bind(piece.stock_id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(AppError::Precondition {
                piece_id: piece.item_id,
                expected: expected.as_str().to_string(),
                actual,
            });
        }

        let delta = event.counter_delta();
        sqlx::query(
            r#"
            UPDATE stock_batches
            SET out_count = out_count + $1,
                sold_count = sold_count + $2,
                returned_count = returned_count + $3,
                updated_at = NOW()
            WHERE batch_id = $4
            "#,
        )
        .bind(delta.out)
        .bind(delta.sold)
        .bind(delta.returned)
        .bind(piece.batch_id)
        .execute(&mut *tx)
        .await?;

        match event {
            // Out and undone-sale pieces sit with the client pending invoice
            LedgerEvent::MarkOut | LedgerEvent::UndoSale => {
                sqlx::query(
                    r#"
                    INSERT INTO reserved_stocks
                        (stock_id, item_id, batch_code, client_id, delivery_order_no, note)
                    SELECT p.stock_id, p.item_id, b.batch_code, $2, $3, $4
                    FROM pieces p
                    JOIN stock_batches b ON b.batch_id = p.batch_id
                    WHERE p.stock_id = $1
                    ON CONFLICT (stock_id) DO UPDATE
                        SET client_id = EXCLUDED.client_id,
                            delivery_order_no = EXCLUDED.delivery_order_no,
                            note = EXCLUDED.note,
                            reserved_at = NOW()
                    "#,
                )
                .bind(piece.stock_id)
                .bind(client_id.or(piece.client_id))
                .bind(delivery_order_no)
                .bind(reason)
                .execute(&mut *tx)
                .await?;
            }
            LedgerEvent::ClearToSold
            | LedgerEvent::ReturnBeforeInvoice
            | LedgerEvent::ReturnAfterSale => {
                sqlx::query("DELETE FROM reserved_stocks WHERE stock_id = $1")
                    .bind(piece.stock_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        if matches!(
            event,
            LedgerEvent::ReturnBeforeInvoice | LedgerEvent::ReturnAfterSale
        ) {
            sqlx::query(
                r#"
                INSERT INTO return_list
                    (stock_id, item_id, batch_code, client_id, return_type, reason)
                SELECT p.stock_id, p.item_id, b.batch_code, $2, $3, $4
                FROM pieces p
                JOIN stock_batches b ON b.batch_id = p.batch_id
                WHERE p.stock_id = $1
                "#,
            )
            .bind(piece.stock_id)
            .bind(piece.client_id)
            .bind(event.as_str())
            .bind(reason)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO stock_movements
                (stock_id, event, client_id, delivery_order_no, delivery_mode, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(piece.stock_id)
        .bind(event.as_str())
        .bind(client_id.or(piece.client_id))
        .bind(delivery_order_no)
        .bind(mode.as_str())
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        let batch = Self::counters_in_tx(&mut tx, piece.batch_id).await?;

        tx.commit().await?;

        tracing::debug!(
            item_id = %piece.item_id,
            event = %event,
            status = %next,
            "transition applied"
        );

        Ok(TransitionOutcome {
            item_id: piece.item_id,
            status: next.as_str().to_string(),
            batch,
        })
    }

    /// Read current counters for a batch
    pub async fn batch_counters(&self, batch_id: i64) -> AppResult<BatchCountersView> {
        sqlx::query_as::<_, BatchCountersView>(
            r#"
            SELECT batch_id, batch_code, batch_quantity, out_count, sold_count,
                   returned_count,
                   batch_quantity - out_count - sold_count AS available
            FROM stock_batches
            WHERE batch_id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))
    }

    async fn counters_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        batch_id: i64,
    ) -> AppResult<BatchCountersView> {
        sqlx::query_as::<_, BatchCountersView>(
            r#"
            SELECT batch_id, batch_code, batch_quantity, out_count, sold_count,
                   returned_count,
                   batch_quantity - out_count - sold_count AS available
            FROM stock_batches
            WHERE batch_id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))
    }
}
