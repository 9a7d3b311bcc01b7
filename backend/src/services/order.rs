//! Purchase order service: vendors, line items, pricing, payments
//!
//! All money and unit totals are recomputed server-side from the stored
//! lines via `shared::pricing`; a client-sent total is never trusted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use shared::models::Category;
use shared::types::{PaginatedResponse, PaginationMeta};
use shared::pricing::{
    auto_fill_sqmt, compute_order_totals, round_money, AdditionalCharges, OrderTotals, PriceLine,
};
use shared::validation::{
    validate_category_label, validate_charge, validate_dimension, validate_invoice_no,
    validate_payment, validate_quantity, validate_unit_price,
};

use crate::error::{AppError, AppResult};

/// Purchase order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Input for one line item; `po_item_id` is present when editing an
/// existing line
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemInput {
    pub po_item_id: Option<i64>,
    pub item_name: String,
    pub category: String,
    pub quantity_ordered: i32,
    pub unit_price: Decimal,
    pub height_cm: Option<Decimal>,
    pub width_cm: Option<Decimal>,
    pub thickness_cm: Option<Decimal>,
    pub colour: Option<String>,
    pub sqmt: Option<Decimal>,
}

/// Input for creating or replacing a purchase order
#[derive(Debug, Deserialize)]
pub struct OrderInput {
    pub po_invoice_no: Option<String>,
    pub po_date: NaiveDate,
    pub vendor_id: Option<i64>,
    pub vendor_name: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub ocean_freight: Decimal,
    #[serde(default)]
    pub insurance: Decimal,
    #[serde(default)]
    pub fumigation: Decimal,
    #[serde(default)]
    pub clearance: Decimal,
    /// Explicit total-unit override; derived from lines when absent
    pub total_sqmt: Option<Decimal>,
    /// Explicit landing-cost override; derived when absent
    pub landing_cost: Option<Decimal>,
    pub items: Vec<LineItemInput>,
}

/// Input for recording a payment against an order
#[derive(Debug, Deserialize)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: Option<String>,
    pub notes: Option<String>,
}

/// Purchase order header as stored
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderHeader {
    pub po_id: i64,
    pub po_invoice_no: String,
    pub po_date: NaiveDate,
    pub vendor_id: i64,
    pub vendor_name: String,
    pub notes: Option<String>,
    pub status: String,
    pub ocean_freight: Decimal,
    pub insurance: Decimal,
    pub fumigation: Decimal,
    pub clearance: Decimal,
    pub total_sqmt: Option<Decimal>,
    pub landing_cost: Option<Decimal>,
}

/// Line item as stored
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LineItemView {
    pub po_item_id: i64,
    pub item_name: String,
    pub category: String,
    pub quantity_ordered: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub height_cm: Option<Decimal>,
    pub width_cm: Option<Decimal>,
    pub thickness_cm: Option<Decimal>,
    pub colour: Option<String>,
    pub sqmt: Option<Decimal>,
    pub arrival_status: String,
    pub batch_created: bool,
    pub batch_code: Option<String>,
    pub edit_count: i32,
}

/// Full order view returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub order: OrderHeader,
    pub items: Vec<LineItemView>,
    pub totals: OrderTotals,
    pub amount_paid: Decimal,
}

/// Payment as recorded
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentView {
    pub payment_id: i64,
    pub po_id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: Option<String>,
    pub notes: Option<String>,
}

/// Validated, priced line ready to persist
struct PricedLine {
    input: LineItemInput,
    category: Category,
    sqmt: Option<Decimal>,
    total_price: Decimal,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a purchase order with its line items
    pub async fn create_order(&self, input: OrderInput) -> AppResult<OrderResponse> {
        let invoice = input.po_invoice_no.clone().unwrap_or_default();
        Self::validate_header(&invoice, &input)?;
        let priced = Self::price_lines(&input.items)?;

        let mut tx = self.db.begin().await?;

        if !invoice.is_empty() {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE po_invoice_no = $1)",
            )
            .bind(&invoice)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(AppError::DuplicateInvoice(invoice));
            }
        }

        let vendor_id = Self::resolve_vendor(&mut tx, input.vendor_id, &input.vendor_name).await?;

        let po_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO purchase_orders
                (po_invoice_no, po_date, vendor_id, notes,
                 ocean_freight, insurance, fumigation, clearance,
                 total_sqmt, landing_cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING po_id
            "#,
        )
        .bind(&invoice)
        .bind(input.po_date)
        .bind(vendor_id)
        .bind(&input.notes)
        .bind(input.ocean_freight)
        .bind(input.insurance)
        .bind(input.fumigation)
        .bind(input.clearance)
        .bind(input.total_sqmt)
        .bind(input.landing_cost)
        .fetch_one(&mut *tx)
        .await?;

        for line in &priced {
            Self::insert_line(&mut tx, po_id, line).await?;
        }

        tx.commit().await?;
        tracing::info!(po_id, lines = priced.len(), "purchase order created");
        self.get_order(po_id).await
    }

    /// Update an order and synchronize its line items. Lines missing from
    /// the input are deleted; a line that already has a batch cannot be
    /// deleted and its quantity cannot change.
    pub async fn update_order(&self, po_id: i64, input: OrderInput) -> AppResult<OrderResponse> {
        let invoice = input.po_invoice_no.clone().unwrap_or_default();
        Self::validate_header(&invoice, &input)?;

        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE po_id = $1)",
        )
        .bind(po_id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }

        if !invoice.is_empty() {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE po_invoice_no = $1 AND po_id <> $2)",
            )
            .bind(&invoice)
            .bind(po_id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(AppError::DuplicateInvoice(invoice));
            }
        }

        let vendor_id = Self::resolve_vendor(&mut tx, input.vendor_id, &input.vendor_name).await?;

        sqlx::query(
            r#"
            UPDATE purchase_orders
            SET po_invoice_no = $1, po_date = $2, vendor_id = $3, notes = $4,
                ocean_freight = $5, insurance = $6, fumigation = $7, clearance = $8,
                total_sqmt = $9, landing_cost = $10
            WHERE po_id = $11
            "#,
        )
        .bind(&invoice)
        .bind(input.po_date)
        .bind(vendor_id)
        .bind(&input.notes)
        .bind(input.ocean_freight)
        .bind(input.insurance)
        .bind(input.fumigation)
        .bind(input.clearance)
        .bind(input.total_sqmt)
        .bind(input.landing_cost)
        .bind(po_id)
        .execute(&mut *tx)
        .await?;

        let existing = sqlx::query_as::<_, LineItemView>(
            r#"
            SELECT po_item_id, item_name, category, quantity_ordered, unit_price,
                   total_price, height_cm, width_cm, thickness_cm, colour, sqmt,
                   arrival_status, batch_created, batch_code, edit_count
            FROM purchase_order_items
            WHERE po_id = $1
            "#,
        )
        .bind(po_id)
        .fetch_all(&mut *tx)
        .await?;

        // Lines absent from the input get deleted, unless batched
        let kept_ids: Vec<i64> = input.items.iter().filter_map(|i| i.po_item_id).collect();
        for row in &existing {
            if !kept_ids.contains(&row.po_item_id) {
                if row.batch_created {
                    return Err(AppError::QuantityLocked(format!(
                        "Line {} already has batch {}; it cannot be removed",
                        row.po_item_id,
                        row.batch_code.as_deref().unwrap_or("?")
                    )));
                }
                sqlx::query("DELETE FROM purchase_order_items WHERE po_item_id = $1")
                    .bind(row.po_item_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        for item in &input.items {
            match item.po_item_id {
                Some(item_id) => {
                    let stored = existing
                        .iter()
                        .find(|r| r.po_item_id == item_id)
                        .ok_or_else(|| AppError::NotFound("Line item".to_string()))?;
                    Self::update_line(&mut tx, stored, item).await?;
                }
                None => {
                    let priced = Self::price_line(item)?;
                    Self::insert_line(&mut tx, po_id, &priced).await?;
                }
            }
        }

        tx.commit().await?;
        tracing::info!(po_id, "purchase order updated");
        self.get_order(po_id).await
    }

    /// Fetch one order with computed totals
    pub async fn get_order(&self, po_id: i64) -> AppResult<OrderResponse> {
        let header = sqlx::query_as::<_, OrderHeader>(
            r#"
            SELECT o.po_id, o.po_invoice_no, o.po_date, o.vendor_id, v.vendor_name,
                   o.notes, o.status, o.ocean_freight, o.insurance, o.fumigation,
                   o.clearance, o.total_sqmt, o.landing_cost
            FROM purchase_orders o
            JOIN vendors v ON v.vendor_id = o.vendor_id
            WHERE o.po_id = $1
            "#,
        )
        .bind(po_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let items = sqlx::query_as::<_, LineItemView>(
            r#"
            SELECT po_item_id, item_name, category, quantity_ordered, unit_price,
                   total_price, height_cm, width_cm, thickness_cm, colour, sqmt,
                   arrival_status, batch_created, batch_code, edit_count
            FROM purchase_order_items
            WHERE po_id = $1
            ORDER BY po_item_id
            "#,
        )
        .bind(po_id)
        .fetch_all(&self.db)
        .await?;

        let amount_paid = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(amount) FROM payments WHERE po_id = $1",
        )
        .bind(po_id)
        .fetch_one(&self.db)
        .await?
        .unwrap_or(Decimal::ZERO);

        let totals = Self::totals_for(&header, &items);

        Ok(OrderResponse {
            order: header,
            items,
            totals,
            amount_paid,
        })
    }

    /// List orders, newest first
    pub async fn list_orders(
        &self,
        page: u32,
        per_page: u32,
    ) -> AppResult<PaginatedResponse<OrderHeader>> {
        let total_items = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchase_orders")
            .fetch_one(&self.db)
            .await? as u64;

        let offset = (page.saturating_sub(1) as i64) * per_page as i64;
        let orders = sqlx::query_as::<_, OrderHeader>(
            r#"
            SELECT o.po_id, o.po_invoice_no, o.po_date, o.vendor_id, v.vendor_name,
                   o.notes, o.status, o.ocean_freight, o.insurance, o.fumigation,
                   o.clearance, o.total_sqmt, o.landing_cost
            FROM purchase_orders o
            JOIN vendors v ON v.vendor_id = o.vendor_id
            ORDER BY o.po_date DESC, o.po_id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: orders,
            pagination: PaginationMeta::new(page, per_page, total_items),
        })
    }

    /// Delete an order. Blocked once any line has generated batches.
    pub async fn delete_order(&self, po_id: i64) -> AppResult<()> {
        let batched = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM purchase_order_items WHERE po_id = $1 AND batch_created)",
        )
        .bind(po_id)
        .fetch_one(&self.db)
        .await?;
        if batched {
            return Err(AppError::QuantityLocked(
                "Order has generated batches and cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM purchase_orders WHERE po_id = $1")
            .bind(po_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }
        tracing::info!(po_id, "purchase order deleted");
        Ok(())
    }

    /// Record a payment and re-derive the order's payment status
    pub async fn record_payment(&self, po_id: i64, input: PaymentInput) -> AppResult<PaymentView> {
        let order = self.get_order(po_id).await?;
        let grand_total = round_money(order.totals.grand_total);

        let status = validate_payment(input.amount, order.amount_paid, grand_total)
            .map_err(|msg| match msg {
                "Payment exceeds order total" => AppError::PaymentExceedsTotal,
                other => AppError::Validation {
                    field: "amount".to_string(),
                    message: other.to_string(),
                },
            })?;

        let mut tx = self.db.begin().await?;

        let payment = sqlx::query_as::<_, PaymentView>(
            r#"
            INSERT INTO payments (po_id, amount, payment_date, method, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING payment_id, po_id, amount, payment_date, method, notes
            "#,
        )
        .bind(po_id)
        .bind(input.amount)
        .bind(input.payment_date)
        .bind(&input.method)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE purchase_orders SET status = $1 WHERE po_id = $2")
            .bind(status.as_str())
            .bind(po_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(po_id, amount = %input.amount, status = status.as_str(), "payment recorded");
        Ok(payment)
    }

    /// List payments for an order
    pub async fn list_payments(&self, po_id: i64) -> AppResult<Vec<PaymentView>> {
        let payments = sqlx::query_as::<_, PaymentView>(
            r#"
            SELECT payment_id, po_id, amount, payment_date, method, notes
            FROM payments
            WHERE po_id = $1
            ORDER BY payment_date, payment_id
            "#,
        )
        .bind(po_id)
        .fetch_all(&self.db)
        .await?;
        Ok(payments)
    }

    fn validate_header(invoice: &str, input: &OrderInput) -> AppResult<()> {
        validate_invoice_no(invoice).map_err(|msg| AppError::Validation {
            field: "po_invoice_no".to_string(),
            message: msg.to_string(),
        })?;
        for (field, value) in [
            ("ocean_freight", input.ocean_freight),
            ("insurance", input.insurance),
            ("fumigation", input.fumigation),
            ("clearance", input.clearance),
        ] {
            validate_charge(value).map_err(|msg| AppError::Validation {
                field: field.to_string(),
                message: msg.to_string(),
            })?;
        }
        if input.vendor_id.is_none() && input.vendor_name.as_deref().unwrap_or("").trim().is_empty()
        {
            return Err(AppError::Validation {
                field: "vendor".to_string(),
                message: "A vendor id or vendor name is required".to_string(),
            });
        }
        Ok(())
    }

    /// Validate and price every input line
    fn price_lines(items: &[LineItemInput]) -> AppResult<Vec<PricedLine>> {
        items.iter().map(Self::price_line).collect()
    }

    fn price_line(item: &LineItemInput) -> AppResult<PricedLine> {
        let category =
            validate_category_label(&item.category).map_err(|msg| AppError::Validation {
                field: "category".to_string(),
                message: msg.to_string(),
            })?;
        validate_quantity(item.quantity_ordered).map_err(|msg| AppError::Validation {
            field: "quantity_ordered".to_string(),
            message: msg.to_string(),
        })?;
        validate_unit_price(item.unit_price).map_err(|msg| AppError::Validation {
            field: "unit_price".to_string(),
            message: msg.to_string(),
        })?;
        for (field, dim) in [
            ("width_cm", item.width_cm),
            ("height_cm", item.height_cm),
            ("thickness_cm", item.thickness_cm),
        ] {
            validate_dimension(dim).map_err(|msg| AppError::Validation {
                field: field.to_string(),
                message: msg.to_string(),
            })?;
        }

        // An explicit positive sqmt is an override; otherwise auto-fill
        // from the dimensions
        let sqmt = match item.sqmt {
            Some(s) if s > Decimal::ZERO => Some(s),
            _ => auto_fill_sqmt(item.width_cm, item.height_cm, item.quantity_ordered),
        };

        let line = PriceLine {
            category,
            quantity_ordered: item.quantity_ordered,
            unit_price: item.unit_price,
            width_cm: item.width_cm,
            height_cm: item.height_cm,
            sqmt,
        };
        let total_price = round_money(shared::pricing::line_total(&line));

        Ok(PricedLine {
            input: item.clone(),
            category,
            sqmt,
            total_price,
        })
    }

    async fn insert_line(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        po_id: i64,
        line: &PricedLine,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO purchase_order_items
                (po_id, item_name, category, quantity_ordered, unit_price, total_price,
                 height_cm, width_cm, thickness_cm, colour, sqmt)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(po_id)
        .bind(&line.input.item_name)
        .bind(line.category.as_str())
        .bind(line.input.quantity_ordered)
        .bind(line.input.unit_price)
        .bind(line.total_price)
        .bind(line.input.height_cm)
        .bind(line.input.width_cm)
        .bind(line.input.thickness_cm)
        .bind(&line.input.colour)
        .bind(line.sqmt)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Update one existing line. Quantity is frozen once a batch exists; a
    /// dimension or quantity edit clears the sqmt override and re-derives it.
    async fn update_line(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        stored: &LineItemView,
        item: &LineItemInput,
    ) -> AppResult<()> {
        if stored.batch_created && item.quantity_ordered != stored.quantity_ordered {
            return Err(AppError::QuantityLocked(format!(
                "Line {} already has batch {}; quantity cannot change",
                stored.po_item_id,
                stored.batch_code.as_deref().unwrap_or("?")
            )));
        }

        let priced = Self::price_line(item)?;

        let dims_changed = stored.width_cm != item.width_cm
            || stored.height_cm != item.height_cm
            || stored.quantity_ordered != item.quantity_ordered;
        let override_changed = item.sqmt.is_some() && item.sqmt != stored.sqmt;

        let sqmt = if override_changed {
            item.sqmt
        } else if dims_changed {
            auto_fill_sqmt(item.width_cm, item.height_cm, item.quantity_ordered)
        } else {
            stored.sqmt
        };

        let line = PriceLine {
            category: priced.category,
            quantity_ordered: item.quantity_ordered,
            unit_price: item.unit_price,
            width_cm: item.width_cm,
            height_cm: item.height_cm,
            sqmt,
        };
        let total_price = round_money(shared::pricing::line_total(&line));

        sqlx::query(
            r#"
            UPDATE purchase_order_items
            SET item_name = $1, category = $2, quantity_ordered = $3, unit_price = $4,
                total_price = $5, height_cm = $6, width_cm = $7, thickness_cm = $8,
                colour = $9, sqmt = $10, edit_count = edit_count + 1
            WHERE po_item_id = $11
            "#,
        )
        .bind(&item.item_name)
        .bind(priced.category.as_str())
        .bind(item.quantity_ordered)
        .bind(item.unit_price)
        .bind(total_price)
        .bind(item.height_cm)
        .bind(item.width_cm)
        .bind(item.thickness_cm)
        .bind(&item.colour)
        .bind(sqmt)
        .bind(stored.po_item_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn resolve_vendor(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        vendor_id: Option<i64>,
        vendor_name: &Option<String>,
    ) -> AppResult<i64> {
        if let Some(id) = vendor_id {
            let exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM vendors WHERE vendor_id = $1)")
                    .bind(id)
                    .fetch_one(&mut **tx)
                    .await?;
            if !exists {
                return Err(AppError::NotFound("Vendor".to_string()));
            }
            return Ok(id);
        }

        // Upsert by name: orders regularly arrive with just a vendor name
        let name = vendor_name.as_deref().unwrap_or("").trim().to_string();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO vendors (vendor_name)
            VALUES ($1)
            ON CONFLICT (vendor_name) DO UPDATE SET vendor_name = EXCLUDED.vendor_name
            RETURNING vendor_id
            "#,
        )
        .bind(&name)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    /// Recompute totals for a stored order
    fn totals_for(header: &OrderHeader, items: &[LineItemView]) -> OrderTotals {
        let lines: Vec<PriceLine> = items
            .iter()
            .map(|i| PriceLine {
                category: Category::from_label(&i.category),
                quantity_ordered: i.quantity_ordered,
                unit_price: i.unit_price,
                width_cm: i.width_cm,
                height_cm: i.height_cm,
                sqmt: i.sqmt,
            })
            .collect();
        let charges = AdditionalCharges {
            ocean_freight: header.ocean_freight,
            insurance: header.insurance,
            fumigation: header.fumigation,
            clearance: header.clearance,
        };
        compute_order_totals(&lines, &charges, header.total_sqmt, header.landing_cost)
    }
}
