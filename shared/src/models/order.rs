//! Purchase order models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Category;

/// Arrival lifecycle of a purchase-order line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalStatus {
    Ordered,
    QrGenerated,
    Arrived,
}

impl ArrivalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrivalStatus::Ordered => "ordered",
            ArrivalStatus::QrGenerated => "qr_generated",
            ArrivalStatus::Arrived => "arrived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ordered" => Some(ArrivalStatus::Ordered),
            "qr_generated" => Some(ArrivalStatus::QrGenerated),
            "arrived" => Some(ArrivalStatus::Arrived),
            _ => None,
        }
    }
}

/// One ordered product line on a purchase order.
///
/// `total_price` is always recomputed from quantity/unit price/sqmt and
/// category; it is never accepted from a caller once stored. After a batch
/// has been created for the line, `quantity_ordered` is frozen and only
/// `edit_count` records further edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLineItem {
    pub po_item_id: i64,
    pub po_id: i64,
    pub item_name: String,
    pub category: Category,
    pub quantity_ordered: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    /// Dimensions in centimetres
    pub height_cm: Option<Decimal>,
    pub width_cm: Option<Decimal>,
    pub thickness_cm: Option<Decimal>,
    pub colour: Option<String>,
    /// Explicit square-metre override for area-priced categories
    pub sqmt: Option<Decimal>,
    pub arrival_status: ArrivalStatus,
    pub batch_created: bool,
    pub batch_code: Option<String>,
    pub edit_count: i32,
}

/// A purchase order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub po_id: i64,
    pub po_invoice_no: String,
    pub po_date: Option<NaiveDate>,
    pub vendor_id: i64,
    pub notes: Option<String>,
    pub status: PaymentStatus,
    pub ocean_freight: Decimal,
    pub insurance: Decimal,
    pub fumigation: Decimal,
    pub clearance: Decimal,
    /// Persisted total-unit override; empty means derived from lines
    pub total_sqmt: Option<Decimal>,
    /// Persisted landing-cost override; empty means derived
    pub landing_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Payment recorded against a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: i64,
    pub po_id: i64,
    pub amount: Decimal,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Payment status of an order, derived from paid versus total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PartialPaid,
    FullPaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PartialPaid => "partial_paid",
            PaymentStatus::FullPaid => "full_paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "partial_paid" => Some(PaymentStatus::PartialPaid),
            "full_paid" => Some(PaymentStatus::FullPaid),
            _ => None,
        }
    }

    /// Derive status from amounts. Totals within one cent of paid count
    /// as fully paid.
    pub fn derive(paid: Decimal, total: Decimal) -> Self {
        if total <= Decimal::ZERO || paid <= Decimal::ZERO {
            return PaymentStatus::Unpaid;
        }
        if paid < total && (total - paid).abs() >= Decimal::new(1, 2) {
            return PaymentStatus::PartialPaid;
        }
        PaymentStatus::FullPaid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_payment_status_unpaid() {
        assert_eq!(
            PaymentStatus::derive(Decimal::ZERO, dec("100")),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentStatus::derive(dec("50"), Decimal::ZERO),
            PaymentStatus::Unpaid
        );
    }

    #[test]
    fn test_payment_status_partial() {
        assert_eq!(
            PaymentStatus::derive(dec("40"), dec("100")),
            PaymentStatus::PartialPaid
        );
    }

    #[test]
    fn test_payment_status_full_with_tolerance() {
        assert_eq!(
            PaymentStatus::derive(dec("100"), dec("100")),
            PaymentStatus::FullPaid
        );
        // within a cent
        assert_eq!(
            PaymentStatus::derive(dec("99.995"), dec("100")),
            PaymentStatus::FullPaid
        );
    }
}
