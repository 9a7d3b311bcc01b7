//! Stock movement audit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerEvent;

/// How a dispatch was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    SingleScan,
    BulkScan,
    ReservedClear,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::SingleScan => "single_scan",
            DeliveryMode::BulkScan => "bulk_scan",
            DeliveryMode::ReservedClear => "reserved_clear",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single_scan" => Some(DeliveryMode::SingleScan),
            "bulk_scan" => Some(DeliveryMode::BulkScan),
            "reserved_clear" => Some(DeliveryMode::ReservedClear),
            _ => None,
        }
    }
}

/// One immutable audit-trail entry for a piece's status transition.
///
/// Movements are append-only and never mutated; batch counters are a
/// derived cache that can be rebuilt from this log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub movement_id: i64,
    pub stock_id: i64,
    pub event: LedgerEvent,
    pub client_id: Option<i64>,
    pub delivery_order_no: Option<String>,
    pub scan_date: DateTime<Utc>,
    pub delivery_mode: Option<DeliveryMode>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
