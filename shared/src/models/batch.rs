//! Stock batch models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Category;
use crate::ledger::BatchCounters;

/// The physical arrival unit for one purchase-order line item.
///
/// A batch is created exactly once when goods arrive and is never deleted;
/// only its counters change afterwards as scan events occur. `available`
/// is stored for query convenience but is always recomputed as
/// `batch_quantity - out - sold` after every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: i64,
    pub po_item_id: i64,
    /// Canonical derived code, e.g. "MN-VE/01020256-I1"
    pub batch_code: String,
    pub category: Category,
    pub batch_quantity: i32,
    pub out_count: i32,
    pub sold_count: i32,
    pub returned_count: i32,
    pub available: i32,
    pub arrival_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    pub fn counters(&self) -> BatchCounters {
        BatchCounters {
            batch_quantity: self.batch_quantity,
            out: self.out_count,
            sold: self.sold_count,
            returned: self.returned_count,
        }
    }
}

/// Rolled-up view of one batch for stock-count listings
#[derive(Debug, Clone, Serialize)]
pub struct BatchStockCount {
    pub batch_id: i64,
    pub batch_code: String,
    pub product_name: String,
    pub category: Category,
    pub size: String,
    pub colour: String,
    /// e.g. "MN-VE/01020256-I1/1 - MN-VE/01020256-I1/25"
    pub id_range: String,
    pub quantity: i32,
    pub out: i32,
    pub sold: i32,
    pub returned: i32,
    pub available: i32,
    pub arrival_date: NaiveDate,
}
