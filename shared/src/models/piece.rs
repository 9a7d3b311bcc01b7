//! Piece (stock unit) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// Status of one physical piece within a batch.
///
/// Legal transitions are owned by [`crate::ledger`]; `Returned` never
/// results from a transition (returned pieces re-enter `Available`) but is
/// accepted when reading rows written by earlier versions of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceStatus {
    Available,
    Out,
    Sold,
    Returned,
}

impl PieceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceStatus::Available => "available",
            PieceStatus::Out => "out",
            PieceStatus::Sold => "sold",
            PieceStatus::Returned => "returned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(PieceStatus::Available),
            "out" => Some(PieceStatus::Out),
            "sold" => Some(PieceStatus::Sold),
            "returned" => Some(PieceStatus::Returned),
            _ => None,
        }
    }
}

impl std::fmt::Display for PieceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One individually trackable physical unit within a batch.
///
/// `item_id` is derived as `{batch_code}/{piece_index}`, globally unique
/// and stable for the piece's lifetime. Pieces are created once per unit
/// at batch-arrival time and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piece {
    pub stock_id: i64,
    pub batch_id: i64,
    pub po_item_id: i64,
    pub item_id: String,
    /// 6-character scanner payload printed on the physical label
    pub barcode_short: String,
    pub product_name: String,
    pub category: Category,
    pub size: Option<String>,
    pub status: PieceStatus,
    pub client_id: Option<i64>,
    pub delivery_order_no: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
