//! Per-batch stock ledger
//!
//! Each piece moves through `Available -> Out -> Sold`, with returns and
//! sale-undo as the only ways back. The batch-level counters are a derived
//! cache over the movement log: `available` is always recomputed as
//! `batch_quantity - out - sold` and never decremented independently, and
//! the full counter set can be rebuilt from the log with [`replay`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PieceStatus;

/// A status transition requested for one piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Dispatch an available piece to a client (reserved, not yet invoiced)
    MarkOut,
    /// Confirm the sale of a dispatched piece
    ClearToSold,
    /// Revert a confirmed sale back to dispatched
    UndoSale,
    /// Piece comes back before invoicing; re-enters availability
    ReturnBeforeInvoice,
    /// Piece comes back after the sale; re-enters availability
    ReturnAfterSale,
}

/// Counter adjustment caused by one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterDelta {
    pub out: i32,
    pub sold: i32,
    pub returned: i32,
}

impl LedgerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEvent::MarkOut => "mark_out",
            LedgerEvent::ClearToSold => "clear_to_sold",
            LedgerEvent::UndoSale => "undo_sale",
            LedgerEvent::ReturnBeforeInvoice => "return_before_invoice",
            LedgerEvent::ReturnAfterSale => "return_after_sale",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mark_out" => Some(LedgerEvent::MarkOut),
            "clear_to_sold" => Some(LedgerEvent::ClearToSold),
            "undo_sale" => Some(LedgerEvent::UndoSale),
            "return_before_invoice" => Some(LedgerEvent::ReturnBeforeInvoice),
            "return_after_sale" => Some(LedgerEvent::ReturnAfterSale),
            _ => None,
        }
    }

    /// The piece status this event requires. A mismatch rejects the whole
    /// transition; there is deliberately no event for `Available -> Sold`.
    pub fn expected_status(&self) -> PieceStatus {
        match self {
            LedgerEvent::MarkOut => PieceStatus::Available,
            LedgerEvent::ClearToSold => PieceStatus::Out,
            LedgerEvent::UndoSale => PieceStatus::Sold,
            LedgerEvent::ReturnBeforeInvoice => PieceStatus::Out,
            LedgerEvent::ReturnAfterSale => PieceStatus::Sold,
        }
    }

    /// The piece status after the event
    pub fn next_status(&self) -> PieceStatus {
        match self {
            LedgerEvent::MarkOut => PieceStatus::Out,
            LedgerEvent::ClearToSold => PieceStatus::Sold,
            LedgerEvent::UndoSale => PieceStatus::Out,
            LedgerEvent::ReturnBeforeInvoice => PieceStatus::Available,
            LedgerEvent::ReturnAfterSale => PieceStatus::Available,
        }
    }

    pub fn counter_delta(&self) -> CounterDelta {
        match self {
            LedgerEvent::MarkOut => CounterDelta { out: 1, sold: 0, returned: 0 },
            LedgerEvent::ClearToSold => CounterDelta { out: -1, sold: 1, returned: 0 },
            LedgerEvent::UndoSale => CounterDelta { out: 1, sold: -1, returned: 0 },
            LedgerEvent::ReturnBeforeInvoice => CounterDelta { out: -1, sold: 0, returned: 1 },
            LedgerEvent::ReturnAfterSale => CounterDelta { out: 0, sold: -1, returned: 1 },
        }
    }
}

impl std::fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("piece is {actual}, expected {expected}")]
    Precondition {
        expected: PieceStatus,
        actual: PieceStatus,
    },
}

/// Aggregate counters for one batch.
///
/// `returned` is informational and never subtracted from `batch_quantity`;
/// returned pieces re-enter availability through the `out`/`sold`
/// decrements of the return events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounters {
    pub batch_quantity: i32,
    pub out: i32,
    pub sold: i32,
    pub returned: i32,
}

impl BatchCounters {
    /// Fresh counters for a newly arrived batch
    pub fn new(batch_quantity: i32) -> Self {
        Self {
            batch_quantity,
            out: 0,
            sold: 0,
            returned: 0,
        }
    }

    /// Always derived, never stored independently
    pub fn available(&self) -> i32 {
        self.batch_quantity - self.out - self.sold
    }

    /// Core invariant: counters non-negative and out + sold + available
    /// never exceeds the batch quantity
    pub fn is_consistent(&self) -> bool {
        self.out >= 0
            && self.sold >= 0
            && self.returned >= 0
            && self.available() >= 0
            && self.out + self.sold + self.available() <= self.batch_quantity
    }

    fn apply_delta(&mut self, delta: CounterDelta) {
        self.out += delta.out;
        self.sold += delta.sold;
        self.returned += delta.returned;
    }
}

/// Apply one event to a piece with the given current status, updating the
/// batch counters. On a precondition mismatch nothing is mutated and the
/// error carries the expected versus actual status, so the caller can
/// decide whether to retry or ignore.
pub fn apply_event(
    status: PieceStatus,
    counters: &mut BatchCounters,
    event: LedgerEvent,
) -> Result<PieceStatus, LedgerError> {
    if status != event.expected_status() {
        return Err(LedgerError::Precondition {
            expected: event.expected_status(),
            actual: status,
        });
    }
    counters.apply_delta(event.counter_delta());
    Ok(event.next_status())
}

/// Rebuild batch counters from an ordered movement log. Counters are a
/// derived cache; when drift is suspected the log is the source of truth.
pub fn replay(batch_quantity: i32, events: impl IntoIterator<Item = LedgerEvent>) -> BatchCounters {
    let mut counters = BatchCounters::new(batch_quantity);
    for event in events {
        counters.apply_delta(event.counter_delta());
    }
    counters
}

/// One piece that failed its precondition during a bulk operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    pub item_id: String,
    pub expected: PieceStatus,
    pub actual: PieceStatus,
}

/// Result of a bulk operation: per-piece outcomes, never an all-or-nothing
/// abort. Failures report exactly which piece ids were rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub applied: Vec<String>,
    pub failures: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn record_success(&mut self, item_id: impl Into<String>) {
        self.applied.push(item_id.into());
    }

    pub fn record_failure(&mut self, item_id: impl Into<String>, err: &LedgerError) {
        let LedgerError::Precondition { expected, actual } = err;
        self.failures.push(BulkFailure {
            item_id: item_id.into(),
            expected: *expected,
            actual: *actual,
        });
    }
}

/// Apply the same event to many pieces independently. Each piece succeeds
/// or fails on its own precondition; counters advance only for successes.
pub fn apply_bulk<I>(
    event: LedgerEvent,
    pieces: I,
    counters: &mut BatchCounters,
) -> BulkOutcome
where
    I: IntoIterator<Item = (String, PieceStatus)>,
{
    let mut outcome = BulkOutcome::default();
    for (item_id, status) in pieces {
        match apply_event(status, counters, event) {
            Ok(_) => outcome.record_success(item_id),
            Err(err) => outcome.record_failure(item_id, &err),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use LedgerEvent::*;
        use PieceStatus::*;
        let table = [
            (MarkOut, Available, Out),
            (ClearToSold, Out, Sold),
            (UndoSale, Sold, Out),
            (ReturnBeforeInvoice, Out, Available),
            (ReturnAfterSale, Sold, Available),
        ];
        for (event, expected, next) in table {
            assert_eq!(event.expected_status(), expected);
            assert_eq!(event.next_status(), next);
        }
    }

    #[test]
    fn test_scan_walkthrough() {
        let mut counters = BatchCounters::new(5);

        let mut s1 = PieceStatus::Available;
        let mut s2 = PieceStatus::Available;
        let mut s3 = PieceStatus::Available;
        s1 = apply_event(s1, &mut counters, LedgerEvent::MarkOut).unwrap();
        s2 = apply_event(s2, &mut counters, LedgerEvent::MarkOut).unwrap();
        s3 = apply_event(s3, &mut counters, LedgerEvent::MarkOut).unwrap();
        assert_eq!((s1, s2, s3), (PieceStatus::Out, PieceStatus::Out, PieceStatus::Out));
        assert_eq!(counters.out, 3);
        assert_eq!(counters.available(), 2);
        assert!(counters.is_consistent());

        let s1 = apply_event(s1, &mut counters, LedgerEvent::ClearToSold).unwrap();
        assert_eq!(s1, PieceStatus::Sold);
        assert_eq!(counters.out, 2);
        assert_eq!(counters.sold, 1);
        assert_eq!(counters.available(), 2);

        let s1 = apply_event(s1, &mut counters, LedgerEvent::ReturnAfterSale).unwrap();
        assert_eq!(s1, PieceStatus::Available);
        assert_eq!(counters.sold, 0);
        assert_eq!(counters.returned, 1);
        // 5 - 2 out - 0 sold: the returned piece is available again
        assert_eq!(counters.available(), 3);
        assert!(counters.is_consistent());
    }

    #[test]
    fn test_precondition_rejected_without_mutation() {
        let mut counters = BatchCounters::new(5);
        let before = counters;

        let err = apply_event(
            PieceStatus::Sold,
            &mut counters,
            LedgerEvent::ReturnBeforeInvoice,
        )
        .unwrap_err();
        assert_eq!(
            err,
            LedgerError::Precondition {
                expected: PieceStatus::Out,
                actual: PieceStatus::Sold,
            }
        );
        assert_eq!(counters, before);
    }

    #[test]
    fn test_no_direct_available_to_sold() {
        let mut counters = BatchCounters::new(1);
        assert!(apply_event(
            PieceStatus::Available,
            &mut counters,
            LedgerEvent::ClearToSold
        )
        .is_err());
    }

    #[test]
    fn test_double_dispatch_rejected() {
        let mut counters = BatchCounters::new(2);
        let status =
            apply_event(PieceStatus::Available, &mut counters, LedgerEvent::MarkOut).unwrap();
        let err = apply_event(status, &mut counters, LedgerEvent::MarkOut).unwrap_err();
        assert!(matches!(err, LedgerError::Precondition { .. }));
        assert_eq!(counters.out, 1);
    }

    #[test]
    fn test_undo_sale() {
        let mut counters = BatchCounters::new(3);
        let s = apply_event(PieceStatus::Available, &mut counters, LedgerEvent::MarkOut).unwrap();
        let s = apply_event(s, &mut counters, LedgerEvent::ClearToSold).unwrap();
        let available_before = counters.available();
        let s = apply_event(s, &mut counters, LedgerEvent::UndoSale).unwrap();
        assert_eq!(s, PieceStatus::Out);
        assert_eq!(counters.sold, 0);
        assert_eq!(counters.out, 1);
        // undo moves between buckets; availability is unchanged
        assert_eq!(counters.available(), available_before);
    }

    #[test]
    fn test_replay_determinism() {
        use LedgerEvent::*;
        let log = vec![MarkOut, MarkOut, ClearToSold, MarkOut, ReturnAfterSale, MarkOut];

        let live = {
            let mut counters = BatchCounters::new(10);
            for e in &log {
                counters.apply_delta(e.counter_delta());
            }
            counters
        };
        let replayed = replay(10, log.iter().copied());
        let replayed_again = replay(10, log.into_iter());
        assert_eq!(live, replayed);
        assert_eq!(replayed, replayed_again);
    }

    #[test]
    fn test_bulk_partial_failure() {
        let mut counters = BatchCounters::new(5);
        // one piece is already out
        let status =
            apply_event(PieceStatus::Available, &mut counters, LedgerEvent::MarkOut).unwrap();
        assert_eq!(status, PieceStatus::Out);

        let pieces = vec![
            ("B/1".to_string(), PieceStatus::Out),
            ("B/2".to_string(), PieceStatus::Available),
            ("B/3".to_string(), PieceStatus::Available),
            ("B/4".to_string(), PieceStatus::Available),
            ("B/5".to_string(), PieceStatus::Available),
        ];
        let available_before = counters.available();
        let outcome = apply_bulk(LedgerEvent::MarkOut, pieces, &mut counters);

        assert_eq!(outcome.applied.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].item_id, "B/1");
        assert_eq!(outcome.failures[0].expected, PieceStatus::Available);
        assert_eq!(outcome.failures[0].actual, PieceStatus::Out);
        // available reduced by exactly the 4 successes
        assert_eq!(counters.available(), available_before - 4);
        assert!(counters.is_consistent());
    }
}
