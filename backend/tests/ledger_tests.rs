//! Batch ledger tests
//!
//! The counters are a cache over the movement log: replaying the log must
//! always reproduce them, and no sequence of events may drive any counter
//! negative or push out + sold past the batch quantity.

use proptest::prelude::*;

use shared::ledger::{apply_bulk, apply_event, replay, BatchCounters, LedgerEvent, LedgerError};
use shared::models::PieceStatus;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_full_lifecycle_walkthrough() {
        // Batch of 5: dispatch three, sell one, return it after the sale
        let mut counters = BatchCounters::new(5);
        let mut statuses = vec![PieceStatus::Available; 5];

        for s in statuses.iter_mut().take(3) {
            *s = apply_event(*s, &mut counters, LedgerEvent::MarkOut).unwrap();
        }
        assert_eq!(counters.out, 3);
        assert_eq!(counters.available(), 2);

        statuses[0] = apply_event(statuses[0], &mut counters, LedgerEvent::ClearToSold).unwrap();
        assert_eq!(counters.out, 2);
        assert_eq!(counters.sold, 1);
        assert_eq!(counters.available(), 2);

        statuses[0] =
            apply_event(statuses[0], &mut counters, LedgerEvent::ReturnAfterSale).unwrap();
        assert_eq!(statuses[0], PieceStatus::Available);
        assert_eq!(counters.sold, 0);
        assert_eq!(counters.returned, 1);
        assert_eq!(counters.available(), 3);
        assert!(counters.is_consistent());
    }

    #[test]
    fn test_precondition_failure_is_a_no_op() {
        let mut counters = BatchCounters::new(4);
        let before = counters;

        let err = apply_event(PieceStatus::Available, &mut counters, LedgerEvent::UndoSale)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::Precondition {
                expected: PieceStatus::Sold,
                actual: PieceStatus::Available,
            }
        );
        assert_eq!(counters, before);
    }

    #[test]
    fn test_no_event_sells_an_available_piece() {
        for event in [
            LedgerEvent::ClearToSold,
            LedgerEvent::UndoSale,
            LedgerEvent::ReturnBeforeInvoice,
            LedgerEvent::ReturnAfterSale,
        ] {
            let mut counters = BatchCounters::new(1);
            assert!(apply_event(PieceStatus::Available, &mut counters, event).is_err());
        }
    }

    #[test]
    fn test_undo_sale_preserves_availability() {
        let mut counters = BatchCounters::new(3);
        let s = apply_event(PieceStatus::Available, &mut counters, LedgerEvent::MarkOut).unwrap();
        let s = apply_event(s, &mut counters, LedgerEvent::ClearToSold).unwrap();
        let available = counters.available();

        let s = apply_event(s, &mut counters, LedgerEvent::UndoSale).unwrap();
        assert_eq!(s, PieceStatus::Out);
        assert_eq!(counters.available(), available);
    }

    #[test]
    fn test_bulk_mark_out_partial_failure() {
        // Five pieces, one already out: exactly four succeed
        let mut counters = BatchCounters::new(5);
        let out =
            apply_event(PieceStatus::Available, &mut counters, LedgerEvent::MarkOut).unwrap();

        let pieces: Vec<(String, PieceStatus)> = (1..=5)
            .map(|i| {
                let status = if i == 2 { out } else { PieceStatus::Available };
                (format!("GR-X-I1/{}", i), status)
            })
            .collect();

        let outcome = apply_bulk(LedgerEvent::MarkOut, pieces, &mut counters);
        assert_eq!(outcome.applied.len(), 4);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].item_id, "GR-X-I1/2");
        assert_eq!(outcome.failures[0].actual, PieceStatus::Out);
        assert_eq!(counters.out, 5);
        assert_eq!(counters.available(), 0);
        assert!(counters.is_consistent());
    }

    #[test]
    fn test_replay_matches_live_counters() {
        use LedgerEvent::*;
        let log = [MarkOut, MarkOut, ClearToSold, ReturnAfterSale, MarkOut, ClearToSold];

        let mut live = BatchCounters::new(8);
        let mut statuses = vec![PieceStatus::Available; 8];
        // Drive pieces so every event in the log is legal
        statuses[0] = apply_event(statuses[0], &mut live, log[0]).unwrap();
        statuses[1] = apply_event(statuses[1], &mut live, log[1]).unwrap();
        statuses[0] = apply_event(statuses[0], &mut live, log[2]).unwrap();
        statuses[0] = apply_event(statuses[0], &mut live, log[3]).unwrap();
        statuses[2] = apply_event(statuses[2], &mut live, log[4]).unwrap();
        statuses[1] = apply_event(statuses[1], &mut live, log[5]).unwrap();

        assert_eq!(replay(8, log), live);
    }

    #[test]
    fn test_event_names_round_trip() {
        for event in [
            LedgerEvent::MarkOut,
            LedgerEvent::ClearToSold,
            LedgerEvent::UndoSale,
            LedgerEvent::ReturnBeforeInvoice,
            LedgerEvent::ReturnAfterSale,
        ] {
            assert_eq!(LedgerEvent::parse(event.as_str()), Some(event));
        }
        assert_eq!(LedgerEvent::parse("sold"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn event_strategy() -> impl Strategy<Value = LedgerEvent> {
        prop_oneof![
            Just(LedgerEvent::MarkOut),
            Just(LedgerEvent::ClearToSold),
            Just(LedgerEvent::UndoSale),
            Just(LedgerEvent::ReturnBeforeInvoice),
            Just(LedgerEvent::ReturnAfterSale),
        ]
    }

    /// Drive a batch of `quantity` pieces through the attempted operations,
    /// skipping the illegal ones, and return the counters plus the log of
    /// events that actually applied.
    fn simulate(
        quantity: i32,
        attempts: &[(usize, LedgerEvent)],
    ) -> (BatchCounters, Vec<LedgerEvent>) {
        let mut counters = BatchCounters::new(quantity);
        let mut statuses = vec![PieceStatus::Available; quantity as usize];
        let mut log = Vec::new();

        for (piece, event) in attempts {
            let idx = piece % statuses.len();
            if let Ok(next) = apply_event(statuses[idx], &mut counters, *event) {
                statuses[idx] = next;
                log.push(*event);
            }
        }
        (counters, log)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Counters never drift from the replayed log
        #[test]
        fn prop_counters_match_replayed_log(
            quantity in 1i32..30,
            attempts in prop::collection::vec((0usize..30, event_strategy()), 0..80)
        ) {
            let (counters, log) = simulate(quantity, &attempts);
            prop_assert_eq!(replay(quantity, log), counters);
        }

        /// No legal sequence violates the core invariant
        #[test]
        fn prop_invariant_holds_under_any_sequence(
            quantity in 1i32..30,
            attempts in prop::collection::vec((0usize..30, event_strategy()), 0..80)
        ) {
            let (counters, _) = simulate(quantity, &attempts);
            prop_assert!(counters.is_consistent());
            prop_assert!(counters.available() >= 0);
            prop_assert!(counters.out + counters.sold + counters.available() <= quantity);
        }

        /// A rejected event changes nothing
        #[test]
        fn prop_rejection_is_a_no_op(
            quantity in 1i32..10,
            event in event_strategy()
        ) {
            // Sold is never a legal starting state for MarkOut, and
            // Available rejects everything but MarkOut
            let status = match event {
                LedgerEvent::MarkOut => PieceStatus::Sold,
                _ => PieceStatus::Available,
            };
            let mut counters = BatchCounters::new(quantity);
            let before = counters;
            prop_assert!(apply_event(status, &mut counters, event).is_err());
            prop_assert_eq!(counters, before);
        }
    }
}
