//! Integration tests for the full write path.
//!
//! Tests: LedgerService → LedgerStore (event relation + item projection)
//!
//! Verifies:
//! - The running-sum invariant (quantity == Σ deltas) across mixed operations
//! - Concurrent same-item writers never lose updates or corrupt ordering
//! - Readers always observe consistent event/projection pairs

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rust_decimal_macros::dec;

    use stockledger_core::SupplierId;
    use stockledger_infra::{InMemoryLedgerStore, LedgerStore};
    use stockledger_inventory::{NewItem, StockChangeReason};

    use crate::service::LedgerService;

    fn setup() -> Arc<LedgerService<InMemoryLedgerStore>> {
        Arc::new(LedgerService::new(InMemoryLedgerStore::new()))
    }

    fn seeded_item(svc: &LedgerService<InMemoryLedgerStore>, quantity: i64) -> stockledger_inventory::Item {
        svc.create_item(NewItem {
            name: "Integration Widget".to_string(),
            quantity,
            unit_price: dec!(10.00),
            supplier_id: SupplierId::new(),
            minimum_quantity: None,
            created_by: "ops@example.com".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn quantity_always_equals_sum_of_deltas() {
        let svc = setup();
        let item = seeded_item(&svc, 100);

        svc.record_change(item.id, -30, StockChangeReason::Sold, None, "ops@example.com")
            .unwrap();
        svc.record_change(item.id, 50, StockChangeReason::Received, Some(dec!(12.00)), "ops@example.com")
            .unwrap();
        svc.record_change(item.id, 0, StockChangeReason::PriceChange, Some(dec!(15.00)), "ops@example.com")
            .unwrap();
        svc.record_change(item.id, -5, StockChangeReason::Damaged, None, "ops@example.com")
            .unwrap();

        let stream = svc.store().events_for_item(item.id).unwrap();
        let sum: i64 = stream.iter().map(|e| e.quantity_delta).sum();
        let row = svc.get_item(item.id).unwrap().unwrap();

        assert_eq!(row.quantity, sum);
        assert_eq!(row.quantity, 115);
        assert!(stream.iter().all(|e| e.resulting_quantity >= 0));
        // Price change moved the projection price without touching stock.
        assert_eq!(row.unit_price, dec!(15.00));
    }

    #[test]
    fn concurrent_writers_on_one_item_never_lose_updates() {
        let svc = setup();
        let item = seeded_item(&svc, 0);

        const WRITERS: usize = 8;
        const PER_WRITER: usize = 50;

        let handles: Vec<_> = (0..WRITERS)
            .map(|w| {
                let svc = svc.clone();
                let item_id = item.id;
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        // Inbound and outbound interleaved: even iterations
                        // +2, odd iterations -1.
                        let (delta, reason) = if i % 2 == 0 {
                            (2, StockChangeReason::Received)
                        } else {
                            (-1, StockChangeReason::Sold)
                        };
                        svc.record_change(item_id, delta, reason, None, &format!("writer-{w}"))
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // 25 × (+2) and 25 × (−1) per writer.
        let expected: i64 = (WRITERS * (PER_WRITER / 2) * 2) as i64 - (WRITERS * (PER_WRITER / 2)) as i64;
        let row = svc.get_item(item.id).unwrap().unwrap();
        assert_eq!(row.quantity, expected);

        // The stream is a strictly valid, gap-free running sum in
        // chronological order: every event's resulting quantity equals the
        // previous one plus its delta.
        let stream = svc.store().events_for_item(item.id).unwrap();
        assert_eq!(stream.len(), WRITERS * PER_WRITER);
        let mut running = 0i64;
        for event in &stream {
            running += event.quantity_delta;
            assert_eq!(event.resulting_quantity, running);
            assert!(event.resulting_quantity >= 0);
        }
        assert_eq!(running, expected);
    }

    #[test]
    fn concurrent_writers_on_different_items_proceed_independently() {
        let svc = setup();
        let a = seeded_item(&svc, 0);
        let b = svc
            .create_item(NewItem {
                name: "Other Widget".to_string(),
                quantity: 0,
                unit_price: dec!(4.00),
                supplier_id: SupplierId::new(),
                minimum_quantity: None,
                created_by: "ops@example.com".to_string(),
            })
            .unwrap();

        let handles: Vec<_> = [a.id, b.id]
            .into_iter()
            .map(|item_id| {
                let svc = svc.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        svc.record_change(item_id, 1, StockChangeReason::Received, None, "ops@example.com")
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(svc.get_item(a.id).unwrap().unwrap().quantity, 100);
        assert_eq!(svc.get_item(b.id).unwrap().unwrap().quantity, 100);
    }

    #[test]
    fn readers_see_consistent_snapshots_during_writes() {
        let svc = setup();
        let item = seeded_item(&svc, 0);

        let writer = {
            let svc = svc.clone();
            let item_id = item.id;
            thread::spawn(move || {
                for _ in 0..200 {
                    svc.record_change(item_id, 1, StockChangeReason::Received, None, "ops@example.com")
                        .unwrap();
                }
            })
        };

        // Concurrent reads: the projection must never disagree with the
        // event relation by more than the in-flight commit, i.e. the
        // projection quantity always equals the last event's resulting
        // quantity at the moment both are read under one snapshot.
        for _ in 0..50 {
            let stream = svc.store().events_for_item(item.id).unwrap();
            if let Some(last) = stream.last() {
                assert_eq!(
                    last.resulting_quantity,
                    stream.iter().map(|e| e.quantity_delta).sum::<i64>()
                );
            }
        }

        writer.join().unwrap();

        let row = svc.get_item(item.id).unwrap().unwrap();
        assert_eq!(row.quantity, 200);
    }
}
