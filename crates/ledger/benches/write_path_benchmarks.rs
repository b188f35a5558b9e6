use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rust_decimal_macros::dec;

use stockledger_core::SupplierId;
use stockledger_infra::{InMemoryLedgerStore, LedgerStore};
use stockledger_inventory::{NewItem, StockChangeReason};
use stockledger_ledger::LedgerService;

fn seeded_service(opening: i64) -> (LedgerService<InMemoryLedgerStore>, stockledger_core::ItemId) {
    let svc = LedgerService::new(InMemoryLedgerStore::new());
    let item = svc
        .create_item(NewItem {
            name: "Bench Widget".to_string(),
            quantity: opening,
            unit_price: dec!(10.00),
            supplier_id: SupplierId::new(),
            minimum_quantity: None,
            created_by: "bench@example.com".to_string(),
        })
        .expect("seed item");
    (svc, item.id)
}

/// Throughput of the single write path (validate + atomic commit).
fn bench_record_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_change");
    group.throughput(Throughput::Elements(1));

    group.bench_function("inbound", |b| {
        let (svc, item_id) = seeded_service(0);
        b.iter(|| {
            svc.record_change(
                black_box(item_id),
                black_box(1),
                StockChangeReason::Received,
                None,
                "bench@example.com",
            )
            .expect("commit")
        });
    });

    group.bench_function("rejected_negative_stock", |b| {
        let (svc, item_id) = seeded_service(0);
        b.iter(|| {
            // Rejections must be cheap: validated before any write.
            let _ = black_box(svc.record_change(
                black_box(item_id),
                black_box(-1),
                StockChangeReason::Sold,
                None,
                "bench@example.com",
            ));
        });
    });

    group.finish();
}

/// Cost of reading back an item's stream as history grows.
fn bench_stream_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("events_for_item");

    for history_len in [100usize, 1_000, 10_000] {
        let (svc, item_id) = seeded_service(0);
        for _ in 0..history_len {
            svc.record_change(item_id, 1, StockChangeReason::Received, None, "bench@example.com")
                .expect("commit");
        }

        group.throughput(Throughput::Elements(history_len as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(history_len),
            &history_len,
            |b, _| {
                b.iter(|| {
                    let stream = svc.store().events_for_item(black_box(item_id)).expect("read");
                    black_box(stream.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_record_change, bench_stream_read);
criterion_main!(benches);
