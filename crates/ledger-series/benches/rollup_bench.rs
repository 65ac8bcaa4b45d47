use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ledger_core::ItemId;
use ledger_series::{aggregate, CategoryName, DateWindow, TimedValue};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn build_records(n: usize, categories: u32) -> Vec<TimedValue> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    (0..n)
        .map(|_| TimedValue {
            timestamp: start
                .checked_add_days(Days::new(rng.gen_range(0..365)))
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            category: ItemId(rng.gen_range(0..categories)),
            value: rng.gen_range(0.0..1_000_000.0),
        })
        .collect()
}

fn names(id: ItemId) -> Option<CategoryName> {
    Some(CategoryName {
        group: Some(format!("Group {}", id.0 / 4)),
        leaf: format!("Ore {}", id.0),
    })
}

fn bench_rollup(c: &mut Criterion) {
    let records = build_records(20_000, 48);
    c.bench_function("series rollup 20k records x 48 ores", |b| {
        b.iter(|| black_box(aggregate(&records, names, &DateWindow::all())))
    });
}

criterion_group!(benches, bench_rollup);
criterion_main!(benches);
