use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;
use loan_desk::flows::{ListModel, RefreshPolicy};
use loan_desk::models::{Document, Fields};

/// A realistic loan snapshot of `n` documents.
fn snapshot(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            Document::new(
                format!("loan{:05}", i),
                Fields::new()
                    .with("equipmentId", format!("eq{}", i % 40))
                    .with("equipmentName", "Projector")
                    .with("requesterId", "u1")
                    .with("requestDate", chrono::Utc::now())
                    .with("returnDate", "31/12/2025")
                    .with("status", "pending")
                    .with("requesterName", "Ana")
                    .with("requesterProgram", "Physics")
                    .with("requesterPhoto", "aGk="),
            )
        })
        .collect()
}

fn benchmark_list_reconciliation(c: &mut Criterion) {
    let docs = snapshot(2_000);

    let mut group = c.benchmark_group("list_reconciliation");

    group.bench_function("first_snapshot", |b| {
        b.iter_batched(
            || docs.clone(),
            |docs| {
                let mut model = ListModel::new(RefreshPolicy::SkipUnchanged);
                model.apply(Ok(black_box(docs)))
            },
            BatchSize::SmallInput,
        )
    });

    // Unchanged redelivery: the structural comparison is the hot path
    let mut skip = ListModel::new(RefreshPolicy::SkipUnchanged);
    skip.apply(Ok(docs.clone()));
    group.bench_function("unchanged_skip", |b| {
        b.iter_batched(
            || docs.clone(),
            |docs| skip.apply(Ok(black_box(docs))),
            BatchSize::SmallInput,
        )
    });

    let mut replace = ListModel::new(RefreshPolicy::AlwaysReplace);
    replace.apply(Ok(docs.clone()));
    group.bench_function("unchanged_replace", |b| {
        b.iter_batched(
            || docs.clone(),
            |docs| replace.apply(Ok(black_box(docs))),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, benchmark_list_reconciliation);
criterion_main!(benches);
