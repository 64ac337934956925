//! This bench measures filtering and grouping a large collection of
//! complaints, and loading the same collection from a snapshot file.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use grievance::{
    ComplaintInput, ComplaintStore, Criteria, GroupBy, LifecycleEngine, Priority,
    ReportAggregator, Snapshot, Status,
};
use tempfile::TempDir;

const COMPLAINTS: usize = 10_000;
const CATEGORIES: [&str; 6] = [
    "Roads",
    "Sanitation",
    "Electrical",
    "Water Supply",
    "Drainage",
    "Parks",
];

/// Fills a store with complaints spread across wards, categories and statuses
fn preseed_store() -> ComplaintStore {
    let store = ComplaintStore::with_capacity(COMPLAINTS);
    let engine = LifecycleEngine::new(&store);

    for i in 0..COMPLAINTS {
        let input = ComplaintInput::new(
            format!("Citizen {i}"),
            format!("Problem number {i}"),
            CATEGORIES[i % CATEGORIES.len()],
            "Main Road",
        )
        .with_ward(format!("Ward {}", i % 20))
        .with_priority(if i % 7 == 0 {
            Priority::Urgent
        } else {
            Priority::Medium
        });
        let id = store.create(input).unwrap().id();

        match i % 4 {
            0 => {}
            1 => {
                engine.transition(id, Status::InProgress, None).unwrap();
            }
            2 => {
                engine.transition(id, Status::InProgress, None).unwrap();
                engine.transition(id, Status::Resolved, None).unwrap();
            }
            _ => {
                engine.transition(id, Status::Rejected, None).unwrap();
            }
        }
    }

    store
}

fn aggregate(c: &mut Criterion) {
    let store = preseed_store();
    let complaints = store.list();

    c.bench_function("group by ward", |b| {
        b.iter(|| ReportAggregator::aggregate(&complaints, GroupBy::Ward));
    });

    let criteria = Criteria {
        status: Some(Status::Pending),
        search: Some("number 1".to_string()),
        ..Criteria::default()
    };
    c.bench_function("filtered report", |b| {
        b.iter(|| ReportAggregator::report(&store, &criteria, GroupBy::Category));
    });
}

fn load_snapshot(c: &mut Criterion) {
    let store = preseed_store();

    c.bench_function("load snapshot", |b| {
        b.iter_batched(
            || {
                // Setup: write the snapshot to a fresh directory
                let tmp_dir = TempDir::new().unwrap();
                Snapshot::from_store(&store)
                    .save(&tmp_dir.path().join("complaints.json"))
                    .unwrap();
                tmp_dir
            },
            |tmp_dir| {
                Snapshot::load(&tmp_dir.path().join("complaints.json"))
                    .unwrap()
                    .into_store(false)
                    .unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, aggregate, load_snapshot);
criterion_main!(benches);
