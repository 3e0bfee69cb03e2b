use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use outbox::{
    client::{ApiTransport, OutboundRequest, SendOutcome, TransportError},
    record::MutationRecord,
    replay::replay_pass,
    store::{QueueStore, sqlite::SqliteQueueStore},
    types::Method,
};

struct AlwaysOk;

impl ApiTransport for AlwaysOk {
    fn send(&mut self, _request: &OutboundRequest) -> Result<SendOutcome, TransportError> {
        Ok(SendOutcome { status: 200 })
    }
}

fn build_queue(n: usize) -> Vec<MutationRecord> {
    (0..n)
        .map(|i| {
            MutationRecord::new(
                Method::Put,
                format!("/workouts/{i}"),
                Some(serde_json::json!({"reps": i, "exercise": "squat"})),
            )
        })
        .collect()
}

fn bench_replay_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay_pass");
    for n in [100usize, 1_000usize, 10_000usize] {
        let queue = build_queue(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let _ = replay_pass(queue.clone(), &mut AlwaysOk, "tok", 8);
            });
        });
    }
    group.finish();
}

fn bench_snapshot_save_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_save_load");
    for n in [100usize, 1_000usize, 10_000usize] {
        let queue = build_queue(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let mut store = SqliteQueueStore::open_in_memory().expect("open");
            b.iter(|| {
                store.save(&queue).expect("save");
                let _ = store.load().expect("load");
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_replay_pass, bench_snapshot_save_load);
criterion_main!(benches);
