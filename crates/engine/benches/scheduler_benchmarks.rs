use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flowforge_engine::{
    BackoffPolicy, CreateJobCmd, Engine, EngineConfig, EntityStore, ExecuteJobCmd, FindDueJobsCmd,
    HandlerRegistry, InMemoryEntityStore, Job, LockJobCmd, WriteOp,
};

fn setup_engine() -> Engine {
    Engine::new(EngineConfig::default().with_handler_fn("noop", |_job, _ctx| Ok(())))
}

fn bench_command_execution_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_execution_latency");
    group.sample_size(1000);

    // Benchmark: CreateJob command (insert + notification)
    group.bench_function("create_job_fresh", |b| {
        let engine = setup_engine();
        b.iter(|| {
            engine
                .execute(&CreateJobCmd::new(
                    "noop",
                    black_box(serde_json::json!({"n": 1})),
                ))
                .unwrap();
        });
    });

    // Benchmark: full job lifecycle (create, acquire, execute)
    group.bench_function("complete_job_cycle", |b| {
        let engine = setup_engine();
        let mut handlers = HandlerRegistry::new();
        handlers.register_fn("noop", |_job, _ctx| Ok(()));
        let handlers = Arc::new(handlers);

        b.iter(|| {
            let now = Utc::now();
            let job_id = engine
                .execute(&CreateJobCmd::new("noop", serde_json::json!({})))
                .unwrap();
            let acquired = engine
                .execute(&LockJobCmd::new(
                    job_id,
                    "bench-worker",
                    now,
                    now + chrono::Duration::minutes(5),
                ))
                .unwrap();
            assert!(acquired);
            engine
                .execute(&ExecuteJobCmd::new(
                    job_id,
                    "bench-worker",
                    now,
                    handlers.clone(),
                ))
                .unwrap();
        });
    });

    group.finish();
}

fn bench_due_query_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("due_query_throughput");

    for population in [10, 100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*population as u64));
        group.bench_with_input(
            BenchmarkId::new("due_scan", population),
            population,
            |b, &count| {
                let store = InMemoryEntityStore::arc();
                let later = Utc::now() + chrono::Duration::hours(1);

                // Half the population is due now, half is parked in the future.
                let ops: Vec<WriteOp> = (0..count)
                    .map(|i| {
                        let job = Job::new("noop", serde_json::json!({"n": i}));
                        let job = if i % 2 == 0 {
                            job
                        } else {
                            job.with_due_date(later)
                        };
                        WriteOp::Insert(job)
                    })
                    .collect();
                store.commit(ops).unwrap();

                let engine = Engine::with_store(store.clone(), EngineConfig::default());

                b.iter(|| {
                    let due = engine
                        .execute(&FindDueJobsCmd::new(black_box(Utc::now()), 10))
                        .unwrap();
                    black_box(due);
                });
            },
        );
    }

    group.finish();
}

fn bench_pipeline_vs_direct_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_vs_direct_store");
    group.sample_size(1000);

    // Benchmark: insert through the full command pipeline
    group.bench_function("pipeline_insert", |b| {
        let engine = setup_engine();
        b.iter(|| {
            engine
                .execute(&CreateJobCmd::new("noop", serde_json::json!({})))
                .unwrap();
        });
    });

    // Benchmark: raw store insert (no session, no checkers, no notifications)
    group.bench_function("direct_store_insert", |b| {
        let store = InMemoryEntityStore::new();
        b.iter(|| {
            let job = Job::new("noop", serde_json::json!({}));
            store.commit(vec![WriteOp::Insert(black_box(job))]).unwrap();
        });
    });

    group.finish();
}

fn bench_backoff_computation(c: &mut Criterion) {
    let mut group = c.benchmark_group("backoff_computation");
    group.sample_size(1000);

    let policies = [
        ("fixed", BackoffPolicy::fixed(Duration::from_millis(500))),
        (
            "linear",
            BackoffPolicy::linear(Duration::from_millis(500), Duration::from_secs(3600)),
        ),
        (
            "exponential",
            BackoffPolicy::exponential(Duration::from_millis(500), Duration::from_secs(3600)),
        ),
    ];

    for (name, policy) in policies {
        group.bench_function(name, |b| {
            b.iter(|| {
                for failures in 1..=16u32 {
                    black_box(policy.delay_for_failure(black_box(failures)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_command_execution_latency,
    bench_due_query_throughput,
    bench_pipeline_vs_direct_store,
    bench_backoff_computation
);
criterion_main!(benches);
