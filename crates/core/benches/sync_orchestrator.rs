use std::sync::Arc;

use almanac_core::{
    FetchedItems, FuzzyMatcher, LogSink, RunMetadata, SourceAdapter, StatusBroadcaster,
    SyncOrchestrator, SyncRunRepository,
};
use almanac_domain::{ItemOutcome, LogRecord, Result as DomainResult, SyncRun, SyncRunSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uuid::Uuid;

/// Run store that accepts every write and remembers nothing.
struct NullRuns;

#[async_trait]
impl SyncRunRepository for NullRuns {
    async fn create(&self, _run: &SyncRun) -> DomainResult<()> {
        Ok(())
    }

    async fn get(&self, _id: Uuid) -> DomainResult<Option<SyncRun>> {
        Ok(None)
    }

    async fn mark_running(&self, _id: Uuid, _started_at: DateTime<Utc>) -> DomainResult<()> {
        Ok(())
    }

    async fn set_total(&self, _id: Uuid, _total: u64) -> DomainResult<()> {
        Ok(())
    }

    async fn record_outcome(&self, _id: Uuid, _outcome: ItemOutcome) -> DomainResult<()> {
        Ok(())
    }

    async fn update_metadata(&self, _id: Uuid, _metadata: &RunMetadata) -> DomainResult<()> {
        Ok(())
    }

    async fn mark_completed(&self, _id: Uuid, _completed_at: DateTime<Utc>) -> DomainResult<()> {
        Ok(())
    }

    async fn mark_failed(
        &self,
        _id: Uuid,
        _error: &str,
        _completed_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        Ok(())
    }

    async fn list_recent(
        &self,
        _source_type: Option<&str>,
        _limit: usize,
    ) -> DomainResult<Vec<SyncRun>> {
        Ok(Vec::new())
    }

    async fn latest_completed(&self, _source_type: &str) -> DomainResult<Option<SyncRun>> {
        Ok(None)
    }
}

struct NullSink;

#[async_trait]
impl LogSink for NullSink {
    async fn append(&self, record: LogRecord) -> DomainResult<()> {
        black_box(record);
        Ok(())
    }
}

impl StatusBroadcaster for NullSink {
    fn publish(&self, snapshot: SyncRunSnapshot) -> DomainResult<()> {
        black_box(snapshot);
        Ok(())
    }
}

/// Adapter over a fixed list of numbers; every third one is new.
struct CountingAdapter {
    items: Vec<u64>,
}

#[async_trait]
impl SourceAdapter for CountingAdapter {
    type Item = u64;

    fn source_type(&self) -> &str {
        "bench"
    }

    async fn fetch_items(&self) -> DomainResult<FetchedItems<u64>> {
        Ok(FetchedItems::Sized(self.items.clone()))
    }

    async fn process_item(&self, item: &u64) -> DomainResult<ItemOutcome> {
        Ok(if item % 3 == 0 { ItemOutcome::Created } else { ItemOutcome::Skipped })
    }
}

fn orchestrator_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_orchestrator");
    group.sample_size(20).measurement_time(std::time::Duration::from_secs(10));

    for interactive in [false, true] {
        let name = if interactive { "perform_1000_broadcasting" } else { "perform_1000" };
        group.bench_function(name, |b| {
            let runtime = tokio::runtime::Runtime::new().expect("runtime");
            let items: Vec<u64> = (0..1_000).collect();

            b.iter(|| {
                let adapter = CountingAdapter { items: items.clone() };
                runtime.block_on(async move {
                    let mut orchestrator =
                        SyncOrchestrator::new(adapter, Arc::new(NullRuns), Arc::new(NullSink))
                            .with_broadcaster(Arc::new(NullSink), interactive);
                    orchestrator.perform().await.unwrap();
                });
            });
        });
    }

    group.finish();
}

fn matcher_benchmark(c: &mut Criterion) {
    let matcher = FuzzyMatcher::default();
    let titles: Vec<String> =
        (0..500).map(|n| format!("The Collected Stories of Volume {n}, The")).collect();

    let mut group = c.benchmark_group("fuzzy_matcher");
    group.bench_function("find_best_500_titles", |b| {
        b.iter(|| {
            black_box(matcher.find_best(
                black_box("collected stories volume 499"),
                &titles,
                String::as_str,
            ));
        });
    });
    group.finish();
}

criterion_group!(core_benchmarks, orchestrator_benchmark, matcher_benchmark);
criterion_main!(core_benchmarks);
