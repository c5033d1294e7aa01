//! Concurrent executions, session bounds, cancellation and deadlines

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{cmds, executor, executor_with, seeded_store, vars, STATION_NAMES};
use queryset::definition::{Command, Param, Query, Set};
use queryset::engine::{CancelToken, ExecOptions, ExecutionContext};
use queryset::store::{DocumentStore, InMemoryStore, StoreFuture};
use serde_json::json;

/// Delays every aggregate and records how many ran at once
struct SlowStore {
    inner: InMemoryStore,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowStore {
    fn new(delay: Duration) -> Self {
        Self {
            inner: seeded_store(),
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

impl DocumentStore for SlowStore {
    fn aggregate<'a>(&'a self, collection: &'a str, pipeline: &'a [Command]) -> StoreFuture<'a> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.aggregate(collection, pipeline).await
        })
    }
}

fn chained_set() -> Set {
    Set::new(
        "station_name",
        vec![
            Query::pipeline(
                "Lookup",
                "stations",
                cmds(json!([
                    {"$match": {"station_id": "#string:station_id"}},
                    {"$save": {"$map": "station"}}
                ])),
            ),
            Query::pipeline(
                "Name",
                "stations",
                cmds(json!([
                    {"$match": {"name": "#data.0:station.name"}},
                    {"$project": {"_id": 0, "station_id": 1, "name": 1}}
                ])),
            )
            .returning(),
        ],
    )
    .with_param(Param::required("station_id").with_regex("number"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_executions_do_not_share_state() {
    let (executor, _) = executor();
    let executor = Arc::new(executor);
    let set = Arc::new(chained_set());

    let mut handles = Vec::new();
    for round in 0..4 {
        for (id, name) in STATION_NAMES {
            let executor = executor.clone();
            let set = set.clone();
            handles.push(tokio::spawn(async move {
                let result = executor
                    .execute(
                        &set,
                        vars(&[("station_id", id)]),
                        &ExecutionContext::new(),
                        &ExecOptions::default(),
                    )
                    .await;
                (round, id, name, result)
            }));
        }
    }

    for handle in handles {
        let (_, id, name, result) = handle.await.unwrap();
        assert_eq!(
            result.results().unwrap()[0].docs,
            vec![json!({"station_id": id, "name": name})]
        );
    }

    assert_eq!(executor.metrics().snapshot().sets_executed, 32);
    assert_eq!(executor.pool().available(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn store_sessions_are_bounded() {
    let store = Arc::new(SlowStore::new(Duration::from_millis(20)));
    let (executor, _) = executor_with(store.clone(), 2);
    let executor = Arc::new(executor);
    let set = Arc::new(chained_set());

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let executor = executor.clone();
            let set = set.clone();
            tokio::spawn(async move {
                executor
                    .execute(
                        &set,
                        vars(&[("station_id", "42021")]),
                        &ExecutionContext::new(),
                        &ExecOptions::default(),
                    )
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(!handle.await.unwrap().is_error());
    }

    assert!(store.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(executor.pool().available(), 2);
}

#[tokio::test]
async fn cancellation_aborts_and_releases_sessions() {
    let store = Arc::new(SlowStore::new(Duration::from_secs(60)));
    let (executor, _) = executor_with(store, 2);

    let token = CancelToken::new();
    let ctx = ExecutionContext::new().with_cancel(token.clone());
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let mut set = chained_set();
    for query in &mut set.queries {
        query.continue_on_error = true;
    }

    let result = executor
        .execute(&set, vars(&[("station_id", "42021")]), &ctx, &ExecOptions::default())
        .await;
    canceller.await.unwrap();

    // Continue does not apply to cancellation
    assert_eq!(result.error_message(), Some("Execution cancelled"));
    assert_eq!(executor.pool().available(), 2);
    assert_eq!(executor.metrics().snapshot().queries_skipped, 0);
}

#[tokio::test]
async fn deadline_aborts_and_releases_sessions() {
    let store = Arc::new(SlowStore::new(Duration::from_secs(60)));
    let (executor, _) = executor_with(store, 3);

    let ctx = ExecutionContext::new().with_timeout(Duration::from_millis(30));
    let result = executor
        .execute(&chained_set(), vars(&[("station_id", "42021")]), &ctx, &ExecOptions::default())
        .await;

    assert_eq!(result.error_message(), Some("Execution deadline exceeded"));
    assert_eq!(executor.pool().available(), 3);
}

#[tokio::test]
async fn cancelled_before_start_runs_nothing() {
    let store = Arc::new(SlowStore::new(Duration::from_millis(1)));
    let (executor, _) = executor_with(store.clone(), 1);

    let token = CancelToken::new();
    token.cancel();
    let ctx = ExecutionContext::new().with_cancel(token);

    let result = executor
        .execute(&chained_set(), vars(&[("station_id", "42021")]), &ctx, &ExecOptions::default())
        .await;

    assert_eq!(result.error_message(), Some("Execution cancelled"));
    assert_eq!(store.peak.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn closed_pool_is_fatal_even_with_continue() {
    let (executor, _) = executor();
    executor.pool().close();

    let set = Set::new(
        "stations",
        vec![Query::pipeline("All", "stations", cmds(json!([{"$count": "n"}])))
            .returning()
            .continuing()],
    );

    let result = executor
        .execute(&set, HashMap::new(), &ExecutionContext::new(), &ExecOptions::default())
        .await;
    assert!(result.is_error());
    assert_eq!(executor.metrics().snapshot().queries_skipped, 0);
}
