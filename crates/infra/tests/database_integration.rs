//! Repository coverage against a real SQLite file.

mod support;

use std::sync::Arc;

use almanac_core::sources::{BookStore, ListenStore, WorkoutStore};
use almanac_core::{LogSink, SyncRunRepository};
use almanac_domain::{
    AlmanacError, Book, ItemOutcome, Listen, LogLevel, LogRecord, SyncRun, SyncStatus, Workout,
};
use almanac_infra::database::{
    SqliteBookRepository, SqliteListenRepository, SqliteWorkoutRepository,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use support::TestDatabase;

#[tokio::test(flavor = "multi_thread")]
async fn sync_run_lifecycle_round_trips() {
    let db = TestDatabase::new();
    let runs = db.runs();

    let mut run = SyncRun::new("feeds", true).with_owner("owner-1");
    run.metadata.insert("note".into(), json!("first"));
    runs.create(&run).await.unwrap();

    let loaded = runs.get(run.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, SyncStatus::Pending);
    assert_eq!(loaded.owner_id.as_deref(), Some("owner-1"));
    assert!(loaded.interactive);
    assert_eq!(loaded.metadata["note"], "first");

    let started = Utc::now();
    runs.mark_running(run.id, started).await.unwrap();
    runs.set_total(run.id, 3).await.unwrap();
    for outcome in [ItemOutcome::Created, ItemOutcome::Skipped, ItemOutcome::Failed] {
        runs.record_outcome(run.id, outcome).await.unwrap();
    }
    runs.mark_completed(run.id, started + Duration::seconds(2)).await.unwrap();

    let done = runs.get(run.id).await.unwrap().unwrap();
    assert_eq!(done.status, SyncStatus::Completed);
    assert_eq!(done.total_items, Some(3));
    assert_eq!(done.processed_items, 3);
    assert_eq!((done.created_count, done.skipped_count, done.failed_count), (1, 1, 1));
    assert!(done.counters_consistent());
    assert_eq!(done.duration(), Some(Duration::seconds(2)));
}

#[tokio::test(flavor = "multi_thread")]
async fn status_changes_only_move_forward() {
    let db = TestDatabase::new();
    let runs = db.runs();
    let run = SyncRun::new("books", false);
    runs.create(&run).await.unwrap();

    let early = runs.mark_completed(run.id, Utc::now()).await.unwrap_err();
    assert!(matches!(early, AlmanacError::InvalidState(_)));

    let counted = runs.record_outcome(run.id, ItemOutcome::Created).await;
    assert!(counted.is_err(), "pending runs do not accept outcomes");

    runs.mark_running(run.id, Utc::now()).await.unwrap();
    runs.mark_failed(run.id, "boom", Utc::now()).await.unwrap();

    let again = runs.mark_running(run.id, Utc::now()).await.unwrap_err();
    assert!(matches!(again, AlmanacError::InvalidState(msg) if msg.contains("failed")));

    let stored = runs.get(run.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SyncStatus::Failed);
    assert_eq!(stored.error_message.as_deref(), Some("boom"));

    let missing = runs.mark_running(uuid::Uuid::now_v7(), Utc::now()).await.unwrap_err();
    assert!(matches!(missing, AlmanacError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_counter_updates_are_not_lost() {
    let db = TestDatabase::new();
    let runs = db.runs();
    let run = SyncRun::new("scrobbles", false);
    runs.create(&run).await.unwrap();
    runs.mark_running(run.id, Utc::now()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..40 {
        let runs = Arc::clone(&runs);
        let outcome = if i % 2 == 0 { ItemOutcome::Created } else { ItemOutcome::Updated };
        handles.push(tokio::spawn(async move { runs.record_outcome(run.id, outcome).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = runs.get(run.id).await.unwrap().unwrap();
    assert_eq!(stored.processed_items, 40);
    assert_eq!(stored.created_count, 20);
    assert_eq!(stored.updated_count, 20);
}

#[tokio::test(flavor = "multi_thread")]
async fn recent_and_latest_completed_runs() {
    let db = TestDatabase::new();
    let runs = db.runs();

    let mut ids = Vec::new();
    for (offset, source) in [(0, "feeds"), (1, "books"), (2, "feeds")] {
        let mut run = SyncRun::new(source, false);
        run.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            + Duration::minutes(offset);
        runs.create(&run).await.unwrap();
        runs.mark_running(run.id, run.created_at).await.unwrap();
        runs.mark_completed(run.id, run.created_at + Duration::seconds(30)).await.unwrap();
        ids.push(run.id);
    }

    let feeds = runs.list_recent(Some("feeds"), 10).await.unwrap();
    assert_eq!(feeds.iter().map(|r| r.id).collect::<Vec<_>>(), vec![ids[2], ids[0]]);
    assert_eq!(runs.list_recent(None, 2).await.unwrap().len(), 2);

    let latest = runs.latest_completed("feeds").await.unwrap().unwrap();
    assert_eq!(latest.id, ids[2]);
    assert!(runs.latest_completed("fitness").await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn log_records_are_grouped_by_run() {
    let db = TestDatabase::new();
    let logs = db.logs();
    let run = SyncRun::new("feeds", false);
    let other = SyncRun::new("feeds", false);

    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let records = [
        LogRecord::new("sync", LogLevel::Info, "Starting feeds sync").for_run(run.id),
        LogRecord::new("sync", LogLevel::Error, "Failed to process Entry #2: bad date")
            .for_run(run.id)
            .with_payload(json!({ "ordinal": 2 })),
        LogRecord::new("sync", LogLevel::Debug, "noise").for_run(other.id),
        LogRecord::new("system", LogLevel::Warning, "disk almost full"),
    ];
    for (offset, mut record) in (0..).zip(records) {
        record.created_at = base + Duration::seconds(offset);
        logs.append(record).await.unwrap();
    }

    let for_run = logs.list_for_run(run.id).await.unwrap();
    assert_eq!(for_run.len(), 2);
    assert_eq!(for_run[0].message, "Starting feeds sync");
    assert_eq!(for_run[1].payload["ordinal"], 2);
    assert_eq!(for_run[1].run_id(), Some(run.id));

    let important = logs.list_recent(LogLevel::Warning, 10).await.unwrap();
    assert_eq!(important.len(), 2);
    assert!(important.iter().all(|record| record.level >= LogLevel::Warning));
}

#[tokio::test(flavor = "multi_thread")]
async fn workouts_are_deleted_in_one_batch() {
    let db = TestDatabase::new();
    let store = SqliteWorkoutRepository::new(Arc::clone(&db.manager));
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();

    for (i, id) in ["w1", "w2", "w3"].iter().enumerate() {
        let workout = Workout {
            external_id: (*id).to_string(),
            activity_type: "run".into(),
            name: None,
            started_at: start + Duration::days(i64::try_from(i).unwrap()),
            duration_seconds: 1_800,
            distance_meters: Some(5_000.0),
            calories: None,
        };
        store.upsert(&workout).await.unwrap();
    }

    let since = store.ids_started_since(start + Duration::days(1)).await.unwrap();
    assert_eq!(since.len(), 2);

    let removed = store.delete(&["w1".to_string(), "missing".to_string()]).await.unwrap();
    assert_eq!(removed, 1);
    assert!(store.get("w1").await.unwrap().is_none());
    assert_eq!(db.count("workouts"), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn listens_use_natural_key() {
    let db = TestDatabase::new();
    let store = SqliteListenRepository::new(Arc::clone(&db.manager));
    let listen = Listen {
        played_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        artist: "Radiohead".into(),
        track: "Idioteque".into(),
        album: Some("Kid A".into()),
    };

    assert!(!store.exists(&listen).await.unwrap());
    store.insert(&listen).await.unwrap();
    assert!(store.exists(&listen).await.unwrap());
    assert_eq!(db.count("listens"), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn books_update_in_place() {
    let db = TestDatabase::new();
    let store = SqliteBookRepository::new(Arc::clone(&db.manager));
    let mut book = Book::new("The Left Hand of Darkness", Some("Ursula K. Le Guin".into()), "to-read");
    store.insert(&book).await.unwrap();

    book.shelf = "read".into();
    book.rating = Some(5);
    store.update(&book).await.unwrap();

    let all = store.all().await.unwrap();
    assert_eq!(all, vec![book]);
}
