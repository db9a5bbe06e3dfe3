//! Entry point for starting sync runs by source name.
//!
//! The service owns the database, the shared HTTP client, and the progress
//! broadcaster. Each call builds the requested adapter from its config
//! section and drives it with a fresh [`SyncOrchestrator`].
//!
//! # Example
//!
//! ```no_run
//! use almanac_infra::config;
//! use almanac_infra::services::SyncService;
//!
//! # async fn example() -> almanac_domain::Result<()> {
//! let service = SyncService::open(config::load()?)?;
//! let run = service.run("feeds").await?;
//! println!("{}", run.summary());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use almanac_core::{
    LogSink, SourceAdapter, StatusBroadcaster, SyncOrchestrator, SyncRunRepository,
};
use almanac_domain::constants::{
    ALL_SOURCES, SOURCE_BOOKS, SOURCE_FEEDS, SOURCE_FITNESS, SOURCE_LISTENING_STATS,
    SOURCE_PLAYLISTS, SOURCE_SCROBBLES, SOURCE_WORKOUTS,
};
use almanac_domain::{AlmanacError, Config, LogRecord, Result, SyncRun};
use tracing::{info, warn};
use uuid::Uuid;

use crate::broadcast::ChannelBroadcaster;
use crate::database::{
    DbManager, SqliteBookRepository, SqliteChartRepository, SqliteDailyActivityRepository,
    SqliteFeedEntryRepository, SqliteListenRepository, SqliteLogRepository,
    SqlitePlaylistRepository, SqliteSyncRunRepository, SqliteWorkoutRepository,
};
use crate::http::HttpClient;
use crate::integrations::books::BooksAdapter;
use crate::integrations::feeds::FeedsAdapter;
use crate::integrations::fitness::FitnessAdapter;
use crate::integrations::listening_stats::ListeningStatsAdapter;
use crate::integrations::playlists::PlaylistsAdapter;
use crate::integrations::scrobbles::ScrobblesAdapter;
use crate::integrations::workouts::WorkoutsAdapter;
use crate::logging::{TeeLogSink, TracingLogSink};

/// Starts sync runs for configured sources.
pub struct SyncService {
    config: Config,
    db: Arc<DbManager>,
    http: HttpClient,
    runs: Arc<SqliteSyncRunRepository>,
    log_store: Arc<SqliteLogRepository>,
    logs: Arc<dyn LogSink>,
    broadcaster: ChannelBroadcaster,
}

impl SyncService {
    /// Open the configured database, apply the schema, and build the service.
    pub fn open(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;
        let http = HttpClient::builder()
            .user_agent(concat!("almanac/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_parts(config, db, http))
    }

    /// Build the service around an existing database and HTTP client.
    pub fn with_parts(config: Config, db: Arc<DbManager>, http: HttpClient) -> Self {
        let runs = Arc::new(SqliteSyncRunRepository::new(Arc::clone(&db)));
        let log_store = Arc::new(SqliteLogRepository::new(Arc::clone(&db)));

        let mut tee = TeeLogSink::new().with_sink(Arc::new(TracingLogSink::new()));
        if config.sync.log_to_database {
            tee = tee.with_sink(Arc::clone(&log_store) as Arc<dyn LogSink>);
        }

        let broadcaster = ChannelBroadcaster::new(config.sync.broadcast_capacity);
        Self { config, db, http, runs, log_store, logs: Arc::new(tee), broadcaster }
    }

    pub fn broadcaster(&self) -> &ChannelBroadcaster {
        &self.broadcaster
    }

    /// Sources with a config section, in a stable order.
    pub fn enabled_sources(&self) -> Vec<&'static str> {
        let sources = &self.config.sources;
        ALL_SOURCES
            .into_iter()
            .filter(|source| match *source {
                SOURCE_FITNESS => sources.fitness.is_some(),
                SOURCE_WORKOUTS => sources.workouts.is_some(),
                SOURCE_SCROBBLES => sources.scrobbles.is_some(),
                SOURCE_PLAYLISTS => sources.playlists.is_some(),
                SOURCE_LISTENING_STATS => sources.listening_stats.is_some(),
                SOURCE_BOOKS => sources.books.is_some(),
                SOURCE_FEEDS => sources.feeds.is_some(),
                _ => false,
            })
            .collect()
    }

    /// Run one source with a new run record.
    pub async fn run(&self, source: &str) -> Result<SyncRun> {
        self.dispatch(source, None).await
    }

    /// Run the source of an existing run record.
    ///
    /// A `pending` run is adopted; any other status starts a fresh run that
    /// links back to it.
    pub async fn resume(&self, run_id: Uuid) -> Result<SyncRun> {
        let run = self
            .runs
            .get(run_id)
            .await?
            .ok_or_else(|| AlmanacError::NotFound(format!("sync run {run_id}")))?;
        let source = run.source_type.clone();
        self.dispatch(&source, Some(run)).await
    }

    /// Run every enabled source one after another.
    ///
    /// A failing source does not stop the others.
    pub async fn run_all(&self) -> Vec<(String, Result<SyncRun>)> {
        let mut results = Vec::new();
        for source in self.enabled_sources() {
            let result = self.run(source).await;
            if let Err(err) = &result {
                warn!(source, error = %err, "source sync failed");
            }
            results.push((source.to_string(), result));
        }
        results
    }

    /// Create a `pending` run to be started later with [`resume`](Self::resume).
    pub async fn enqueue(&self, source: &str, interactive: bool) -> Result<SyncRun> {
        if !ALL_SOURCES.contains(&source) {
            return Err(AlmanacError::InvalidInput(format!("unknown source '{source}'")));
        }
        let run = SyncRun::new(source, interactive);
        self.runs.create(&run).await?;
        info!(run_id = %run.id, source, "queued sync run");
        Ok(run)
    }

    pub async fn recent_runs(&self, source: Option<&str>, limit: usize) -> Result<Vec<SyncRun>> {
        self.runs.list_recent(source, limit).await
    }

    pub async fn run_logs(&self, run_id: Uuid) -> Result<Vec<LogRecord>> {
        self.log_store.list_for_run(run_id).await
    }

    pub fn health_check(&self) -> Result<()> {
        self.db.health_check()
    }

    async fn dispatch(&self, source: &str, existing: Option<SyncRun>) -> Result<SyncRun> {
        let sources = &self.config.sources;
        let db = &self.db;
        let http = self.http.clone();

        match source {
            SOURCE_FITNESS => {
                let config = required(sources.fitness.as_ref(), source)?;
                let store = Arc::new(SqliteDailyActivityRepository::new(Arc::clone(db)));
                self.execute(FitnessAdapter::new(config, http, store), existing).await
            }
            SOURCE_WORKOUTS => {
                let config = required(sources.workouts.as_ref(), source)?;
                let store = Arc::new(SqliteWorkoutRepository::new(Arc::clone(db)));
                self.execute(WorkoutsAdapter::new(config, http, store), existing).await
            }
            SOURCE_SCROBBLES => {
                let config = required(sources.scrobbles.as_ref(), source)?;
                let store = Arc::new(SqliteListenRepository::new(Arc::clone(db)));
                let runs: Arc<dyn SyncRunRepository> = self.runs.clone();
                self.execute(ScrobblesAdapter::new(config, http, store, runs), existing).await
            }
            SOURCE_PLAYLISTS => {
                let config = required(sources.playlists.as_ref(), source)?;
                let store = Arc::new(SqlitePlaylistRepository::new(Arc::clone(db)));
                self.execute(PlaylistsAdapter::new(config, http, store), existing).await
            }
            SOURCE_LISTENING_STATS => {
                let config = required(sources.listening_stats.as_ref(), source)?;
                let store = Arc::new(SqliteChartRepository::new(Arc::clone(db)));
                self.execute(ListeningStatsAdapter::new(config, http, store), existing).await
            }
            SOURCE_BOOKS => {
                let config = required(sources.books.as_ref(), source)?;
                let store = Arc::new(SqliteBookRepository::new(Arc::clone(db)));
                self.execute(BooksAdapter::new(config, http, store), existing).await
            }
            SOURCE_FEEDS => {
                let config = required(sources.feeds.as_ref(), source)?;
                let store = Arc::new(SqliteFeedEntryRepository::new(Arc::clone(db)));
                self.execute(FeedsAdapter::new(config, http, store), existing).await
            }
            other => Err(AlmanacError::InvalidInput(format!("unknown source '{other}'"))),
        }
    }

    async fn execute<A: SourceAdapter>(
        &self,
        adapter: A,
        existing: Option<SyncRun>,
    ) -> Result<SyncRun> {
        let runs: Arc<dyn SyncRunRepository> = self.runs.clone();
        let broadcaster: Arc<dyn StatusBroadcaster> = Arc::new(self.broadcaster.clone());

        let mut orchestrator = SyncOrchestrator::new(adapter, runs, Arc::clone(&self.logs))
            .with_broadcaster(broadcaster, self.config.sync.broadcast_enabled);
        if let Some(run) = existing {
            orchestrator = orchestrator.with_run(run);
        }

        orchestrator.perform().await
    }
}

fn required<'a, T>(section: Option<&'a T>, source: &str) -> Result<&'a T> {
    section.ok_or_else(|| AlmanacError::Config(format!("source '{source}' is not configured")))
}
