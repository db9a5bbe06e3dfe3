//! Database implementations

pub mod book_repository;
pub mod chart_repository;
pub mod daily_activity_repository;
pub mod feed_entry_repository;
pub mod listen_repository;
pub mod log_repository;
pub mod manager;
pub mod playlist_repository;
pub mod sync_run_repository;
pub mod workout_repository;

mod sql;

pub use book_repository::SqliteBookRepository;
pub use chart_repository::SqliteChartRepository;
pub use daily_activity_repository::SqliteDailyActivityRepository;
pub use feed_entry_repository::SqliteFeedEntryRepository;
pub use listen_repository::SqliteListenRepository;
pub use log_repository::SqliteLogRepository;
pub use manager::DbManager;
pub use playlist_repository::SqlitePlaylistRepository;
pub use sync_run_repository::SqliteSyncRunRepository;
pub use workout_repository::SqliteWorkoutRepository;
