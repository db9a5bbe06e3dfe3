//! Domain types and models

pub mod log_record;
pub mod outcome;
pub mod records;
pub mod snapshot;
pub mod sync_run;

pub use log_record::{LogLevel, LogRecord, LogSubject};
pub use outcome::ItemOutcome;
pub use records::{Book, ChartEntry, DailyActivity, FeedEntry, Listen, Playlist, Workout};
pub use snapshot::SyncRunSnapshot;
pub use sync_run::{SyncRun, SyncStatus};
