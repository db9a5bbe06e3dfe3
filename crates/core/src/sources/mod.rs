//! Local storage ports used by the source adapters

pub mod ports;

pub use ports::{
    BookStore, ChartStore, DailyActivityStore, FeedEntryStore, ListenStore, PlaylistStore,
    WorkoutStore,
};
