//! Top-chart snapshots from the scrobble service
//!
//! One item per `(category, period)` cell; each cell fetches its chart and
//! writes one row per rank.

mod adapter;
mod client;

pub use adapter::{ListeningStatsAdapter, CHART_CATEGORIES};
pub use client::{ChartItem, ListeningStatsClient};
