//! Activity tracker daily summaries
//!
//! Pulls one aggregate row per day over a trailing window that overlaps the
//! newest stored day, so late edits upstream are picked up on the next run.

mod adapter;
mod client;

pub use adapter::FitnessAdapter;
pub use client::{DailySummary, FitnessClient};
