//! Activity tracker workouts
//!
//! Pulls every workout started within the recency window and removes local
//! workouts in that window that the tracker no longer reports.

mod adapter;
mod client;

pub use adapter::WorkoutsAdapter;
pub use client::{WorkoutRecord, WorkoutsClient};
