//! Date-windowed fetching

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive range of days an adapter should fetch.
///
/// The window starts `overlap_days` before the newest locally stored day so
/// that late upstream edits are picked up, but never before `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyncWindow {
    pub fn compute(
        last_known: Option<NaiveDate>,
        overlap_days: u32,
        floor: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        let start = last_known
            .and_then(|last| last.checked_sub_days(Days::new(u64::from(overlap_days))))
            .map_or(floor, |candidate| candidate.max(floor));
        Self { start, end: today }
    }

    /// No days to fetch, e.g. when the floor lies in the future.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Every day in the window, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn overlaps_newest_stored_day() {
        let window = SyncWindow::compute(Some(day(2024, 1, 10)), 7, day(2023, 1, 1), day(2024, 1, 20));
        assert_eq!(window.start, day(2024, 1, 3));
        assert_eq!(window.end, day(2024, 1, 20));
        assert_eq!(window.len(), 18);
    }

    #[test]
    fn never_starts_before_floor() {
        let window = SyncWindow::compute(Some(day(2024, 1, 5)), 7, day(2024, 1, 1), day(2024, 1, 6));
        assert_eq!(window.start, day(2024, 1, 1));
    }

    #[test]
    fn first_sync_starts_at_floor() {
        let window = SyncWindow::compute(None, 7, day(2024, 1, 1), day(2024, 1, 3));
        let days: Vec<_> = window.days().collect();
        assert_eq!(days, vec![day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)]);
    }

    #[test]
    fn future_floor_yields_empty_window() {
        let window = SyncWindow::compute(None, 7, day(2025, 1, 1), day(2024, 6, 1));
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
        assert_eq!(window.days().count(), 0);
        assert!(!window.contains(day(2024, 6, 1)));
    }
}
