//! When a running sync publishes progress
//!
//! Besides every status transition, a run broadcasts after every Nth
//! processed item and on the first item that takes the percentage across
//! each milestone. Triggers are not deduplicated: an item that satisfies
//! both rules publishes twice.

use almanac_domain::constants::{BROADCAST_EVERY_N_ITEMS, BROADCAST_MILESTONES};

/// Why a snapshot was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastTrigger {
    /// The run moved to `running`.
    Started,
    /// Items were fetched and processing is about to begin.
    ItemsFetched,
    /// The processed count hit a multiple of the interval.
    Interval,
    /// The percentage crossed the given milestone.
    Milestone(u8),
    /// The run moved to `completed`.
    Completed,
    /// The run moved to `failed`.
    Failed,
}

#[derive(Debug, Clone)]
pub struct BroadcastCadence {
    every_n_items: u64,
    milestones: Vec<u8>,
}

impl Default for BroadcastCadence {
    fn default() -> Self {
        Self { every_n_items: BROADCAST_EVERY_N_ITEMS, milestones: BROADCAST_MILESTONES.to_vec() }
    }
}

impl BroadcastCadence {
    pub fn new(every_n_items: u64, milestones: impl Into<Vec<u8>>) -> Self {
        let mut milestones = milestones.into();
        milestones.sort_unstable();
        Self { every_n_items, milestones }
    }

    /// Triggers fired by the item that brought the run to `processed`.
    ///
    /// `percentages` holds the run's percentage before and after the item,
    /// and is `None` while the total is unknown; milestones need a total.
    pub fn item_triggers(
        &self,
        processed: u64,
        percentages: Option<(u8, u8)>,
    ) -> Vec<BroadcastTrigger> {
        let mut triggers = Vec::new();

        if self.every_n_items > 0 && processed > 0 && processed % self.every_n_items == 0 {
            triggers.push(BroadcastTrigger::Interval);
        }

        if let Some((before, after)) = percentages {
            triggers.extend(
                self.milestones
                    .iter()
                    .filter(|&&milestone| before < milestone && after >= milestone)
                    .map(|&milestone| BroadcastTrigger::Milestone(milestone)),
            );
        }

        triggers
    }
}
