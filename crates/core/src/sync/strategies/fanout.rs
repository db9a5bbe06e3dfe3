//! Fan-out of one logical item into several sub-requests

use almanac_domain::ItemOutcome;
use serde::{Deserialize, Serialize};

/// One cell of a category by period matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FanOutTask {
    pub category: String,
    pub period: String,
}

impl FanOutTask {
    /// Every `(category, period)` pair, categories outermost.
    pub fn matrix<C, P>(categories: &[C], periods: &[P]) -> Vec<Self>
    where
        C: AsRef<str>,
        P: AsRef<str>,
    {
        categories
            .iter()
            .flat_map(|category| {
                periods.iter().map(move |period| Self {
                    category: category.as_ref().to_string(),
                    period: period.as_ref().to_string(),
                })
            })
            .collect()
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.category, self.period)
    }
}

/// Collapse the outcomes of an item's sub-requests into one.
///
/// Uses [`ItemOutcome::combine`] precedence; no sub-requests means nothing
/// changed.
pub fn reduce_outcomes(outcomes: impl IntoIterator<Item = ItemOutcome>) -> ItemOutcome {
    outcomes.into_iter().fold(ItemOutcome::Skipped, ItemOutcome::combine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_crosses_categories_and_periods() {
        let tasks = FanOutTask::matrix(&["artists", "tracks"], &["7day", "overall"]);
        let labels: Vec<_> = tasks.iter().map(FanOutTask::label).collect();
        assert_eq!(
            labels,
            vec!["artists (7day)", "artists (overall)", "tracks (7day)", "tracks (overall)"]
        );
    }

    #[test]
    fn reduction_takes_strongest_outcome() {
        use ItemOutcome::*;
        assert_eq!(reduce_outcomes([]), Skipped);
        assert_eq!(reduce_outcomes([Skipped, Updated, Skipped]), Updated);
        assert_eq!(reduce_outcomes([Updated, Created]), Created);
        assert_eq!(reduce_outcomes([Created, Failed, Updated]), Failed);
    }
}
