//! Per-item processing outcome

use serde::{Deserialize, Serialize};

use super::log_record::LogLevel;

/// Result of mapping one fetched item onto local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Created,
    Updated,
    Skipped,
    Failed,
}

crate::impl_domain_status_conversions!(ItemOutcome {
    Created => "created",
    Updated => "updated",
    Skipped => "skipped",
    Failed => "failed",
});

impl ItemOutcome {
    /// Rank used when several sub-results collapse into one:
    /// `failed > created > updated > skipped`.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Skipped => 0,
            Self::Updated => 1,
            Self::Created => 2,
            Self::Failed => 3,
        }
    }

    /// Combine two outcomes keeping the one with higher precedence.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        if other.precedence() > self.precedence() {
            other
        } else {
            self
        }
    }

    /// Log level the orchestrator uses when reporting this outcome.
    pub fn log_level(self) -> LogLevel {
        match self {
            Self::Created => LogLevel::Success,
            Self::Updated | Self::Skipped => LogLevel::Info,
            Self::Failed => LogLevel::Warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_follows_precedence() {
        use ItemOutcome::*;
        assert_eq!(Skipped.combine(Updated), Updated);
        assert_eq!(Updated.combine(Created), Created);
        assert_eq!(Created.combine(Updated), Created);
        assert_eq!(Created.combine(Failed), Failed);
        assert_eq!(Failed.combine(Skipped), Failed);
        assert_eq!(Skipped.combine(Skipped), Skipped);
    }

    #[test]
    fn log_levels_match_outcome_severity() {
        assert_eq!(ItemOutcome::Created.log_level(), LogLevel::Success);
        assert_eq!(ItemOutcome::Updated.log_level(), LogLevel::Info);
        assert_eq!(ItemOutcome::Skipped.log_level(), LogLevel::Info);
        assert_eq!(ItemOutcome::Failed.log_level(), LogLevel::Warning);
    }
}
