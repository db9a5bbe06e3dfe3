//! Rule-ordered fuzzy matcher

use almanac_domain::constants::{EDIT_DISTANCE_MATCH_THRESHOLD, WORD_OVERLAP_MATCH_THRESHOLD};
use serde::{Deserialize, Serialize};

use super::normalize::normalize;
use super::similarity::{similarity, word_overlap};

/// Which rule matched two titles, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    Containment,
    EditDistance,
    WordOverlap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatcher {
    edit_distance_threshold: f64,
    word_overlap_threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            edit_distance_threshold: EDIT_DISTANCE_MATCH_THRESHOLD,
            word_overlap_threshold: WORD_OVERLAP_MATCH_THRESHOLD,
        }
    }
}

impl FuzzyMatcher {
    pub fn new(edit_distance_threshold: f64, word_overlap_threshold: f64) -> Self {
        Self { edit_distance_threshold, word_overlap_threshold }
    }

    /// First rule under which `a` and `b` match, if any.
    ///
    /// Titles that normalize to nothing never match.
    pub fn match_rule(&self, a: &str, b: &str) -> Option<MatchRule> {
        self.match_normalized(&normalize(a), &normalize(b))
    }

    pub fn is_match(&self, a: &str, b: &str) -> bool {
        self.match_rule(a, b).is_some()
    }

    fn match_normalized(&self, a: &str, b: &str) -> Option<MatchRule> {
        if a.is_empty() || b.is_empty() {
            return None;
        }
        if a == b {
            return Some(MatchRule::Exact);
        }
        if a.contains(b) || b.contains(a) {
            return Some(MatchRule::Containment);
        }
        if similarity(a, b) >= self.edit_distance_threshold {
            return Some(MatchRule::EditDistance);
        }
        if word_overlap(a, b) >= self.word_overlap_threshold {
            return Some(MatchRule::WordOverlap);
        }
        None
    }

    /// Candidate that best matches `needle`.
    ///
    /// The strongest rule wins; among candidates matched by the same rule the
    /// earliest one is returned.
    pub fn find_best<'a, T, F>(
        &self,
        needle: &str,
        candidates: &'a [T],
        key: F,
    ) -> Option<(&'a T, MatchRule)>
    where
        F: Fn(&T) -> &str,
    {
        let needle = normalize(needle);
        let mut best: Option<(&'a T, MatchRule)> = None;

        for candidate in candidates {
            let Some(rule) = self.match_normalized(&needle, &normalize(key(candidate))) else {
                continue;
            };
            if best.map_or(true, |(_, current)| rule < current) {
                best = Some((candidate, rule));
                if rule == MatchRule::Exact {
                    break;
                }
            }
        }

        best
    }
}
