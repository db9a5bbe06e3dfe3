//! Fuzzy matching for sources without stable identifiers
//!
//! Titles are normalized first, then compared with a fixed rule order:
//! exact, containment, edit-distance similarity, word overlap.

pub mod matcher;
pub mod normalize;
pub mod similarity;

pub use matcher::{FuzzyMatcher, MatchRule};
pub use normalize::normalize;
pub use similarity::{levenshtein, similarity, word_overlap};
