//! Change-marker comparison

use almanac_domain::ItemOutcome;

/// Outcome for an item whose upstream carries an opaque change marker
/// (a snapshot id, an etag, a revision number).
///
/// No stored marker means the item is new; an equal marker means nothing
/// changed upstream.
pub fn classify_marker<M: PartialEq + ?Sized>(stored: Option<&M>, current: &M) -> ItemOutcome {
    match stored {
        None => ItemOutcome::Created,
        Some(previous) if previous == current => ItemOutcome::Skipped,
        Some(_) => ItemOutcome::Updated,
    }
}
