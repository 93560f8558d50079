//! Pure read-side metric derivation.
//!
//! Nothing in this module touches the database; queries hand in the relevant
//! observations and these functions turn them into dashboard-facing numbers.
//! The key invariant: absence of a comparison point yields `None`, never a
//! zero delta — "no change" and "nothing to compare against" must stay
//! distinguishable.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// The count fields of one snapshot, as needed for delta computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountObservation {
    pub captured_at: DateTime<Utc>,
    pub campaigns_count: i32,
    pub creatives_count: i32,
}

/// Change in counts between the latest snapshot and the 24h reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delta24h {
    pub campaigns_count: i32,
    pub creatives_count: i32,
}

/// Start of the trailing 24-hour comparison window.
#[must_use]
pub fn delta_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(24)
}

/// Start of an N-day series window.
///
/// `days = 0` puts the window start at `now`, so a series query returns an
/// empty sequence rather than an error.
#[must_use]
pub fn series_window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Computes the 24h delta from the latest snapshot and the earliest snapshot
/// still inside the trailing window.
///
/// Returns `None` when there is no in-window reference point. The reference
/// may be the latest snapshot itself (single observation in the window), in
/// which case the delta is legitimately zero.
#[must_use]
pub fn delta_24h(
    latest: &CountObservation,
    reference: Option<&CountObservation>,
) -> Option<Delta24h> {
    reference.map(|reference| Delta24h {
        campaigns_count: latest.campaigns_count - reference.campaigns_count,
        creatives_count: latest.creatives_count - reference.creatives_count,
    })
}
