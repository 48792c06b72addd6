//! Monotonic nanosecond clock
//!
//! Timestamps in the region are monotonic nanoseconds. `Instant` gives
//! monotonicity but no absolute value, so the clock anchors a wall-clock
//! reading taken once at first use; every later reading is the anchor
//! plus monotonic elapsed time. Always strictly positive, which the
//! order validity predicate relies on.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

struct Anchor {
    started: Instant,
    epoch_nanos: u64,
}

static ANCHOR: OnceLock<Anchor> = OnceLock::new();

/// Current monotonic timestamp in nanoseconds.
pub fn monotonic_nanos() -> u64 {
    let anchor = ANCHOR.get_or_init(|| Anchor {
        started: Instant::now(),
        epoch_nanos: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1),
    });
    anchor
        .epoch_nanos
        .saturating_add(anchor.started.elapsed().as_nanos() as u64)
}
