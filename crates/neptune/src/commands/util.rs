//! Shared helpers for command handlers.

use neptune_core::{NOT_FOUND, Reading};

/// Human-readable form of a sink reading.
pub fn describe(reading: Reading) -> String {
    match reading {
        #[allow(clippy::float_cmp)]
        Reading::Probe(v) if v == NOT_FOUND => "not found".into(),
        Reading::Probe(v) => format!("{v:.2}"),
        Reading::Outlet(1) => "on".into(),
        Reading::Outlet(0) => "off".into(),
        Reading::Outlet(_) => "unknown".into(),
        Reading::FeedActive(true) => "active".into(),
        Reading::FeedActive(false) => "inactive".into(),
    }
}
