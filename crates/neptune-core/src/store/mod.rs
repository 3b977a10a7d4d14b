// ── Status store ──
//
// The one shared copy of controller state. Readers get `Arc` snapshots
// out of a `watch` channel; refreshes replace the snapshot wholesale.

mod cache;
mod snapshot;

pub use cache::{StatusCache, decode_outlet_state, is_stale};
pub use snapshot::StatusSnapshot;

/// Reading returned for a probe or outlet missing from the snapshot.
///
/// The value is in-band: a probe that genuinely reads `-1.0` is
/// indistinguishable from a missing one, and like the sentinel it skips
/// Fahrenheit conversion in `DeviceDescriptor::display_value`.
pub const NOT_FOUND: f64 = -1.0;

/// Outlet state code for an unknown or missing outlet.
pub const OUTLET_UNKNOWN: i8 = -1;
