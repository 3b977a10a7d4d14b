// ── Reading sink ──
//
// Where polled values go. The host integration (the CLI's `watch` mode,
// or an accessory bridge) implements `ReadingSink`; the scheduler only
// ever pushes.

use serde::Serialize;

use crate::descriptor::DeviceDescriptor;

/// A value pushed for one device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reading {
    /// Display value, already converted to Celsius where configured.
    Probe(f64),
    /// Outlet state code: 1 on, 0 off, -1 unknown.
    Outlet(i8),
    FeedActive(bool),
}

pub trait ReadingSink: Send + Sync {
    fn publish(&self, descriptor: &DeviceDescriptor, reading: Reading);
}
