// neptune-api: Async Rust client for the Neptune Apex controller's HTTP interface

pub mod client;
pub mod error;
pub mod models;
pub mod status;
pub mod transport;

pub use client::{ApexClient, Credentials};
pub use error::Error;
pub use models::{
    DeviceStatus, FeedMode, OutletCommand, OutletReading, OutletState, ProbeReading, ProbeType,
};
pub use status::{OutletKey, StatusParser};
pub use transport::{TlsMode, TransportConfig};
