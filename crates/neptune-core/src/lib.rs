// neptune-core: status cache and command path between neptune-api and
// host integrations (CLI, accessory bridges).

pub mod config;
pub mod controller;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod gateway;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, RefreshConfig, TlsVerification};
pub use controller::Controller;
pub use descriptor::{DeviceDescriptor, DeviceKind, FAHRENHEIT_TO_CELSIUS_FACTOR};
pub use device::DeviceApi;
pub use error::CoreError;
pub use gateway::{CommandGateway, FeedState};
pub use registry::{Registration, RegistrationPlan};
pub use scheduler::PollingScheduler;
pub use sink::{Reading, ReadingSink};
pub use store::{NOT_FOUND, OUTLET_UNKNOWN, StatusCache, StatusSnapshot};

// Wire types callers need to build descriptors and commands.
pub use neptune_api::{FeedMode, OutletCommand, OutletState, ProbeType};
