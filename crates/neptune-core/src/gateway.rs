// ── Command gateway ──
//
// Write path to the controller. Commands are fire-and-forget: no queue,
// no ordering between outlets, no retry. A failed command is logged and
// otherwise treated like a successful one.

use std::sync::Arc;

use neptune_api::{FeedMode, OutletCommand};
use serde::Serialize;
use tracing::{info, warn};

use crate::descriptor::DeviceDescriptor;
use crate::device::DeviceApi;
use crate::store::StatusCache;

/// Feed mode state as seen by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedState {
    Inactive,
    Active,
}

impl FeedState {
    pub fn code(self) -> u8 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

pub struct CommandGateway {
    api: Arc<dyn DeviceApi>,
    cache: Arc<StatusCache>,
}

impl CommandGateway {
    pub fn new(api: Arc<dyn DeviceApi>, cache: Arc<StatusCache>) -> Self {
        Self { api, cache }
    }

    /// Send an outlet write, then refresh the cache whether or not the
    /// device accepted it.
    ///
    /// The refresh may still observe the old state if the controller has
    /// not applied the change yet; the next TTL-driven read corrects it.
    pub async fn set_outlet(&self, descriptor: &DeviceDescriptor, command: OutletCommand) {
        let outlet = descriptor.name();
        match self.api.set_outlet_state(outlet, command).await {
            Ok(()) => info!(outlet, %command, code = command.code(), "outlet command sent"),
            Err(e) => warn!(
                outlet,
                %command,
                error = %e,
                transient = e.is_transient(),
                "outlet command failed"
            ),
        }
        self.cache.force_refresh().await;
    }

    /// Flip an outlet: off goes to its configured default-on command,
    /// anything else goes to [`OutletCommand::Off`].
    pub async fn toggle_outlet(&self, descriptor: &DeviceDescriptor, currently_on: bool) {
        let command = if currently_on {
            OutletCommand::Off
        } else {
            descriptor.default_on().unwrap_or(OutletCommand::On)
        };
        self.set_outlet(descriptor, command).await;
    }

    /// Start `mode`, or cancel the running feed cycle when `is_active`.
    /// Returns the state the sink should now show.
    pub async fn update_feed_mode(&self, mode: FeedMode, is_active: bool) -> FeedState {
        if is_active {
            if let Err(e) = self.api.cancel_feed_mode().await {
                warn!(mode = %mode, error = %e, transient = e.is_transient(), "feed cancel failed");
            } else {
                info!(mode = %mode, "feed mode cancelled");
            }
            FeedState::Inactive
        } else {
            if let Err(e) = self.api.set_feed_mode(mode).await {
                warn!(mode = %mode, error = %e, transient = e.is_transient(), "feed start failed");
            } else {
                info!(mode = %mode, "feed mode started");
            }
            FeedState::Active
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use neptune_api::{OutletKey, StatusParser};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::RefreshConfig;
    use crate::device::fake::{FakeDevice, STATUS_XML, Sent};

    fn gateway(device: &Arc<FakeDevice>) -> CommandGateway {
        let api: Arc<dyn DeviceApi> = Arc::clone(device) as Arc<dyn DeviceApi>;
        let parser = StatusParser::new(vec![OutletKey::new("Pump1", "1_1")]);
        let cache = Arc::new(StatusCache::new(
            Arc::clone(&api),
            parser,
            RefreshConfig::default(),
        ));
        CommandGateway::new(api, cache)
    }

    fn heater(default_on: OutletCommand) -> DeviceDescriptor {
        DeviceDescriptor::outlet("1_2", "Heater", false, default_on)
    }

    #[tokio::test]
    async fn set_outlet_refreshes_after_command() {
        let device = Arc::new(FakeDevice::new(STATUS_XML));
        let gw = gateway(&device);

        gw.set_outlet(&heater(OutletCommand::On), OutletCommand::Auto)
            .await;

        assert_eq!(
            device.sent(),
            vec![Sent::Outlet("Heater".into(), OutletCommand::Auto)]
        );
        assert_eq!(device.fetches(), 1);
    }

    #[tokio::test]
    async fn set_outlet_refreshes_even_when_command_fails() {
        let device = Arc::new(FakeDevice::unreachable());
        let gw = gateway(&device);

        gw.set_outlet(&heater(OutletCommand::On), OutletCommand::Off)
            .await;

        assert_eq!(device.sent().len(), 1);
        assert_eq!(device.fetches(), 1);
    }

    #[tokio::test]
    async fn toggle_uses_default_on_and_off() {
        let device = Arc::new(FakeDevice::new(STATUS_XML));
        let gw = gateway(&device);

        gw.toggle_outlet(&heater(OutletCommand::Auto), false).await;
        gw.toggle_outlet(&heater(OutletCommand::Auto), true).await;
        gw.toggle_outlet(&heater(OutletCommand::On), false).await;

        assert_eq!(
            device.sent(),
            vec![
                Sent::Outlet("Heater".into(), OutletCommand::Auto),
                Sent::Outlet("Heater".into(), OutletCommand::Off),
                Sent::Outlet("Heater".into(), OutletCommand::On),
            ]
        );
    }

    #[tokio::test]
    async fn feed_mode_start_and_cancel() {
        let device = Arc::new(FakeDevice::new(STATUS_XML));
        let gw = gateway(&device);

        let started = gw.update_feed_mode(FeedMode::B, false).await;
        assert_eq!(started, FeedState::Active);
        assert_eq!(started.code(), 1);

        let stopped = gw.update_feed_mode(FeedMode::B, true).await;
        assert_eq!(stopped, FeedState::Inactive);
        assert_eq!(stopped.code(), 0);

        assert_eq!(device.sent(), vec![Sent::Feed(FeedMode::B), Sent::CancelFeed]);
        // Feed commands do not refresh.
        assert_eq!(device.fetches(), 0);
    }

    #[tokio::test]
    async fn feed_state_flips_even_if_device_refuses() {
        let device = Arc::new(FakeDevice::unreachable());
        let gw = gateway(&device);
        assert!(gw.update_feed_mode(FeedMode::A, false).await.is_active());
    }
}
