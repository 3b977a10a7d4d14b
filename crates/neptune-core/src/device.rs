// ── Device access seam ──
//
// The cache and gateway talk to the controller through `DeviceApi` so
// they can be driven by `ApexClient` in production and by an in-memory
// fake in tests.

use async_trait::async_trait;
use neptune_api::{ApexClient, Error, FeedMode, OutletCommand};

/// Operations the core needs from a controller connection.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Fetch the raw status document.
    async fn fetch_status(&self) -> Result<String, Error>;

    /// Send a write-side outlet command.
    async fn set_outlet_state(&self, outlet_name: &str, command: OutletCommand)
    -> Result<(), Error>;

    async fn set_feed_mode(&self, mode: FeedMode) -> Result<(), Error>;

    async fn cancel_feed_mode(&self) -> Result<(), Error>;
}

#[async_trait]
impl DeviceApi for ApexClient {
    async fn fetch_status(&self) -> Result<String, Error> {
        ApexClient::fetch_status(self).await
    }

    async fn set_outlet_state(
        &self,
        outlet_name: &str,
        command: OutletCommand,
    ) -> Result<(), Error> {
        ApexClient::set_outlet_state(self, outlet_name, command).await
    }

    async fn set_feed_mode(&self, mode: FeedMode) -> Result<(), Error> {
        ApexClient::set_feed_mode(self, mode).await
    }

    async fn cancel_feed_mode(&self) -> Result<(), Error> {
        ApexClient::cancel_feed_mode(self).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fake {
    //! In-memory controller used by the cache, gateway and scheduler tests.

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Two probes and two outlets, one of which (`Skimmer`) is usually
    /// left off the allow-list.
    pub(crate) const STATUS_XML: &str = r#"<?xml version="1.0"?>
<status software="5.08_7A18" hardware="1.0">
  <hostname>reef</hostname>
  <probes>
    <probe><name>Tmp</name><value>78.1</value><type>Temp</type></probe>
    <probe><name>pH</name><value>8.21</value><type>pH</type></probe>
  </probes>
  <outlets>
    <outlet><name>Pump1</name><outputID>1</outputID><state>AOF</state><deviceID>1_1</deviceID></outlet>
    <outlet><name>Heater</name><outputID>2</outputID><state>ON</state><deviceID>1_2</deviceID></outlet>
    <outlet><name>Skimmer</name><outputID>3</outputID><state>AON</state><deviceID>1_3</deviceID></outlet>
  </outlets>
</status>"#;

    /// A command the fake received, in arrival order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Sent {
        Outlet(String, OutletCommand),
        Feed(FeedMode),
        CancelFeed,
    }

    pub(crate) struct FakeDevice {
        body: Mutex<Option<String>>,
        fetches: AtomicUsize,
        sent: Mutex<Vec<Sent>>,
        fail_commands: bool,
        latency: Duration,
    }

    impl FakeDevice {
        pub(crate) fn new(body: &str) -> Self {
            Self {
                body: Mutex::new(Some(body.to_owned())),
                fetches: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
                fail_commands: false,
                latency: Duration::ZERO,
            }
        }

        /// A device whose every request fails.
        pub(crate) fn unreachable() -> Self {
            Self {
                body: Mutex::new(None),
                fetches: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
                fail_commands: true,
                latency: Duration::ZERO,
            }
        }

        /// Every request waits `latency` before answering.
        pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        async fn respond_delay(&self) {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
        }

        pub(crate) fn set_body(&self, body: Option<&str>) {
            *self.body.lock().unwrap() = body.map(str::to_owned);
        }

        pub(crate) fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        pub(crate) fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn record(&self, sent: Sent) -> Result<(), Error> {
            self.sent.lock().unwrap().push(sent);
            if self.fail_commands {
                Err(refused())
            } else {
                Ok(())
            }
        }
    }

    fn refused() -> Error {
        Error::Status {
            status: 503,
            url: "http://fake/status.sht".into(),
        }
    }

    #[async_trait]
    impl DeviceApi for FakeDevice {
        async fn fetch_status(&self) -> Result<String, Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.respond_delay().await;
            self.body.lock().unwrap().clone().ok_or_else(refused)
        }

        async fn set_outlet_state(
            &self,
            outlet_name: &str,
            command: OutletCommand,
        ) -> Result<(), Error> {
            self.respond_delay().await;
            self.record(Sent::Outlet(outlet_name.to_owned(), command))
        }

        async fn set_feed_mode(&self, mode: FeedMode) -> Result<(), Error> {
            self.respond_delay().await;
            self.record(Sent::Feed(mode))
        }

        async fn cancel_feed_mode(&self) -> Result<(), Error> {
            self.respond_delay().await;
            self.record(Sent::CancelFeed)
        }
    }
}
