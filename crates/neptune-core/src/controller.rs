// ── Controller facade ──
//
// Wires one Apex connection together: the HTTP client, the status cache,
// the command gateway and (once started) the polling scheduler. This is
// the surface the host integration talks to.

use std::collections::HashSet;
use std::sync::Arc;

use neptune_api::{
    ApexClient, Credentials, FeedMode, OutletCommand, StatusParser, TlsMode, TransportConfig,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ControllerConfig, TlsVerification};
use crate::descriptor::{DeviceDescriptor, DeviceKind};
use crate::device::DeviceApi;
use crate::error::CoreError;
use crate::gateway::{CommandGateway, FeedState};
use crate::registry::RegistrationPlan;
use crate::scheduler::{PollingScheduler, read_device};
use crate::sink::{Reading, ReadingSink};
use crate::store::StatusCache;

/// Cheaply cloneable handle to one controller.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    descriptors: Vec<Arc<DeviceDescriptor>>,
    cache: Arc<StatusCache>,
    gateway: Arc<CommandGateway>,
    scheduler: Mutex<Option<Arc<PollingScheduler>>>,
}

impl Controller {
    /// Build a controller talking HTTP to `config.url`. Does not touch
    /// the network; call [`connect()`](Self::connect) for the first fetch.
    pub fn new(
        config: ControllerConfig,
        descriptors: Vec<DeviceDescriptor>,
    ) -> Result<Self, CoreError> {
        let credentials = Credentials {
            username: config.username.clone(),
            password: config.password.clone(),
        };
        let client = ApexClient::new(config.url.clone(), credentials, &build_transport(&config))?;
        Ok(Self::with_api(config, descriptors, Arc::new(client)))
    }

    /// Build a controller over any [`DeviceApi`] implementation.
    pub fn with_api(
        config: ControllerConfig,
        descriptors: Vec<DeviceDescriptor>,
        api: Arc<dyn DeviceApi>,
    ) -> Self {
        let allowed = descriptors
            .iter()
            .filter_map(DeviceDescriptor::outlet_key)
            .collect();
        let parser = StatusParser::new(allowed);
        let cache = Arc::new(StatusCache::new(
            Arc::clone(&api),
            parser,
            config.refresh.clone(),
        ));
        let gateway = Arc::new(CommandGateway::new(api, Arc::clone(&cache)));

        Self {
            inner: Arc::new(ControllerInner {
                config,
                descriptors: descriptors.into_iter().map(Arc::new).collect(),
                cache,
                gateway,
                scheduler: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn descriptors(&self) -> &[Arc<DeviceDescriptor>] {
        &self.inner.descriptors
    }

    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.inner.cache
    }

    /// Configured device with this name (case-insensitive) and kind.
    pub fn find(&self, kind: DeviceKind, name: &str) -> Result<Arc<DeviceDescriptor>, CoreError> {
        self.inner
            .descriptors
            .iter()
            .find(|d| d.kind() == kind && d.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                kind: kind.to_string(),
                identifier: name.to_owned(),
            })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Perform the initial fetch so the first reads come from a real
    /// snapshot. Unlike later refreshes, a failure here is returned.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.cache.try_refresh().await?;
        info!(
            url = %self.inner.config.url,
            devices = self.inner.descriptors.len(),
            "connected to controller"
        );
        Ok(())
    }

    /// Plan registration against the accessories the host already knows,
    /// then start polling every configured device.
    pub async fn start(&self, sink: Arc<dyn ReadingSink>, known: &HashSet<Uuid>) -> RegistrationPlan {
        let plan = RegistrationPlan::build(
            &self.inner.config.serial_number,
            &self.inner.descriptors,
            known,
        );
        if plan.is_empty() {
            warn!("no devices configured, nothing to poll");
        }
        debug!(
            restored = plan.restored.len(),
            added = plan.added.len(),
            "registration planned"
        );

        let scheduler = Arc::new(PollingScheduler::new(
            Arc::clone(&self.inner.cache),
            Arc::clone(&self.inner.gateway),
            sink,
        ));
        for registration in plan.restored.iter().chain(&plan.added) {
            scheduler
                .register(Arc::clone(&registration.descriptor))
                .await;
        }

        let previous = self.inner.scheduler.lock().await.replace(scheduler);
        if let Some(previous) = previous {
            previous.shutdown().await;
        }
        plan
    }

    /// Stop all pollers and feed countdowns.
    pub async fn shutdown(&self) {
        let scheduler = self.inner.scheduler.lock().await.take();
        if let Some(scheduler) = scheduler {
            scheduler.shutdown().await;
        }
        debug!("controller shut down");
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn probe_value(&self, descriptor: &DeviceDescriptor) -> f64 {
        self.inner.cache.probe_value(descriptor).await
    }

    pub async fn outlet_state(&self, descriptor: &DeviceDescriptor, auto_off_shows_on: bool) -> i8 {
        self.inner
            .cache
            .outlet_state(descriptor, auto_off_shows_on)
            .await
    }

    /// The value a poller would publish for this device right now.
    pub async fn reading(&self, descriptor: &DeviceDescriptor) -> Option<Reading> {
        read_device(&self.inner.cache, descriptor).await
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn set_outlet_state(&self, descriptor: &DeviceDescriptor, command: OutletCommand) {
        self.inner.gateway.set_outlet(descriptor, command).await;
    }

    pub async fn toggle_outlet(&self, descriptor: &DeviceDescriptor, currently_on: bool) {
        self.inner
            .gateway
            .toggle_outlet(descriptor, currently_on)
            .await;
    }

    pub async fn update_feed_mode(&self, mode: FeedMode, is_active: bool) -> FeedState {
        self.inner.gateway.update_feed_mode(mode, is_active).await
    }

    /// Toggle a feed mode through the running scheduler, which owns the
    /// local countdown.
    pub async fn activate_feed(
        &self,
        descriptor: Arc<DeviceDescriptor>,
    ) -> Result<FeedState, CoreError> {
        let scheduler = self.inner.scheduler.lock().await.clone();
        let scheduler = scheduler.ok_or_else(|| {
            CoreError::Internal("feed activation before the scheduler was started".into())
        })?;
        Ok(scheduler.activate_feed(descriptor).await)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
