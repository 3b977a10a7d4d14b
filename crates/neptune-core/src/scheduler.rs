// ── Polling scheduler ──
//
// One independent poller per registered probe or outlet. Each poller
// sleeps for a period redrawn every tick from `ttl ± jitter`, so pollers
// sharing a TTL drift apart instead of hitting the controller together.
//
// Feed modes are not polled. Activating one starts a local countdown;
// when it runs out the sink hears the mode went off and nothing is sent
// to the controller. Activating it again while it runs cancels both the
// countdown and the feed cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::descriptor::{DeviceDescriptor, DeviceKind};
use crate::gateway::{CommandGateway, FeedState};
use crate::sink::{Reading, ReadingSink};
use crate::store::StatusCache;

/// Floor for a drawn poll period, for configurations where the jitter is
/// as wide as the TTL.
pub const MIN_POLL_PERIOD: Duration = Duration::from_secs(1);

struct FeedTimer {
    cancel: CancellationToken,
}

type FeedTimers = Arc<Mutex<HashMap<String, FeedTimer>>>;

pub struct PollingScheduler {
    cache: Arc<StatusCache>,
    gateway: Arc<CommandGateway>,
    sink: Arc<dyn ReadingSink>,
    feeds: FeedTimers,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PollingScheduler {
    pub fn new(
        cache: Arc<StatusCache>,
        gateway: Arc<CommandGateway>,
        sink: Arc<dyn ReadingSink>,
    ) -> Self {
        Self {
            cache,
            gateway,
            sink,
            feeds: Arc::new(Mutex::new(HashMap::new())),
            cancel: CancellationToken::new(),
            task_handles: Mutex::new(Vec::new()),
        }
    }

    /// Start polling a probe or outlet. Feed descriptors need no poller
    /// and are accepted as a no-op.
    pub async fn register(&self, descriptor: Arc<DeviceDescriptor>) {
        if descriptor.kind() == DeviceKind::Feed {
            debug!(feed = descriptor.name(), "feed mode registered, not polled");
            return;
        }

        let refresh = self.cache.refresh_config();
        let base = refresh.ttl_for(descriptor.kind());
        let jitter = refresh.jitter;
        info!(
            kind = %descriptor.kind(),
            device = descriptor.name(),
            base_secs = base.as_secs(),
            "polling device"
        );

        let handle = tokio::spawn(poll_task(
            Arc::clone(&self.cache),
            Arc::clone(&self.sink),
            descriptor,
            base,
            jitter,
            self.cancel.clone(),
        ));
        self.task_handles.lock().await.push(handle);
    }

    /// Toggle a feed mode. Starts the cycle and its countdown when idle;
    /// cancels both when already running.
    ///
    /// Non-feed descriptors are rejected with a warning and leave nothing
    /// running.
    pub async fn activate_feed(&self, descriptor: Arc<DeviceDescriptor>) -> FeedState {
        let (Some(mode), Some(duration)) = (descriptor.feed_mode(), descriptor.feed_duration())
        else {
            warn!(device = descriptor.name(), "not a feed mode, ignoring activation");
            return FeedState::Inactive;
        };

        // The timer map is settled before the command goes out, so a slow
        // controller never holds up other feeds or `is_feed_active`.
        let mut feeds = self.feeds.lock().await;
        if let Some(timer) = feeds.remove(descriptor.id()) {
            // Cancelled under the lock so a racing expiry sees it.
            timer.cancel.cancel();
            drop(feeds);
            debug!(feed = descriptor.name(), "feed timer cleared");
            return self.gateway.update_feed_mode(mode, true).await;
        }

        let cancel = self.cancel.child_token();
        feeds.insert(
            descriptor.id().to_owned(),
            FeedTimer {
                cancel: cancel.clone(),
            },
        );
        drop(feeds);

        debug!(
            feed = descriptor.name(),
            secs = duration.as_secs(),
            "feed timer started"
        );
        tokio::spawn(feed_expiry_task(
            Arc::clone(&self.feeds),
            Arc::clone(&self.sink),
            descriptor,
            duration,
            cancel,
        ));
        self.gateway.update_feed_mode(mode, false).await
    }

    pub async fn is_feed_active(&self, feed_id: &str) -> bool {
        self.feeds.lock().await.contains_key(feed_id)
    }

    /// Stop every poller and pending feed countdown. Countdowns are
    /// dropped without notifying the sink.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let mut handles = self.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        self.feeds.lock().await.clear();
        debug!("scheduler stopped");
    }
}

/// Current sink value for a probe or outlet, `None` for feed modes.
pub async fn read_device(cache: &StatusCache, descriptor: &DeviceDescriptor) -> Option<Reading> {
    match descriptor.kind() {
        DeviceKind::Probe => {
            let raw = cache.probe_value(descriptor).await;
            Some(Reading::Probe(descriptor.display_value(raw)))
        }
        DeviceKind::Outlet => {
            let state = cache
                .outlet_state(descriptor, descriptor.auto_off_shows_on())
                .await;
            Some(Reading::Outlet(state))
        }
        DeviceKind::Feed => None,
    }
}

/// Draw the next poll period uniformly from `base ± jitter`, floored at
/// [`MIN_POLL_PERIOD`].
pub fn next_poll_period(base: Duration, jitter: Duration) -> Duration {
    let lo = base.saturating_sub(jitter).max(MIN_POLL_PERIOD);
    let hi = base.saturating_add(jitter).max(lo);
    let lo_ms = u64::try_from(lo.as_millis()).unwrap_or(u64::MAX);
    let hi_ms = u64::try_from(hi.as_millis()).unwrap_or(u64::MAX);
    if lo_ms >= hi_ms {
        return lo;
    }
    Duration::from_millis(rand::random_range(lo_ms..=hi_ms))
}

async fn poll_task(
    cache: Arc<StatusCache>,
    sink: Arc<dyn ReadingSink>,
    descriptor: Arc<DeviceDescriptor>,
    base: Duration,
    jitter: Duration,
    cancel: CancellationToken,
) {
    loop {
        let period = next_poll_period(base, jitter);
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(period) => {
                let reading = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    reading = read_device(&cache, &descriptor) => reading,
                };
                if let Some(reading) = reading {
                    trace!(device = descriptor.name(), ?reading, "poll");
                    sink.publish(&descriptor, reading);
                }
            }
        }
    }
}

async fn feed_expiry_task(
    feeds: FeedTimers,
    sink: Arc<dyn ReadingSink>,
    descriptor: Arc<DeviceDescriptor>,
    duration: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        () = tokio::time::sleep(duration) => {}
    }

    let mut feeds = feeds.lock().await;
    // An activation may have cleared this timer while we waited for the lock.
    if cancel.is_cancelled() {
        return;
    }
    feeds.remove(descriptor.id());
    drop(feeds);

    info!(feed = descriptor.name(), "feed mode timed out");
    sink.publish(&descriptor, Reading::FeedActive(false));
}
