//! Debounced snapshot fan-out.
//!
//! The host publishes a fresh [`StateSnapshot`] after every change. Two
//! channels, one for same-process views and one for the network relay, each
//! collapse bursts of changes into a single delivery of the newest snapshot
//! once their window has been quiet. [`FanOut::flush`] delivers on both
//! channels right away and still restarts the windows.

mod channel;
mod sink;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use vp_relay_interface::StateSnapshot;

use channel::{Channel, Trigger};
pub use sink::SnapshotSink;

#[derive(Debug, Clone)]
pub struct FanOutConfig {
    pub local_window: Duration,
    pub remote_window: Duration,
    pub local_capacity: usize,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            local_window: Duration::from_millis(80),
            remote_window: Duration::from_millis(120),
            local_capacity: 64,
        }
    }
}

impl FanOutConfig {
    pub fn with_local_window(mut self, window: Duration) -> Self {
        self.local_window = window;
        self
    }

    pub fn with_remote_window(mut self, window: Duration) -> Self {
        self.remote_window = window;
        self
    }
}

pub struct FanOut {
    latest: watch::Sender<Option<Arc<StateSnapshot>>>,
    local_bus: broadcast::Sender<Arc<StateSnapshot>>,
    local: Channel,
    remote: Option<Channel>,
    cancel: CancellationToken,
}

impl FanOut {
    /// Start both channel tasks on the current tokio runtime. Without a
    /// remote sink only the local channel runs.
    pub fn spawn(config: FanOutConfig, remote: Option<Arc<dyn SnapshotSink>>) -> Self {
        let cancel = CancellationToken::new();
        let (latest, _) = watch::channel(None);
        let (local_bus, _) = broadcast::channel(config.local_capacity.max(1));

        let local = Channel::spawn(
            "local",
            config.local_window,
            latest.subscribe(),
            Arc::new(local_bus.clone()),
            cancel.child_token(),
        );
        let remote = remote.map(|sink| {
            Channel::spawn(
                "remote",
                config.remote_window,
                latest.subscribe(),
                sink,
                cancel.child_token(),
            )
        });

        Self {
            latest,
            local_bus,
            local,
            remote,
            cancel,
        }
    }

    /// Record `snapshot` as the newest state and restart both windows.
    pub fn publish(&self, snapshot: StateSnapshot) {
        self.latest.send_replace(Some(Arc::new(snapshot)));
        self.trigger(Trigger::Schedule);
    }

    /// Record `snapshot` and deliver it on both channels immediately.
    pub fn flush(&self, snapshot: StateSnapshot) {
        self.latest.send_replace(Some(Arc::new(snapshot)));
        self.trigger(Trigger::Flush);
    }

    pub fn current(&self) -> Option<Arc<StateSnapshot>> {
        self.latest.borrow().clone()
    }

    pub fn latest(&self) -> watch::Receiver<Option<Arc<StateSnapshot>>> {
        self.latest.subscribe()
    }

    /// Join the local event bus. The current snapshot is returned alongside
    /// the receiver so a newly opened view can render before the next
    /// emission.
    pub fn subscribe_local(
        &self,
    ) -> (
        Option<Arc<StateSnapshot>>,
        broadcast::Receiver<Arc<StateSnapshot>>,
    ) {
        let rx = self.local_bus.subscribe();
        (self.current(), rx)
    }

    fn trigger(&self, trigger: Trigger) {
        self.local.trigger(trigger);
        if let Some(remote) = &self.remote {
            remote.trigger(trigger);
        }
    }
}

impl Drop for FanOut {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
