use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use vp_relay_interface::StateSnapshot;

use crate::SnapshotSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    /// Restart the debounce timer.
    Schedule,
    /// Emit now, then restart the debounce timer.
    Flush,
}

/// Handle to one debounced output channel running on its own task.
pub(crate) struct Channel {
    tx: mpsc::UnboundedSender<Trigger>,
}

impl Channel {
    pub(crate) fn spawn(
        name: &'static str,
        window: Duration,
        latest: watch::Receiver<Option<Arc<StateSnapshot>>>,
        sink: Arc<dyn SnapshotSink>,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(name, window, latest, sink, rx, cancel));
        Self { tx }
    }

    pub(crate) fn trigger(&self, trigger: Trigger) {
        let _ = self.tx.send(trigger);
    }
}

async fn run(
    name: &'static str,
    window: Duration,
    latest: watch::Receiver<Option<Arc<StateSnapshot>>>,
    sink: Arc<dyn SnapshotSink>,
    mut rx: mpsc::UnboundedReceiver<Trigger>,
    cancel: CancellationToken,
) {
    let mut deadline: Option<Instant> = None;

    let emit = |reason: &'static str| {
        let snapshot = latest.borrow().clone();
        if let Some(snapshot) = snapshot {
            tracing::trace!(channel = name, reason, position = snapshot.position, "fanout_emit");
            sink.deliver(snapshot);
        }
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            trigger = rx.recv() => match trigger {
                Some(Trigger::Schedule) => {
                    deadline = Some(Instant::now() + window);
                }
                Some(Trigger::Flush) => {
                    emit("flush");
                    deadline = Some(Instant::now() + window);
                }
                None => break,
            },
            _ = sleep_until(deadline), if deadline.is_some() => {
                deadline = None;
                emit("debounce");
            }
        }
    }

    tracing::debug!(channel = name, "fanout_channel_stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
