use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use vp_relay_interface::StateSnapshot;

/// Something that receives debounced snapshots.
///
/// Delivery must not block: the channel task calls this inline.
pub trait SnapshotSink: Send + Sync + 'static {
    fn deliver(&self, snapshot: Arc<StateSnapshot>);
}

impl SnapshotSink for broadcast::Sender<Arc<StateSnapshot>> {
    fn deliver(&self, snapshot: Arc<StateSnapshot>) {
        // No subscribers is fine; the pop-out may not be open.
        let _ = self.send(snapshot);
    }
}

impl SnapshotSink for mpsc::UnboundedSender<Arc<StateSnapshot>> {
    fn deliver(&self, snapshot: Arc<StateSnapshot>) {
        if self.send(snapshot).is_err() {
            tracing::debug!("snapshot_sink_closed");
        }
    }
}
