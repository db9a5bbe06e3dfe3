//! In-process pub/sub for [`SyncRunSnapshot`]s.
//!
//! Publishing never waits on subscribers. A subscriber that falls behind
//! skips the snapshots it missed and continues with the newest ones.

use almanac_core::StatusBroadcaster;
use almanac_domain::{AlmanacError, Result as DomainResult, SyncRunSnapshot};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::trace;
use uuid::Uuid;

/// Channel name observers use for a single run.
pub fn channel_name(run_id: Uuid) -> String {
    format!("sync_run:{run_id}")
}

/// [`StatusBroadcaster`] backed by a tokio broadcast channel.
#[derive(Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<SyncRunSnapshot>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Every snapshot published after this call.
    pub fn subscribe(&self) -> BoxStream<'static, SyncRunSnapshot> {
        let receiver = self.sender.subscribe();
        stream::unfold(receiver, |mut receiver| async move {
            next_snapshot(&mut receiver, |_| true).await.map(|snapshot| (snapshot, receiver))
        })
        .boxed()
    }

    /// Snapshots of one run, ending right after its terminal snapshot.
    pub fn subscribe_run(&self, run_id: Uuid) -> BoxStream<'static, SyncRunSnapshot> {
        let receiver = self.sender.subscribe();
        stream::unfold((receiver, false), move |(mut receiver, finished)| async move {
            if finished {
                return None;
            }
            let snapshot = next_snapshot(&mut receiver, |s| s.run_id == run_id).await?;
            let finished = snapshot.status.is_terminal();
            Some((snapshot, (receiver, finished)))
        })
        .boxed()
    }
}

/// Next snapshot accepted by `wanted`, skipping over lag.
async fn next_snapshot(
    receiver: &mut broadcast::Receiver<SyncRunSnapshot>,
    wanted: impl Fn(&SyncRunSnapshot) -> bool,
) -> Option<SyncRunSnapshot> {
    loop {
        match receiver.recv().await {
            Ok(snapshot) if wanted(&snapshot) => return Some(snapshot),
            Ok(_) => {}
            Err(RecvError::Closed) => return None,
            Err(RecvError::Lagged(skipped)) => {
                trace!(skipped, "progress subscriber lagged");
            }
        }
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(almanac_domain::config::SyncConfig::default().broadcast_capacity)
    }
}

impl StatusBroadcaster for ChannelBroadcaster {
    fn publish(&self, snapshot: SyncRunSnapshot) -> DomainResult<()> {
        let channel = channel_name(snapshot.run_id);
        self.sender.send(snapshot).map(|_| ()).map_err(|_| {
            AlmanacError::Internal(format!("no subscribers on {channel}"))
        })
    }
}

/// Drops every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBroadcaster;

impl StatusBroadcaster for NoopBroadcaster {
    fn publish(&self, _snapshot: SyncRunSnapshot) -> DomainResult<()> {
        Ok(())
    }
}
