//! Notification hub: fans status updates out to connected watchers
//!
//! Broadcasting never waits on a watcher. A watcher whose queue is full is
//! dropped and its queue closed.

mod actor;
mod commands;

pub use commands::{Message, WatcherId};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::obs::{ObsAdapter, ObsStatus};
use commands::HubCommand;

/// Messages pushed to watchers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HubEvent {
    StatusUpdate(ObsStatus),
}

/// A registered watcher's end of its outbound queue
pub struct Subscription {
    pub id: WatcherId,
    pub receiver: mpsc::Receiver<Message>,
}

#[derive(Clone)]
pub struct HubHandle {
    command_tx: mpsc::UnboundedSender<HubCommand>,
    next_id: Arc<AtomicU64>,
    watcher_queue: usize,
}

impl HubHandle {
    fn new(command_tx: mpsc::UnboundedSender<HubCommand>, watcher_queue: usize) -> Self {
        Self {
            command_tx,
            next_id: Arc::new(AtomicU64::new(1)),
            watcher_queue: watcher_queue.max(1),
        }
    }

    /// Spawn the hub actor; each watcher gets a queue of `watcher_queue` messages
    pub fn spawn(watcher_queue: usize) -> Self {
        actor::HubActor::spawn(watcher_queue)
    }

    /// Register a new watcher
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (queue, receiver) = mpsc::channel(self.watcher_queue);
        let _ = self.command_tx.send(HubCommand::Register { id, queue });
        Subscription { id, receiver }
    }

    pub fn unregister(&self, id: WatcherId) {
        let _ = self.command_tx.send(HubCommand::Unregister { id });
    }

    /// Serialize `event` once and queue it for every watcher
    pub fn broadcast(&self, event: &HubEvent) {
        match serde_json::to_string(event) {
            Ok(text) => {
                let _ = self.command_tx.send(HubCommand::Broadcast {
                    message: Arc::from(text),
                });
            }
            Err(e) => error!("Failed to encode hub event: {}", e),
        }
    }

    pub fn broadcast_status(&self, status: ObsStatus) {
        self.broadcast(&HubEvent::StatusUpdate(status));
    }

    pub async fn watcher_count(&self) -> usize {
        let (response, rx) = oneshot::channel();
        if self.command_tx.send(HubCommand::WatcherCount { response }).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

/// Query OBS and broadcast the result from a background task
pub fn spawn_status_refresh(obs: Arc<ObsAdapter>, hub: HubHandle) {
    tokio::spawn(async move {
        match obs.get_status().await {
            Ok(status) => hub.broadcast_status(status),
            Err(e) => debug!("Skipping status broadcast: {}", e),
        }
    });
}
