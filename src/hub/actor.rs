//! HubActor - owns the watcher set
//!
//! All mutations of the set arrive as `HubCommand`s, so the broadcaster and
//! the WebSocket handlers never share a lock.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::commands::{HubCommand, Message, WatcherId};
use super::HubHandle;

pub(super) struct HubActor {
    watchers: HashMap<WatcherId, mpsc::Sender<Message>>,
    command_rx: mpsc::UnboundedReceiver<HubCommand>,
}

impl HubActor {
    pub(super) fn spawn(watcher_queue: usize) -> HubHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let actor = Self {
            watchers: HashMap::new(),
            command_rx,
        };
        tokio::spawn(actor.run());
        HubHandle::new(command_tx, watcher_queue)
    }

    async fn run(mut self) {
        debug!("Hub run loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                HubCommand::Register { id, queue } => {
                    self.watchers.insert(id, queue);
                    debug!("Watcher {} registered ({} total)", id, self.watchers.len());
                }
                HubCommand::Unregister { id } => {
                    if self.watchers.remove(&id).is_some() {
                        debug!("Watcher {} unregistered ({} left)", id, self.watchers.len());
                    }
                }
                HubCommand::Broadcast { message } => self.broadcast(message),
                HubCommand::WatcherCount { response } => {
                    let _ = response.send(self.watchers.len());
                }
            }
        }

        debug!("Hub run loop terminated");
    }

    fn broadcast(&mut self, message: Message) {
        self.watchers.retain(|id, queue| match queue.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Watcher {} is not keeping up, dropping it", id);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Watcher {} went away", id);
                false
            }
        });
    }
}
