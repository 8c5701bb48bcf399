use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

/// Identifier assigned to each watcher by the handle
pub type WatcherId = u64;

/// Serialized message, shared between all watcher queues
pub type Message = Arc<str>;

/// Commands for the hub actor
pub enum HubCommand {
    /// Add a watcher and its outbound queue
    Register {
        id: WatcherId,
        queue: mpsc::Sender<Message>,
    },

    /// Remove a watcher; dropping its queue sender closes the queue
    Unregister { id: WatcherId },

    /// Deliver to every watcher, dropping those whose queue is full
    Broadcast { message: Message },

    WatcherCount { response: oneshot::Sender<usize> },
}
