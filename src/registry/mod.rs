//! In-memory registries mirrored to the blob store
//!
//! Each registry owns one collection behind a single coarse lock. Mutations
//! are applied to a candidate copy, persisted, and only then swapped in, so a
//! failed write never leaks into what later reads observe.

mod buttons;
mod configurations;
mod sessions;

pub use buttons::ButtonLibrary;
pub use configurations::ConfigRegistry;
pub use sessions::{spawn_session_sweeper, SessionRegistry};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::storage::BlobStore;

/// Something stored in a `Collection`, keyed by its id
pub(crate) trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync {
    fn key(&self) -> &str;
}

/// Write-through map of entities persisted as one JSON array
pub(crate) struct Collection<T: Entity> {
    document: &'static str,
    store: Arc<dyn BlobStore>,
    items: RwLock<HashMap<String, T>>,
}

impl<T: Entity> Collection<T> {
    /// Load the collection from its document (empty when absent)
    pub fn load(store: Arc<dyn BlobStore>, document: &'static str) -> Result<Self> {
        let items: Vec<T> = store.load_json(document)?.unwrap_or_default();
        debug!("Loaded {} entries from '{}'", items.len(), document);

        let items = items
            .into_iter()
            .map(|item| (item.key().to_string(), item))
            .collect();

        Ok(Self {
            document,
            store,
            items: RwLock::new(items),
        })
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.items.read().get(key).cloned()
    }

    pub fn values(&self) -> Vec<T> {
        self.items.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Find the first entity matching `predicate`
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.items.read().values().find(|v| predicate(v)).cloned()
    }

    /// Apply `mutation` to a candidate copy, persist it, then commit
    ///
    /// If `mutation` fails nothing is written. If the write fails the
    /// in-memory state is left as it was.
    pub fn mutate<R>(&self, mutation: impl FnOnce(&mut HashMap<String, T>) -> Result<R>) -> Result<R> {
        let mut items = self.items.write();
        let mut candidate = items.clone();

        let out = mutation(&mut candidate)?;

        let snapshot: Vec<&T> = candidate.values().collect();
        self.store.save_json(self.document, &snapshot)?;

        *items = candidate;
        Ok(out)
    }
}
