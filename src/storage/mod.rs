//! Blob store for persisted collections
//!
//! Every entity collection (buttons, configurations, sessions, OBS credentials)
//! is one named JSON document, rewritten wholesale on each mutation.

mod json_file;
mod memory;
mod sled_store;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sled_store::SledStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

/// Document holding the button library
pub const BUTTONS_DOC: &str = "buttons";
/// Document holding the configurations
pub const CONFIGS_DOC: &str = "configs";
/// Document holding client sessions
pub const SESSIONS_DOC: &str = "sessions";
/// Document holding the saved OBS credentials
pub const OBS_CONFIG_DOC: &str = "obs_config";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error on '{document}': {source}")]
    Io {
        document: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document '{document}': {source}")]
    Json {
        document: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("sled error on '{document}': {source}")]
    Sled {
        document: String,
        #[source]
        source: sled::Error,
    },

    #[error("write rejected for '{0}'")]
    Rejected(String),
}

/// Key -> document storage
///
/// Implementations must make `save` all-or-nothing: a reader never observes a
/// half-written document.
pub trait BlobStore: Send + Sync {
    /// Load a raw document, `None` when it was never written (or is empty)
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace a raw document
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

impl<'a> dyn BlobStore + 'a {
    /// Load and decode a JSON document
    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let Some(bytes) = self.load(name)? else {
            return Ok(None);
        };

        let value = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            document: name.to_string(),
            source,
        })?;
        Ok(Some(value))
    }

    /// Encode and write a JSON document
    pub fn save_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            document: name.to_string(),
            source,
        })?;
        trace!("Persisting '{}' ({} bytes)", name, bytes.len());
        self.save(name, &bytes)
    }
}
