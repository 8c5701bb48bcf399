//! Sled-backed document store
//!
//! Each document is a single sled key under a fixed prefix; sled's atomic
//! single-key insert gives the same all-or-nothing guarantee as the file store.

use tracing::info;

use super::{BlobStore, StoreError};

/// Prefix for document keys in the sled database
const DOCUMENT_PREFIX: &str = "doc:";

pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) a sled database at `path`
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|source| StoreError::Sled {
            document: path.display().to_string(),
            source,
        })?;
        info!("Opened sled store at {}", path.display());
        Ok(Self { db })
    }

    /// Wrap an already opened database
    pub fn new(db: sled::Db) -> Self {
        Self { db }
    }

    fn key(name: &str) -> String {
        format!("{}{}", DOCUMENT_PREFIX, name)
    }
}

impl BlobStore for SledStore {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self
            .db
            .get(Self::key(name).as_bytes())
            .map_err(|source| StoreError::Sled {
                document: name.to_string(),
                source,
            })?;
        Ok(value.filter(|v| !v.is_empty()).map(|v| v.to_vec()))
    }

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let sled_err = |source| StoreError::Sled {
            document: name.to_string(),
            source,
        };
        self.db
            .insert(Self::key(name).as_bytes(), bytes)
            .map_err(sled_err)?;
        self.db.flush().map_err(sled_err)?;
        Ok(())
    }
}
