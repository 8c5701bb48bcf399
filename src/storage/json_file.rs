//! JSON files on disk, one `<name>.json` per document

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BlobStore, StoreError};

/// File-backed store rooted at a data directory
///
/// Writes land in `<name>.json.tmp` first and are renamed over the target, so
/// a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if !dir.exists() {
            debug!("Creating data directory: {}", dir.display());
            std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
                document: dir.display().to_string(),
                source,
            })?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl BlobStore for JsonFileStore {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(name);
        match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                document: name.to_string(),
                source,
            }),
        }
    }

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.path_for(name);
        let tmp = self.dir.join(format!("{}.json.tmp", name));
        let io_err = |source| StoreError::Io {
            document: name.to_string(),
            source,
        };

        std::fs::write(&tmp, bytes).map_err(io_err)?;
        std::fs::rename(&tmp, &target).map_err(io_err)?;
        Ok(())
    }
}
