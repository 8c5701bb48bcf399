//! Saved OBS connection settings (`obs_config` document)

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{BlobStore, OBS_CONFIG_DOC};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObsCredentials {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ObsCredentials {
    pub fn new(url: impl Into<String>, password: Option<String>) -> Self {
        Self {
            url: url.into(),
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn load(store: &dyn BlobStore) -> Result<Option<Self>> {
        Ok(store.load_json(OBS_CONFIG_DOC)?)
    }

    pub fn save(&self, store: &dyn BlobStore) -> Result<()> {
        Ok(store.save_json(OBS_CONFIG_DOC, self)?)
    }
}
