//! Error taxonomy shared by the registries, the OBS adapter and the API layer.

use std::fmt;

use crate::storage::StoreError;

/// Convenience alias used across the library
pub type Result<T, E = DeckError> = std::result::Result<T, E>;

/// Kind of entity a `NotFound` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Button,
    Configuration,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Button => f.write_str("button"),
            EntityKind::Configuration => f.write_str("configuration"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("no default configuration set")]
    NoDefaultConfigured,

    #[error("missing {0} parameter")]
    MissingParameter(String),

    #[error("invalid {field} parameter: expected {expected}")]
    InvalidParameterType {
        field: String,
        expected: &'static str,
    },

    #[error("unknown action type: {0}")]
    UnknownAction(String),

    #[error("not connected to OBS")]
    NotConnected,

    /// OBS rejected or failed a call; the message is kept verbatim
    #[error("{0}")]
    Upstream(String),

    #[error("missing X-Session-ID header")]
    MissingSessionHeader,

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl DeckError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        DeckError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl From<obws::Error> for DeckError {
    fn from(err: obws::Error) -> Self {
        DeckError::Upstream(err.to_string())
    }
}
