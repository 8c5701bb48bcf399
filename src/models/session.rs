use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side record binding a client identity to a configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSession {
    /// Bearer credential returned to the client
    pub session_id: String,
    /// Stable caller-supplied identity (usually derived from the hostname)
    pub client_id: String,
    pub client_name: String,
    pub config_id: String,
    pub ip_address: String,
    pub last_connected: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}
