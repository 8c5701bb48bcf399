//! OBS control-plane adapter
//!
//! Holds at most one live connection. Connect and disconnect take the write
//! lock; every other operation clones the handle under the read lock and
//! talks to OBS without holding it.

mod actions;
mod connection;
mod credentials;
mod status;

#[cfg(test)]
pub(crate) mod fake;

pub use actions::{volume_multiplier, ObsCommand, Switch};
pub use connection::{
    ObsChange, ObsConnection, ObsConnector, ObsEndpoint, Output, OutputControl, RecordState,
    WebSocketConnector, DEFAULT_PORT,
};
pub use credentials::ObsCredentials;
pub use status::{LiveStatus, ObsStatus};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{DeckError, Result};
use crate::models::ButtonAction;

/// Callback invoked for every upstream change
pub type ChangeListener = Arc<dyn Fn(&ObsChange) + Send + Sync>;

struct ActiveConnection {
    handle: Arc<dyn ObsConnection>,
    url: String,
    events: Option<JoinHandle<()>>,
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        if let Some(task) = self.events.take() {
            task.abort();
        }
    }
}

pub struct ObsAdapter {
    connector: Arc<dyn ObsConnector>,
    active: RwLock<Option<ActiveConnection>>,
    request_timeout: Duration,
    listeners: Arc<parking_lot::RwLock<Vec<ChangeListener>>>,
}

impl ObsAdapter {
    pub fn new(connector: Arc<dyn ObsConnector>, request_timeout: Duration) -> Self {
        Self {
            connector,
            active: RwLock::new(None),
            request_timeout,
            listeners: Arc::new(parking_lot::RwLock::new(Vec::new())),
        }
    }

    /// Connect to `url`, replacing any existing connection
    ///
    /// The previous connection is dropped first, so a failed attempt leaves
    /// the adapter disconnected.
    pub async fn connect(&self, url: &str, password: Option<&str>) -> Result<()> {
        let endpoint = ObsEndpoint::parse(url)?;

        let mut active = self.active.write().await;
        if let Some(previous) = active.take() {
            info!("Closing OBS connection to {}", previous.url);
        }

        let handle = self
            .bounded(self.connector.connect(&endpoint, password))
            .await
            .map_err(|e| {
                warn!("⚠️  OBS connection to {} failed: {}", endpoint, e);
                e
            })?;
        let events = self.spawn_change_forwarder(&handle);

        *active = Some(ActiveConnection {
            handle,
            url: url.trim().to_string(),
            events,
        });

        info!("✅ Connected to OBS at {}", endpoint);
        Ok(())
    }

    /// Drop the connection if there is one
    pub async fn disconnect(&self) {
        if let Some(previous) = self.active.write().await.take() {
            info!("🔌 Disconnected from OBS at {}", previous.url);
        }
    }

    /// Whether a connection handle is held (not whether OBS still answers)
    pub async fn is_connected(&self) -> bool {
        self.active.read().await.is_some()
    }

    pub async fn url(&self) -> Option<String> {
        self.active.read().await.as_ref().map(|a| a.url.clone())
    }

    /// Register a callback for upstream state changes
    pub fn subscribe_changes(&self, listener: impl Fn(&ObsChange) + Send + Sync + 'static) {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Validate and run a button action
    ///
    /// Parameters are checked before the connection, so a malformed action
    /// reports the same error whether or not OBS is reachable.
    pub async fn execute_action(&self, action: &ButtonAction) -> Result<()> {
        let command = ObsCommand::parse(action)?;
        let obs = self.connection().await?;
        self.bounded(command.run(obs.as_ref())).await
    }

    /// Current OBS state; `{connected: false}` when there is no connection
    pub async fn get_status(&self) -> Result<ObsStatus> {
        let Some(obs) = self.try_connection().await else {
            return Ok(ObsStatus::offline());
        };
        let obs = obs.as_ref();

        let streaming = self.bounded(obs.output_active(Output::Stream)).await?;
        let record = self.bounded(obs.record_state()).await?;
        let current_scene = self.bounded(obs.current_program_scene()).await?;

        let mut unavailable = Vec::new();
        let virtual_cam_active = self
            .best_effort("virtual_cam_active", obs.output_active(Output::VirtualCam), &mut unavailable)
            .await;
        let replay_buffer_active = self
            .best_effort("replay_buffer_active", obs.output_active(Output::ReplayBuffer), &mut unavailable)
            .await;
        let studio_mode_active = self
            .best_effort("studio_mode_active", obs.studio_mode_enabled(), &mut unavailable)
            .await;

        Ok(ObsStatus::online(LiveStatus {
            streaming,
            recording: record.active,
            recording_paused: record.paused,
            current_scene,
            virtual_cam_active,
            replay_buffer_active,
            studio_mode_active,
            unavailable,
        }))
    }

    pub async fn get_scenes(&self) -> Result<Vec<String>> {
        let obs = self.connection().await?;
        self.bounded(obs.scene_names()).await
    }

    pub async fn get_inputs(&self) -> Result<Vec<String>> {
        let obs = self.connection().await?;
        self.bounded(obs.input_names()).await
    }

    pub async fn get_source_visibility(&self, scene: &str, source: &str) -> Result<bool> {
        let obs = self.connection().await?;
        self.bounded(async {
            let item_id = obs.scene_item_id(scene, source).await?;
            obs.scene_item_enabled(scene, item_id).await
        })
        .await
    }

    async fn try_connection(&self) -> Option<Arc<dyn ObsConnection>> {
        self.active.read().await.as_ref().map(|a| Arc::clone(&a.handle))
    }

    async fn connection(&self) -> Result<Arc<dyn ObsConnection>> {
        self.try_connection().await.ok_or(DeckError::NotConnected)
    }

    /// Bound an upstream call by the request timeout
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DeckError::Upstream(format!(
                "OBS did not answer within {} ms",
                self.request_timeout.as_millis()
            ))),
        }
    }

    async fn best_effort(
        &self,
        field: &str,
        call: impl Future<Output = Result<bool>>,
        unavailable: &mut Vec<String>,
    ) -> bool {
        match self.bounded(call).await {
            Ok(value) => value,
            Err(e) => {
                debug!("OBS status field {} unavailable: {}", field, e);
                unavailable.push(field.to_string());
                false
            }
        }
    }

    fn spawn_change_forwarder(&self, obs: &Arc<dyn ObsConnection>) -> Option<JoinHandle<()>> {
        let mut changes = match obs.changes() {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to subscribe to OBS events: {}", e);
                return None;
            }
        };
        let listeners = Arc::clone(&self.listeners);

        Some(tokio::spawn(async move {
            while let Some(change) = changes.next().await {
                debug!("OBS change: {:?}", change);
                let current: Vec<ChangeListener> = listeners.read().clone();
                for listener in current {
                    listener(&change);
                }
            }
            debug!("OBS event stream ended");
        }))
    }
}
