//! OBS capability traits and their obws-backed implementation
//!
//! The adapter only ever talks to `ObsConnection`, so everything above this
//! file is independent of the WebSocket client in use.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tracing::{debug, info};

use crate::error::{DeckError, Result};

/// Default obs-websocket port
pub const DEFAULT_PORT: u16 = 4455;

/// OBS outputs that can be started and stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Stream,
    Record,
    VirtualCam,
    ReplayBuffer,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Output::Stream => "stream",
            Output::Record => "record",
            Output::VirtualCam => "virtual_cam",
            Output::ReplayBuffer => "replay_buffer",
        })
    }
}

/// Recording flags read from one GetRecordStatus response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordState {
    pub active: bool,
    pub paused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputControl {
    Start,
    Stop,
    Toggle,
}

/// Upstream state change that warrants a fresh status broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObsChange {
    Stream,
    Record,
    ProgramScene(String),
    StudioMode,
    VirtualCam,
    ReplayBuffer,
    ServerStopping,
}

/// Where to reach obs-websocket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsEndpoint {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl ObsEndpoint {
    /// Accepts `host`, `host:port`, `ws://host:port` and `wss://host:port`
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || DeckError::InvalidRequest(format!("invalid OBS url '{}'", url));

        let trimmed = url.trim();
        let (secure, rest) = if let Some(rest) = trimmed.strip_prefix("wss://") {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix("ws://") {
            (false, rest)
        } else {
            (false, trimmed)
        };
        let rest = rest.trim_end_matches('/');

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (rest, DEFAULT_PORT),
        };
        if host.is_empty() || host.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            port,
            secure,
        })
    }
}

impl fmt::Display for ObsEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "wss" } else { "ws" };
        write!(f, "{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Opens connections to OBS
#[async_trait]
pub trait ObsConnector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &ObsEndpoint,
        password: Option<&str>,
    ) -> Result<Arc<dyn ObsConnection>>;
}

/// Primitive requests against one live OBS connection
///
/// The connection closes when the last handle is dropped.
#[async_trait]
pub trait ObsConnection: Send + Sync {
    async fn control_output(&self, output: Output, control: OutputControl) -> Result<()>;
    async fn output_active(&self, output: Output) -> Result<bool>;

    async fn record_state(&self) -> Result<RecordState>;
    async fn pause_record(&self) -> Result<()>;
    async fn resume_record(&self) -> Result<()>;
    async fn save_replay_buffer(&self) -> Result<()>;

    async fn current_program_scene(&self) -> Result<String>;
    async fn set_program_scene(&self, scene: &str) -> Result<()>;
    async fn set_preview_scene(&self, scene: &str) -> Result<()>;
    async fn scene_names(&self) -> Result<Vec<String>>;

    async fn input_names(&self) -> Result<Vec<String>>;
    async fn set_input_muted(&self, input: &str, muted: bool) -> Result<()>;
    async fn toggle_input_mute(&self, input: &str) -> Result<()>;
    /// `multiplier` is linear, 0.0 to 1.0
    async fn set_input_volume(&self, input: &str, multiplier: f32) -> Result<()>;

    async fn scene_item_id(&self, scene: &str, source: &str) -> Result<i64>;
    async fn scene_item_enabled(&self, scene: &str, item_id: i64) -> Result<bool>;
    async fn set_scene_item_enabled(&self, scene: &str, item_id: i64, enabled: bool) -> Result<()>;

    async fn filter_enabled(&self, source: &str, filter: &str) -> Result<bool>;
    async fn set_filter_enabled(&self, source: &str, filter: &str, enabled: bool) -> Result<()>;

    async fn set_current_transition(&self, name: &str) -> Result<()>;
    async fn set_transition_duration(&self, duration: Duration) -> Result<()>;
    async fn trigger_transition(&self) -> Result<()>;

    async fn studio_mode_enabled(&self) -> Result<bool>;
    async fn set_studio_mode_enabled(&self, enabled: bool) -> Result<()>;

    /// Stream of upstream state changes for as long as the connection lives
    fn changes(&self) -> Result<BoxStream<'static, ObsChange>>;
}

/// Connector backed by the obws client
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl ObsConnector for WebSocketConnector {
    async fn connect(
        &self,
        endpoint: &ObsEndpoint,
        password: Option<&str>,
    ) -> Result<Arc<dyn ObsConnection>> {
        if endpoint.secure {
            return Err(DeckError::Upstream(format!(
                "{}: TLS endpoints are not supported, use ws://",
                endpoint
            )));
        }

        info!("🎬 Connecting to OBS at {}", endpoint);
        let client = obws::Client::connect(endpoint.host.as_str(), endpoint.port, password).await?;

        if let Ok(version) = client.general().version().await {
            debug!(
                "OBS {} / obs-websocket {}",
                version.obs_version, version.obs_web_socket_version
            );
        }

        Ok(Arc::new(WebSocketConnection { client }))
    }
}

struct WebSocketConnection {
    client: obws::Client,
}

#[async_trait]
impl ObsConnection for WebSocketConnection {
    async fn control_output(&self, output: Output, control: OutputControl) -> Result<()> {
        use OutputControl::*;

        match output {
            Output::Stream => {
                let streaming = self.client.streaming();
                match control {
                    Start => streaming.start().await?,
                    Stop => streaming.stop().await?,
                    Toggle => {
                        streaming.toggle().await?;
                    }
                }
            }
            Output::Record => {
                let recording = self.client.recording();
                match control {
                    Start => recording.start().await?,
                    Stop => {
                        recording.stop().await?;
                    }
                    Toggle => {
                        recording.toggle().await?;
                    }
                }
            }
            Output::VirtualCam => {
                let virtual_cam = self.client.virtual_cam();
                match control {
                    Start => virtual_cam.start().await?,
                    Stop => virtual_cam.stop().await?,
                    Toggle => {
                        virtual_cam.toggle().await?;
                    }
                }
            }
            Output::ReplayBuffer => {
                let replay = self.client.replay_buffer();
                match control {
                    Start => replay.start().await?,
                    Stop => replay.stop().await?,
                    Toggle => {
                        replay.toggle().await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn output_active(&self, output: Output) -> Result<bool> {
        let active = match output {
            Output::Stream => self.client.streaming().status().await?.active,
            Output::Record => self.client.recording().status().await?.active,
            Output::VirtualCam => self.client.virtual_cam().status().await?,
            Output::ReplayBuffer => self.client.replay_buffer().status().await?,
        };
        Ok(active)
    }

    async fn record_state(&self) -> Result<RecordState> {
        let status = self.client.recording().status().await?;
        Ok(RecordState {
            active: status.active,
            paused: status.paused,
        })
    }

    async fn pause_record(&self) -> Result<()> {
        Ok(self.client.recording().pause().await?)
    }

    async fn resume_record(&self) -> Result<()> {
        Ok(self.client.recording().resume().await?)
    }

    async fn save_replay_buffer(&self) -> Result<()> {
        Ok(self.client.replay_buffer().save().await?)
    }

    async fn current_program_scene(&self) -> Result<String> {
        Ok(self.client.scenes().current_program_scene().await?)
    }

    async fn set_program_scene(&self, scene: &str) -> Result<()> {
        Ok(self.client.scenes().set_current_program_scene(scene).await?)
    }

    async fn set_preview_scene(&self, scene: &str) -> Result<()> {
        Ok(self.client.scenes().set_current_preview_scene(scene).await?)
    }

    async fn scene_names(&self) -> Result<Vec<String>> {
        let scenes = self.client.scenes().list().await?;
        Ok(scenes.scenes.into_iter().map(|s| s.name).collect())
    }

    async fn input_names(&self) -> Result<Vec<String>> {
        let inputs = self.client.inputs().list(None).await?;
        Ok(inputs.into_iter().map(|i| i.name).collect())
    }

    async fn set_input_muted(&self, input: &str, muted: bool) -> Result<()> {
        Ok(self.client.inputs().set_muted(input, muted).await?)
    }

    async fn toggle_input_mute(&self, input: &str) -> Result<()> {
        self.client.inputs().toggle_mute(input).await?;
        Ok(())
    }

    async fn set_input_volume(&self, input: &str, multiplier: f32) -> Result<()> {
        use obws::requests::inputs::Volume;
        Ok(self
            .client
            .inputs()
            .set_volume(input, Volume::Mul(multiplier))
            .await?)
    }

    async fn scene_item_id(&self, scene: &str, source: &str) -> Result<i64> {
        use obws::requests::scene_items::Id;
        Ok(self
            .client
            .scene_items()
            .id(Id {
                scene,
                source,
                search_offset: None,
            })
            .await?)
    }

    async fn scene_item_enabled(&self, scene: &str, item_id: i64) -> Result<bool> {
        Ok(self.client.scene_items().enabled(scene, item_id).await?)
    }

    async fn set_scene_item_enabled(&self, scene: &str, item_id: i64, enabled: bool) -> Result<()> {
        use obws::requests::scene_items::SetEnabled;
        Ok(self
            .client
            .scene_items()
            .set_enabled(SetEnabled {
                scene,
                item_id,
                enabled,
            })
            .await?)
    }

    async fn filter_enabled(&self, source: &str, filter: &str) -> Result<bool> {
        Ok(self.client.filters().get(source, filter).await?.enabled)
    }

    async fn set_filter_enabled(&self, source: &str, filter: &str, enabled: bool) -> Result<()> {
        use obws::requests::filters::SetEnabled;
        Ok(self
            .client
            .filters()
            .set_enabled(SetEnabled {
                source,
                filter,
                enabled,
            })
            .await?)
    }

    async fn set_current_transition(&self, name: &str) -> Result<()> {
        Ok(self.client.transitions().set_current(name).await?)
    }

    async fn set_transition_duration(&self, duration: Duration) -> Result<()> {
        let duration = time::Duration::try_from(duration)
            .map_err(|e| DeckError::InvalidRequest(format!("invalid transition duration: {}", e)))?;
        Ok(self.client.transitions().set_current_duration(duration).await?)
    }

    async fn trigger_transition(&self) -> Result<()> {
        Ok(self.client.transitions().trigger().await?)
    }

    async fn studio_mode_enabled(&self) -> Result<bool> {
        Ok(self.client.ui().studio_mode_enabled().await?)
    }

    async fn set_studio_mode_enabled(&self, enabled: bool) -> Result<()> {
        Ok(self.client.ui().set_studio_mode_enabled(enabled).await?)
    }

    fn changes(&self) -> Result<BoxStream<'static, ObsChange>> {
        use obws::events::Event;

        let events = self.client.events()?;
        let changes = events.filter_map(|event| async move {
            match event {
                Event::StreamStateChanged { .. } => Some(ObsChange::Stream),
                Event::RecordStateChanged { .. } => Some(ObsChange::Record),
                Event::CurrentProgramSceneChanged { name } => Some(ObsChange::ProgramScene(name)),
                Event::StudioModeStateChanged { .. } => Some(ObsChange::StudioMode),
                Event::VirtualcamStateChanged { .. } => Some(ObsChange::VirtualCam),
                Event::ReplayBufferStateChanged { .. } => Some(ObsChange::ReplayBuffer),
                Event::ExitStarted => Some(ObsChange::ServerStopping),
                _ => None,
            }
        });
        Ok(changes.boxed())
    }
}
