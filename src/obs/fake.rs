//! In-process OBS stand-in for tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::connection::{
    ObsChange, ObsConnection, ObsConnector, ObsEndpoint, Output, OutputControl, RecordState,
};
use crate::error::{DeckError, Result};

#[derive(Debug, Clone, Default)]
pub struct FakeState {
    pub streaming: bool,
    pub recording: bool,
    pub recording_paused: bool,
    pub virtual_cam: bool,
    pub replay_buffer: bool,
    pub studio_mode: bool,
    pub program_scene: String,
    pub preview_scene: String,
    pub scenes: Vec<String>,
    pub inputs: Vec<String>,
    pub muted: HashSet<String>,
    pub volume: Option<(String, f32)>,
    pub item_enabled: bool,
    pub filter_enabled: bool,
    pub transition: Option<String>,
    pub transition_duration: Option<Duration>,
}

/// Fake OBS instance; records every primitive call by name
pub struct FakeObs {
    pub state: Mutex<FakeState>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    stalling: Mutex<HashSet<&'static str>>,
    changes: broadcast::Sender<ObsChange>,
}

impl FakeObs {
    pub fn new() -> Arc<Self> {
        let (changes, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Mutex::new(FakeState {
                program_scene: "Scene".into(),
                scenes: vec!["Scene".into(), "BRB".into()],
                inputs: vec!["Mic/Aux".into(), "Desktop Audio".into()],
                item_enabled: true,
                ..FakeState::default()
            }),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            stalling: Mutex::new(HashSet::new()),
            changes,
        })
    }

    /// Make calls named `call` fail with an upstream error
    pub fn fail(&self, call: &'static str) {
        self.failing.lock().insert(call);
    }

    /// Make calls named `call` never complete
    pub fn stall(&self, call: &'static str) {
        self.stalling.lock().insert(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn emit(&self, change: ObsChange) {
        let _ = self.changes.send(change);
    }

    async fn enter(&self, call: &'static str) -> Result<()> {
        self.calls.lock().push(call.to_string());
        let stalled = self.stalling.lock().contains(call);
        if stalled {
            std::future::pending::<()>().await;
        }
        let failing = self.failing.lock().contains(call);
        if failing {
            return Err(DeckError::Upstream(format!("{} failed", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObsConnection for FakeObs {
    async fn control_output(&self, output: Output, control: OutputControl) -> Result<()> {
        self.enter("control_output").await?;
        let mut state = self.state.lock();
        let flag = match output {
            Output::Stream => &mut state.streaming,
            Output::Record => &mut state.recording,
            Output::VirtualCam => &mut state.virtual_cam,
            Output::ReplayBuffer => &mut state.replay_buffer,
        };
        *flag = match control {
            OutputControl::Start => true,
            OutputControl::Stop => false,
            OutputControl::Toggle => !*flag,
        };
        Ok(())
    }

    async fn output_active(&self, output: Output) -> Result<bool> {
        let call = match output {
            Output::Stream => "stream_status",
            Output::Record => "record_status",
            Output::VirtualCam => "virtual_cam_status",
            Output::ReplayBuffer => "replay_buffer_status",
        };
        self.enter(call).await?;
        let state = self.state.lock();
        Ok(match output {
            Output::Stream => state.streaming,
            Output::Record => state.recording,
            Output::VirtualCam => state.virtual_cam,
            Output::ReplayBuffer => state.replay_buffer,
        })
    }

    async fn record_state(&self) -> Result<RecordState> {
        self.enter("record_status").await?;
        let state = self.state.lock();
        Ok(RecordState {
            active: state.recording,
            paused: state.recording_paused,
        })
    }

    async fn pause_record(&self) -> Result<()> {
        self.enter("pause_record").await?;
        self.state.lock().recording_paused = true;
        Ok(())
    }

    async fn resume_record(&self) -> Result<()> {
        self.enter("resume_record").await?;
        self.state.lock().recording_paused = false;
        Ok(())
    }

    async fn save_replay_buffer(&self) -> Result<()> {
        self.enter("save_replay_buffer").await
    }

    async fn current_program_scene(&self) -> Result<String> {
        self.enter("current_program_scene").await?;
        Ok(self.state.lock().program_scene.clone())
    }

    async fn set_program_scene(&self, scene: &str) -> Result<()> {
        self.enter("set_program_scene").await?;
        self.state.lock().program_scene = scene.to_string();
        Ok(())
    }

    async fn set_preview_scene(&self, scene: &str) -> Result<()> {
        self.enter("set_preview_scene").await?;
        self.state.lock().preview_scene = scene.to_string();
        Ok(())
    }

    async fn scene_names(&self) -> Result<Vec<String>> {
        self.enter("scene_names").await?;
        Ok(self.state.lock().scenes.clone())
    }

    async fn input_names(&self) -> Result<Vec<String>> {
        self.enter("input_names").await?;
        Ok(self.state.lock().inputs.clone())
    }

    async fn set_input_muted(&self, input: &str, muted: bool) -> Result<()> {
        self.enter("set_input_muted").await?;
        let mut state = self.state.lock();
        if muted {
            state.muted.insert(input.to_string());
        } else {
            state.muted.remove(input);
        }
        Ok(())
    }

    async fn toggle_input_mute(&self, input: &str) -> Result<()> {
        self.enter("toggle_input_mute").await?;
        let mut state = self.state.lock();
        if !state.muted.remove(input) {
            state.muted.insert(input.to_string());
        }
        Ok(())
    }

    async fn set_input_volume(&self, input: &str, multiplier: f32) -> Result<()> {
        self.enter("set_input_volume").await?;
        self.state.lock().volume = Some((input.to_string(), multiplier));
        Ok(())
    }

    async fn scene_item_id(&self, _scene: &str, _source: &str) -> Result<i64> {
        self.enter("scene_item_id").await?;
        Ok(7)
    }

    async fn scene_item_enabled(&self, _scene: &str, _item_id: i64) -> Result<bool> {
        self.enter("scene_item_enabled").await?;
        Ok(self.state.lock().item_enabled)
    }

    async fn set_scene_item_enabled(&self, _scene: &str, _item_id: i64, enabled: bool) -> Result<()> {
        self.enter("set_scene_item_enabled").await?;
        self.state.lock().item_enabled = enabled;
        Ok(())
    }

    async fn filter_enabled(&self, _source: &str, _filter: &str) -> Result<bool> {
        self.enter("filter_enabled").await?;
        Ok(self.state.lock().filter_enabled)
    }

    async fn set_filter_enabled(&self, _source: &str, _filter: &str, enabled: bool) -> Result<()> {
        self.enter("set_filter_enabled").await?;
        self.state.lock().filter_enabled = enabled;
        Ok(())
    }

    async fn set_current_transition(&self, name: &str) -> Result<()> {
        self.enter("set_current_transition").await?;
        self.state.lock().transition = Some(name.to_string());
        Ok(())
    }

    async fn set_transition_duration(&self, duration: Duration) -> Result<()> {
        self.enter("set_transition_duration").await?;
        self.state.lock().transition_duration = Some(duration);
        Ok(())
    }

    async fn trigger_transition(&self) -> Result<()> {
        self.enter("trigger_transition").await
    }

    async fn studio_mode_enabled(&self) -> Result<bool> {
        self.enter("studio_mode_enabled").await?;
        Ok(self.state.lock().studio_mode)
    }

    async fn set_studio_mode_enabled(&self, enabled: bool) -> Result<()> {
        self.enter("set_studio_mode_enabled").await?;
        self.state.lock().studio_mode = enabled;
        Ok(())
    }

    fn changes(&self) -> Result<BoxStream<'static, ObsChange>> {
        let rx = self.changes.subscribe();
        let stream = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(change) => return Some((change, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(stream.boxed())
    }
}

/// Connector handing out the same `FakeObs` on every connect
pub struct FakeConnector {
    pub obs: Arc<FakeObs>,
    refuse: AtomicBool,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            obs: FakeObs::new(),
            refuse: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
        })
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObsConnector for FakeConnector {
    async fn connect(
        &self,
        endpoint: &ObsEndpoint,
        _password: Option<&str>,
    ) -> Result<Arc<dyn ObsConnection>> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(DeckError::Upstream(format!("connection refused: {}", endpoint)));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.obs.clone())
    }
}
