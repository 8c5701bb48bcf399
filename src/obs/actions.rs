//! Button action catalog
//!
//! `ObsCommand::parse` validates an action's parameters without touching OBS;
//! `run` then issues the primitive calls.

use std::time::Duration;

use tracing::debug;

use super::connection::{ObsConnection, Output, OutputControl};
use crate::error::{DeckError, Result};
use crate::models::ButtonAction;

/// On / off / flip for boolean OBS state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
    Toggle,
}

impl Switch {
    fn apply(self, current: bool) -> bool {
        match self {
            Switch::On => true,
            Switch::Off => false,
            Switch::Toggle => !current,
        }
    }
}

/// A validated action, ready to run against a connection
#[derive(Debug, Clone, PartialEq)]
pub enum ObsCommand {
    SwitchScene { scene: String },
    Output { output: Output, control: OutputControl },
    PauseRecord,
    ResumeRecord,
    SaveReplayBuffer,
    /// `Switch::On` mutes
    InputMute { input: String, mute: Switch },
    /// Already mapped from percent to a clamped 0.0..=1.0 multiplier
    InputVolume { input: String, multiplier: f32 },
    SourceVisibility { scene: String, source: String, visible: Switch },
    SourceFilter { source: String, filter: String, enabled: Switch },
    TriggerTransition,
    SetTransition { name: String },
    SetTransitionDuration { duration: Duration },
    StudioMode(Switch),
    SetPreviewScene { scene: String },
}

impl ObsCommand {
    pub fn parse(action: &ButtonAction) -> Result<Self> {
        // `Output` stays the output kind, not the variant
        use ObsCommand::{
            InputMute, InputVolume, PauseRecord, ResumeRecord, SaveReplayBuffer, SetPreviewScene,
            SetTransition, SetTransitionDuration, SourceFilter, SourceVisibility, StudioMode,
            SwitchScene, TriggerTransition,
        };

        let p = &action.params;
        let text = |name: &str| p.require_str(name).map(str::to_string);

        let command = match action.kind.as_str() {
            "switch_scene" => SwitchScene {
                scene: text("scene_name")?,
            },

            "start_stream" => output(Output::Stream, OutputControl::Start),
            "stop_stream" => output(Output::Stream, OutputControl::Stop),
            "toggle_stream" => output(Output::Stream, OutputControl::Toggle),

            "start_record" => output(Output::Record, OutputControl::Start),
            "stop_record" => output(Output::Record, OutputControl::Stop),
            "toggle_record" => output(Output::Record, OutputControl::Toggle),
            "pause_record" => PauseRecord,
            "resume_record" => ResumeRecord,

            "toggle_source_visibility" | "show_source" | "hide_source" => SourceVisibility {
                scene: text("scene_name")?,
                source: text("source_name")?,
                visible: switch_for(&action.kind),
            },

            "toggle_input_mute" | "mute_input" | "unmute_input" => InputMute {
                input: text("input_name")?,
                mute: switch_for(&action.kind),
            },
            "set_input_volume" => InputVolume {
                input: text("input_name")?,
                multiplier: volume_multiplier(p.require_number("volume")?),
            },

            "start_virtual_cam" => output(Output::VirtualCam, OutputControl::Start),
            "stop_virtual_cam" => output(Output::VirtualCam, OutputControl::Stop),
            "toggle_virtual_cam" => output(Output::VirtualCam, OutputControl::Toggle),

            "start_replay_buffer" => output(Output::ReplayBuffer, OutputControl::Start),
            "stop_replay_buffer" => output(Output::ReplayBuffer, OutputControl::Stop),
            "toggle_replay_buffer" => output(Output::ReplayBuffer, OutputControl::Toggle),
            "save_replay_buffer" => SaveReplayBuffer,

            "toggle_source_filter" | "enable_source_filter" | "disable_source_filter" => SourceFilter {
                source: text("source_name")?,
                filter: text("filter_name")?,
                enabled: switch_for(&action.kind),
            },

            "trigger_transition" => TriggerTransition,
            "set_current_transition" => SetTransition {
                name: text("transition_name")?,
            },
            "set_transition_duration" => SetTransitionDuration {
                duration: transition_duration(p.require_number("duration")?)?,
            },

            "toggle_studio_mode" | "enable_studio_mode" | "disable_studio_mode" => {
                StudioMode(switch_for(&action.kind))
            }
            "set_preview_scene" => SetPreviewScene {
                scene: text("scene_name")?,
            },

            other => return Err(DeckError::UnknownAction(other.to_string())),
        };

        Ok(command)
    }

    pub async fn run(&self, obs: &dyn ObsConnection) -> Result<()> {
        debug!("Running OBS command {:?}", self);

        match self {
            ObsCommand::SwitchScene { scene } => obs.set_program_scene(scene).await,
            ObsCommand::Output { output, control } => obs.control_output(*output, *control).await,
            ObsCommand::PauseRecord => obs.pause_record().await,
            ObsCommand::ResumeRecord => obs.resume_record().await,
            ObsCommand::SaveReplayBuffer => obs.save_replay_buffer().await,

            ObsCommand::InputMute { input, mute } => match mute {
                Switch::Toggle => obs.toggle_input_mute(input).await,
                Switch::On => obs.set_input_muted(input, true).await,
                Switch::Off => obs.set_input_muted(input, false).await,
            },
            ObsCommand::InputVolume { input, multiplier } => {
                obs.set_input_volume(input, *multiplier).await
            }

            ObsCommand::SourceVisibility {
                scene,
                source,
                visible,
            } => {
                let item_id = obs.scene_item_id(scene, source).await?;
                let enabled = match visible {
                    Switch::Toggle => !obs.scene_item_enabled(scene, item_id).await?,
                    other => other.apply(false),
                };
                obs.set_scene_item_enabled(scene, item_id, enabled).await
            }

            ObsCommand::SourceFilter {
                source,
                filter,
                enabled,
            } => {
                let target = match enabled {
                    Switch::Toggle => !obs.filter_enabled(source, filter).await?,
                    other => other.apply(false),
                };
                obs.set_filter_enabled(source, filter, target).await
            }

            ObsCommand::TriggerTransition => obs.trigger_transition().await,
            ObsCommand::SetTransition { name } => obs.set_current_transition(name).await,
            ObsCommand::SetTransitionDuration { duration } => {
                obs.set_transition_duration(*duration).await
            }

            ObsCommand::StudioMode(switch) => {
                let enabled = match switch {
                    Switch::Toggle => !obs.studio_mode_enabled().await?,
                    other => other.apply(false),
                };
                obs.set_studio_mode_enabled(enabled).await
            }
            ObsCommand::SetPreviewScene { scene } => obs.set_preview_scene(scene).await,
        }
    }
}

fn output(output: Output, control: OutputControl) -> ObsCommand {
    ObsCommand::Output { output, control }
}

/// Infer the switch from the action name prefix
fn switch_for(kind: &str) -> Switch {
    if kind.starts_with("toggle_") {
        Switch::Toggle
    } else if kind.starts_with("show_") || kind.starts_with("mute_") || kind.starts_with("enable_") {
        Switch::On
    } else {
        Switch::Off
    }
}

/// Percent (0-100) to a linear multiplier clamped to 0.0..=1.0
pub fn volume_multiplier(percent: f64) -> f32 {
    if percent.is_nan() {
        return 0.0;
    }
    (percent / 100.0).clamp(0.0, 1.0) as f32
}

/// Milliseconds to a transition duration
fn transition_duration(millis: f64) -> Result<Duration> {
    if !millis.is_finite() || millis < 0.0 {
        return Err(DeckError::InvalidParameterType {
            field: "duration".to_string(),
            expected: "non-negative number of milliseconds",
        });
    }
    Ok(Duration::from_millis(millis.round() as u64))
}
