use serde::{Deserialize, Serialize};

/// Snapshot of OBS state as reported to clients
///
/// When disconnected only `connected: false` is serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObsStatus {
    pub connected: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub streaming: bool,
    pub recording: bool,
    pub recording_paused: bool,
    pub current_scene: String,
    pub virtual_cam_active: bool,
    pub replay_buffer_active: bool,
    pub studio_mode_active: bool,
    /// Optional flags that could not be queried and were reported as `false`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<String>,
}

impl ObsStatus {
    pub fn offline() -> Self {
        Self {
            connected: false,
            live: None,
        }
    }

    pub fn online(live: LiveStatus) -> Self {
        Self {
            connected: true,
            live: Some(live),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offline_shape() {
        let value = serde_json::to_value(ObsStatus::offline()).unwrap();
        assert_eq!(value, json!({ "connected": false }));
    }

    #[test]
    fn test_online_shape_is_flat() {
        let status = ObsStatus::online(LiveStatus {
            streaming: true,
            recording: false,
            recording_paused: false,
            current_scene: "Main".into(),
            virtual_cam_active: false,
            replay_buffer_active: false,
            studio_mode_active: true,
            unavailable: vec!["virtual_cam_active".into()],
        });

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["connected"], json!(true));
        assert_eq!(value["streaming"], json!(true));
        assert_eq!(value["current_scene"], json!("Main"));
        assert_eq!(value["unavailable"], json!(["virtual_cam_active"]));
    }
}
