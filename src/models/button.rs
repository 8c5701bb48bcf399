//! Buttons and the actions they trigger

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DeckError, Result};

/// A reusable button in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    /// Assigned by the library on create
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    pub action: ButtonAction,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// What a button does when pressed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonAction {
    /// Action name from the catalog (e.g. "switch_scene", "toggle_stream")
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "ActionParams::is_empty")]
    pub params: ActionParams,
}

impl ButtonAction {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: ActionParams::default(),
        }
    }

    /// Builder-style parameter insertion
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name, value);
        self
    }
}

/// Scalar value of an action parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Parameter bag of an action, with typed extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionParams(BTreeMap<String, ParamValue>);

impl ActionParams {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Required string parameter
    pub fn require_str(&self, name: &str) -> Result<&str> {
        match self.0.get(name) {
            Some(ParamValue::Text(s)) => Ok(s),
            Some(_) => Err(DeckError::InvalidParameterType {
                field: name.to_string(),
                expected: "string",
            }),
            None => Err(DeckError::MissingParameter(name.to_string())),
        }
    }

    /// Required numeric parameter; numeric strings ("75") are accepted too
    pub fn require_number(&self, name: &str) -> Result<f64> {
        let invalid = || DeckError::InvalidParameterType {
            field: name.to_string(),
            expected: "number",
        };

        match self.0.get(name) {
            Some(ParamValue::Number(n)) => Ok(*n),
            Some(ParamValue::Text(s)) => s.trim().parse::<f64>().map_err(|_| invalid()),
            Some(ParamValue::Bool(_)) => Err(invalid()),
            None => Err(DeckError::MissingParameter(name.to_string())),
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ActionParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_json_shape() {
        let action: ButtonAction = serde_json::from_value(json!({
            "type": "set_input_volume",
            "params": { "input_name": "Mic/Aux", "volume": 75, "force": true }
        }))
        .unwrap();

        assert_eq!(action.kind, "set_input_volume");
        assert_eq!(action.params.require_str("input_name").unwrap(), "Mic/Aux");
        assert_eq!(action.params.require_number("volume").unwrap(), 75.0);
        assert_eq!(action.params.get("force"), Some(&ParamValue::Bool(true)));

        // Empty params are omitted on the wire
        let bare = serde_json::to_value(ButtonAction::new("start_stream")).unwrap();
        assert_eq!(bare, json!({ "type": "start_stream" }));
    }

    #[test]
    fn test_require_str_distinguishes_missing_from_wrong_type() {
        let params: ActionParams = [("scene_name", ParamValue::Number(3.0))]
            .into_iter()
            .collect();

        assert!(matches!(
            params.require_str("scene_name"),
            Err(DeckError::InvalidParameterType { ref field, .. }) if field == "scene_name"
        ));
        assert!(matches!(
            params.require_str("source_name"),
            Err(DeckError::MissingParameter(ref field)) if field == "source_name"
        ));
    }

    #[test]
    fn test_require_number_accepts_numeric_strings() {
        let params: ActionParams = [("volume", "42.5"), ("duration", "fast")]
            .into_iter()
            .collect();

        assert_eq!(params.require_number("volume").unwrap(), 42.5);
        assert!(matches!(
            params.require_number("duration"),
            Err(DeckError::InvalidParameterType { .. })
        ));
    }
}
