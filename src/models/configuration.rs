//! Button layouts and their resolved, client-ready form

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::button::ButtonAction;

/// Grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

impl Default for GridSize {
    fn default() -> Self {
        Self { rows: 3, cols: 4 }
    }
}

/// A named button layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub grid: GridSize,
    /// Position key (`btn-<row>-<col>`) -> button id
    #[serde(default)]
    pub buttons: BTreeMap<String, String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// What clients render: a configuration with button details inlined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfiguration {
    pub id: String,
    pub name: String,
    pub grid: GridSize,
    pub buttons: Vec<ResolvedButton>,
}

/// A button placed on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedButton {
    /// Position key, e.g. "btn-1-2"
    pub id: String,
    pub row: u32,
    pub col: u32,
    pub text: String,
    pub icon: String,
    pub color: String,
    pub action: ButtonAction,
}
