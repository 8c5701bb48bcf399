//! Management endpoints: configurations, buttons, sessions, server info

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::error::ApiError;
use super::ApiState;
use crate::models::{Button, ClientSession, Configuration, ResolvedConfiguration};

// ---------------------------------------------------------------------------
// Configurations
// ---------------------------------------------------------------------------

/// GET /api/configurations (unresolved)
pub async fn list_configurations(State(state): State<Arc<ApiState>>) -> Json<Vec<Configuration>> {
    let mut configs = state.configs.list();
    configs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(configs)
}

/// GET /api/configurations/default
pub async fn get_default_configuration(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ResolvedConfiguration>, ApiError> {
    Ok(Json(state.configs.resolve_default()?))
}

/// GET /api/configurations/:id
pub async fn get_configuration(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ResolvedConfiguration>, ApiError> {
    Ok(Json(state.configs.resolve(&id)?))
}

pub async fn create_configuration(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Configuration>, JsonRejection>,
) -> Result<(StatusCode, Json<Configuration>), ApiError> {
    let Json(config) = payload?;
    let created = state.configs.create(config)?;
    info!("Configuration '{}' created ({})", created.name, created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_configuration(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    payload: Result<Json<Configuration>, JsonRejection>,
) -> Result<Json<Configuration>, ApiError> {
    let Json(mut config) = payload?;
    config.id = id;
    Ok(Json(state.configs.update(config)?))
}

pub async fn delete_configuration(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.configs.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/configurations/:id/default
pub async fn set_default_configuration(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<Configuration>, ApiError> {
    state.configs.set_default(&id)?;
    Ok(Json(state.configs.get(&id)?))
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

pub async fn list_buttons(State(state): State<Arc<ApiState>>) -> Json<Vec<Button>> {
    let mut buttons = state.buttons.list();
    buttons.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Json(buttons)
}

pub async fn get_button(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<Button>, ApiError> {
    Ok(Json(state.buttons.get(&id)?))
}

pub async fn create_button(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<Button>, JsonRejection>,
) -> Result<(StatusCode, Json<Button>), ApiError> {
    let Json(button) = payload?;
    Ok((StatusCode::CREATED, Json(state.buttons.create(button)?)))
}

pub async fn update_button(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    payload: Result<Json<Button>, JsonRejection>,
) -> Result<Json<Button>, ApiError> {
    let Json(mut button) = payload?;
    button.id = id;
    Ok(Json(state.buttons.update(button)?))
}

pub async fn delete_button(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.buttons.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub async fn list_sessions(State(state): State<Arc<ApiState>>) -> Json<Vec<ClientSession>> {
    let mut sessions = state.sessions.list();
    sessions.sort_by(|a, b| b.last_active.cmp(&a.last_active));
    Json(sessions)
}

pub async fn delete_session(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Health and info
// ---------------------------------------------------------------------------

/// GET /api/health
pub async fn health_check(State(state): State<Arc<ApiState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "obs_connected": state.obs.is_connected().await,
    }))
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub port: u16,
    pub obs_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obs_url: Option<String>,
    pub buttons: usize,
    pub configurations: usize,
    pub sessions: usize,
    pub watchers: usize,
}

/// GET /api/server/info
pub async fn server_info(State(state): State<Arc<ApiState>>) -> Json<ServerInfo> {
    Json(ServerInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        port: state.port,
        obs_connected: state.obs.is_connected().await,
        obs_url: state.obs.url().await,
        buttons: state.buttons.len(),
        configurations: state.configs.len(),
        sessions: state.sessions.len(),
        watchers: state.hub.watcher_count().await,
    })
}
