//! Client-facing endpoints: registration, layout lookup, actions

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::{ApiError, ClientIp, SessionId};
use super::ApiState;
use crate::error::DeckError;
use crate::models::{ButtonAction, ResolvedConfiguration};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub client_id: String,
    #[serde(default)]
    pub client_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub session_id: String,
    pub config_id: String,
    pub config: ResolvedConfiguration,
}

/// POST /api/client/register
///
/// Known clients keep their session and configuration (falling back to the
/// default if that configuration was deleted); new clients get the default.
pub async fn register_client(
    State(state): State<Arc<ApiState>>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(req) = payload?;
    if req.client_id.trim().is_empty() {
        return Err(DeckError::InvalidRequest("client_id is required".into()).into());
    }

    let bound = state
        .sessions
        .get_by_client_id(&req.client_id)
        .ok()
        .map(|s| s.config_id)
        .filter(|id| state.configs.get(id).is_ok());

    let config_id = match bound {
        Some(id) => id,
        None => state.configs.get_default()?.id,
    };

    let session = state
        .sessions
        .register_or_update(&req.client_id, &req.client_name, &config_id, &ip)?;
    let config = state.configs.resolve(&session.config_id)?;

    info!(
        "📱 Client '{}' ({}) registered from {}",
        session.client_name, session.client_id, session.ip_address
    );

    Ok(Json(RegisterResponse {
        session_id: session.session_id,
        config_id: session.config_id,
        config,
    }))
}

/// GET /api/client/config
pub async fn get_client_config(
    State(state): State<Arc<ApiState>>,
    SessionId(session_id): SessionId,
) -> Result<Json<ResolvedConfiguration>, ApiError> {
    let session = state.sessions.update_activity(&session_id)?;
    Ok(Json(state.configs.resolve(&session.config_id)?))
}

/// PUT /api/client/config/:id
pub async fn switch_client_config(
    State(state): State<Arc<ApiState>>,
    SessionId(session_id): SessionId,
    Path(config_id): Path<String>,
) -> Result<Json<ResolvedConfiguration>, ApiError> {
    state.configs.get(&config_id)?;
    state.sessions.update_config(&session_id, &config_id)?;

    debug!("Session {} switched to configuration {}", session_id, config_id);
    Ok(Json(state.configs.resolve(&config_id)?))
}

/// POST /api/action
///
/// An evicted session is rejected before anything reaches OBS.
pub async fn execute_action(
    State(state): State<Arc<ApiState>>,
    SessionId(session_id): SessionId,
    payload: Result<Json<ButtonAction>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(action) = payload?;

    state.sessions.update_activity(&session_id)?;
    state.obs.execute_action(&action).await?;

    debug!("Action '{}' executed for session {}", action.kind, session_id);
    state.publish_status();

    Ok(Json(json!({ "success": true })))
}
