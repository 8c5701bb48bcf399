//! OBS pass-through endpoints

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::error::ApiError;
use super::ApiState;
use crate::obs::{ObsCredentials, ObsStatus};

/// GET /api/obs/status
pub async fn get_status(State(state): State<Arc<ApiState>>) -> Result<Json<ObsStatus>, ApiError> {
    Ok(Json(state.obs.get_status().await?))
}

/// GET /api/obs/scenes
pub async fn get_scenes(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.obs.get_scenes().await?))
}

/// GET /api/obs/inputs
pub async fn get_inputs(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.obs.get_inputs().await?))
}

#[derive(Debug, Deserialize)]
pub struct VisibilityQuery {
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub source: String,
}

/// GET /api/obs/source-visibility?scene=&source=
pub async fn get_source_visibility(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<VisibilityQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    if query.scene.is_empty() || query.source.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "missing scene or source parameter",
        ));
    }

    let visible = state
        .obs
        .get_source_visibility(&query.scene, &query.source)
        .await?;
    Ok(Json(json!({ "visible": visible })))
}

/// POST /api/obs/connect
///
/// On success the credentials are saved for the next start-up.
pub async fn connect(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<ObsCredentials>, JsonRejection>,
) -> Result<Json<ObsStatus>, ApiError> {
    let Json(request) = payload?;
    let credentials = ObsCredentials::new(request.url, request.password);

    let outcome = state
        .obs
        .connect(&credentials.url, credentials.password.as_deref())
        .await;
    // Watchers learn about the failure too: a failed attempt drops the old link
    state.publish_status();
    outcome?;

    if let Err(e) = credentials.save(state.store.as_ref()) {
        warn!("Connected, but failed to save OBS settings: {}", e);
    }

    Ok(Json(state.obs.get_status().await?))
}

/// POST /api/obs/disconnect
pub async fn disconnect(State(state): State<Arc<ApiState>>) -> Json<Value> {
    state.obs.disconnect().await;
    state.publish_status();
    Json(json!({ "success": true }))
}
