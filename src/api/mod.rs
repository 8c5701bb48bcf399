//! HTTP API for deck clients
//!
//! JSON endpoints under `/api`, plus the WebSocket status channel.
//! Default port: 8080

mod admin;
mod client;
mod error;
mod obs;
mod ws;


pub use client::{RegisterRequest, RegisterResponse};
pub use error::{ApiError, ClientIp, SessionId, SESSION_HEADER};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::hub::{self, HubHandle};
use crate::obs::ObsAdapter;
use crate::registry::{ButtonLibrary, ConfigRegistry, SessionRegistry};
use crate::storage::BlobStore;

/// Default API port
pub const DEFAULT_API_PORT: u16 = 8080;

/// Shared state for API handlers
pub struct ApiState {
    pub buttons: Arc<ButtonLibrary>,
    pub configs: Arc<ConfigRegistry>,
    pub sessions: Arc<SessionRegistry>,
    pub obs: Arc<ObsAdapter>,
    pub hub: HubHandle,
    /// Used for the saved OBS credentials
    pub store: Arc<dyn BlobStore>,
    pub port: u16,
}

impl ApiState {
    /// Rebroadcast OBS status in the background
    pub fn publish_status(&self) {
        hub::spawn_status_refresh(Arc::clone(&self.obs), self.hub.clone());
    }
}

/// Build the API router
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/health", get(admin::health_check))
        .route("/api/server/info", get(admin::server_info))
        .route(
            "/api/configurations",
            get(admin::list_configurations).post(admin::create_configuration),
        )
        .route(
            "/api/configurations/default",
            get(admin::get_default_configuration),
        )
        .route(
            "/api/configurations/:id",
            get(admin::get_configuration)
                .put(admin::update_configuration)
                .delete(admin::delete_configuration),
        )
        .route(
            "/api/configurations/:id/default",
            put(admin::set_default_configuration),
        )
        .route(
            "/api/buttons",
            get(admin::list_buttons).post(admin::create_button),
        )
        .route(
            "/api/buttons/:id",
            get(admin::get_button)
                .put(admin::update_button)
                .delete(admin::delete_button),
        )
        .route("/api/sessions", get(admin::list_sessions))
        .route(
            "/api/sessions/:id",
            axum::routing::delete(admin::delete_session),
        )
        .route("/api/client/register", post(client::register_client))
        .route("/api/client/config", get(client::get_client_config))
        .route("/api/client/config/:id", put(client::switch_client_config))
        .route("/api/action", post(client::execute_action))
        .route("/api/obs/status", get(obs::get_status))
        .route("/api/obs/scenes", get(obs::get_scenes))
        .route("/api/obs/inputs", get(obs::get_inputs))
        .route("/api/obs/source-visibility", get(obs::get_source_visibility))
        .route("/api/obs/connect", post(obs::connect))
        .route("/api/obs/disconnect", post(obs::disconnect))
        .route("/ws", get(ws::status_socket))
        .route("/api/ws", get(ws::status_socket))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn start_server(
    state: Arc<ApiState>,
    host: &str,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let router = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;
    info!("🌐 Starting deck API server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind API server")?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("API server error")?;

    Ok(())
}
