//! Application wiring: registries, OBS adapter, hub and background tasks

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{self, ApiState};
use crate::config::{AppConfig, ObsConfig, StorageBackend};
use crate::hub::{self, HubHandle};
use crate::models::{Button, ButtonAction, Configuration, GridPosition, GridSize};
use crate::obs::{ObsAdapter, ObsConnector, ObsCredentials};
use crate::paths::AppPaths;
use crate::registry::{spawn_session_sweeper, ButtonLibrary, ConfigRegistry, SessionRegistry};
use crate::storage::{BlobStore, JsonFileStore, SledStore};

/// Open the configured blob store under the data directory
pub fn open_store(backend: StorageBackend, paths: &AppPaths) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match backend {
        StorageBackend::Json => Arc::new(
            JsonFileStore::open(&paths.data_dir)
                .with_context(|| format!("Failed to open data directory {}", paths.data_dir.display()))?,
        ),
        StorageBackend::Sled => {
            let path = paths.sled_db_path();
            Arc::new(
                SledStore::open(&path)
                    .with_context(|| format!("Failed to open sled database {}", path.display()))?,
            )
        }
    };
    info!("💾 Storage: {:?} in {}", backend, paths.data_dir.display());
    Ok(store)
}

/// Create the starter buttons and a default 3x4 layout if no layout exists
pub fn seed_defaults(
    buttons: &ButtonLibrary,
    configs: &ConfigRegistry,
) -> crate::error::Result<Option<Configuration>> {
    if !configs.is_empty() {
        return Ok(None);
    }

    info!("Initializing default configuration...");

    let starters = [
        ("Go Live", "Start streaming", "video", "#e74c3c", ButtonAction::new("start_stream")),
        ("Stop Stream", "Stop streaming", "stop-circle", "#95a5a6", ButtonAction::new("stop_stream")),
        ("Start Record", "Start recording", "circle", "#e74c3c", ButtonAction::new("start_record")),
        ("Stop Record", "Stop recording", "stop-circle", "#95a5a6", ButtonAction::new("stop_record")),
        (
            "Mute Mic",
            "Mute microphone",
            "mic-off",
            "#e67e22",
            ButtonAction::new("toggle_input_mute").with_param("input_name", "Mic/Aux"),
        ),
        (
            "Scene",
            "Switch to main scene",
            "layout",
            "#3498db",
            ButtonAction::new("switch_scene").with_param("scene_name", "Scene"),
        ),
    ];
    // Two columns, top to bottom
    let positions = (0..3).flat_map(|row| (0..2).map(move |col| GridPosition::new(row, col)));

    let now = Utc::now();
    let mut layout = Configuration {
        id: String::new(),
        name: "Default".to_string(),
        description: "Default configuration".to_string(),
        grid: GridSize::default(),
        buttons: Default::default(),
        is_default: true,
        created_at: now,
        updated_at: now,
    };

    for ((name, description, icon, color, action), position) in starters.into_iter().zip(positions) {
        let button = buttons.create(Button {
            id: String::new(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            action,
            created_at: now,
            updated_at: now,
        })?;
        layout.buttons.insert(position.to_string(), button.id);
    }

    let created = configs.create(layout)?;
    info!("Default configuration created ({} buttons)", created.buttons.len());
    Ok(Some(created))
}

/// Pick the OBS credentials used at start-up
///
/// Explicit CLI/env settings win, then the settings saved by the last
/// successful connect, then the config file.
pub fn startup_credentials(
    cli_url: Option<String>,
    cli_password: Option<String>,
    saved: Option<ObsCredentials>,
    config: &ObsConfig,
) -> ObsCredentials {
    if let Some(url) = cli_url {
        return ObsCredentials::new(url, cli_password.or_else(|| config.password.clone()));
    }
    if let Some(saved) = saved {
        return saved;
    }
    ObsCredentials::new(
        config.url.clone(),
        cli_password.or_else(|| config.password.clone()),
    )
}

/// A fully wired server, ready to serve
pub struct App {
    pub config: AppConfig,
    pub state: Arc<ApiState>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Build registries, adapter and hub on top of `store`
    pub fn build(
        config: AppConfig,
        store: Arc<dyn BlobStore>,
        connector: Arc<dyn ObsConnector>,
    ) -> Result<Self> {
        let buttons = Arc::new(ButtonLibrary::new(Arc::clone(&store)).context("Failed to load buttons")?);
        let configs = Arc::new(
            ConfigRegistry::new(Arc::clone(&store), Arc::clone(&buttons))
                .context("Failed to load configurations")?,
        );
        let sessions =
            Arc::new(SessionRegistry::new(Arc::clone(&store)).context("Failed to load sessions")?);

        if config.seed_defaults {
            seed_defaults(&buttons, &configs).context("Failed to seed default configuration")?;
        }

        let obs = Arc::new(ObsAdapter::new(connector, config.obs.request_timeout()));
        let hub = HubHandle::spawn(config.hub.watcher_queue);

        // Every upstream change turns into a status broadcast
        let weak_obs = Arc::downgrade(&obs);
        let change_hub = hub.clone();
        obs.subscribe_changes(move |_| {
            if let Some(obs) = weak_obs.upgrade() {
                hub::spawn_status_refresh(obs, change_hub.clone());
            }
        });

        let state = Arc::new(ApiState {
            buttons,
            configs,
            sessions,
            obs,
            hub,
            store,
            port: config.server.port,
        });

        Ok(Self {
            config,
            state,
            tasks: Vec::new(),
        })
    }

    /// Spawn the session sweeper and, if enabled, the OBS auto-connect
    pub fn start_background(&mut self, credentials: ObsCredentials) {
        self.tasks.push(spawn_session_sweeper(
            Arc::clone(&self.state.sessions),
            self.config.sessions.sweep_interval(),
            self.config.sessions.idle_timeout(),
        ));

        if !self.config.obs.auto_connect {
            info!("OBS auto-connect disabled");
            return;
        }

        let state = Arc::clone(&self.state);
        self.tasks.push(tokio::spawn(async move {
            match state
                .obs
                .connect(&credentials.url, credentials.password.as_deref())
                .await
            {
                Ok(()) => state.publish_status(),
                Err(e) => warn!(
                    "⚠️  OBS not reachable at {} ({}), connect later via /api/obs/connect",
                    credentials.url, e
                ),
            }
        }));
    }

    /// Serve HTTP until `shutdown` resolves, then stop background work
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let result = api::start_server(
            Arc::clone(&self.state),
            &self.config.server.host,
            self.config.server.port,
            shutdown,
        )
        .await;

        for task in &self.tasks {
            task.abort();
        }
        self.state.obs.disconnect().await;

        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::obs::fake::FakeConnector;
    use crate::obs::ObsChange;
    use crate::storage::MemoryStore;

    fn build(config: AppConfig) -> (App, Arc<FakeConnector>) {
        let connector = FakeConnector::new();
        let app = App::build(config, Arc::new(MemoryStore::new()), connector.clone()).unwrap();
        (app, connector)
    }

    #[tokio::test]
    async fn test_seeding_creates_default_layout_once() {
        let (app, _) = build(AppConfig::default());
        let state = &app.state;

        assert_eq!(state.buttons.len(), 6);
        let resolved = state.configs.resolve_default().unwrap();
        assert_eq!(resolved.name, "Default");
        assert_eq!(resolved.grid, GridSize { rows: 3, cols: 4 });

        let mut cells: Vec<_> = resolved.buttons.iter().map(|b| (b.row, b.col)).collect();
        cells.sort();
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]);

        let mute = resolved.buttons.iter().find(|b| b.text == "Mute Mic").unwrap();
        assert_eq!(mute.action.params.require_str("input_name").unwrap(), "Mic/Aux");

        assert!(seed_defaults(&state.buttons, &state.configs).unwrap().is_none());
        assert_eq!(state.buttons.len(), 6);
    }

    #[tokio::test]
    async fn test_seeding_can_be_disabled() {
        let config = AppConfig {
            seed_defaults: false,
            ..AppConfig::default()
        };
        let (app, _) = build(config);
        assert!(app.state.configs.is_empty());
    }

    #[test]
    fn test_credential_precedence() {
        let config = ObsConfig {
            url: "config-host:4455".into(),
            password: Some("config-pw".into()),
            ..ObsConfig::default()
        };
        let saved = ObsCredentials::new("saved-host:4455", Some("saved-pw".into()));

        let from_cli = startup_credentials(Some("cli-host".into()), None, Some(saved.clone()), &config);
        assert_eq!(from_cli.url, "cli-host");
        assert_eq!(from_cli.password.as_deref(), Some("config-pw"));

        let from_saved = startup_credentials(None, None, Some(saved.clone()), &config);
        assert_eq!(from_saved, saved);

        let from_config = startup_credentials(None, Some("env-pw".into()), None, &config);
        assert_eq!(from_config.url, "config-host:4455");
        assert_eq!(from_config.password.as_deref(), Some("env-pw"));
    }

    #[tokio::test]
    async fn test_auto_connect_and_change_broadcast() {
        let (mut app, connector) = build(AppConfig::default());
        let mut watcher = app.state.hub.subscribe();

        app.start_background(ObsCredentials::new("localhost:4455", None));

        // Auto-connect publishes a status
        let first = tokio::time::timeout(Duration::from_secs(1), watcher.receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(first.contains("\"connected\":true"));

        connector.obs.emit(ObsChange::Stream);
        let second = tokio::time::timeout(Duration::from_secs(1), watcher.receiver.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(second.contains("status_update"));
    }

    #[tokio::test]
    async fn test_failed_auto_connect_is_not_fatal() {
        let (mut app, connector) = build(AppConfig::default());
        connector.refuse_connections(true);

        app.start_background(ObsCredentials::new("localhost:4455", None));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!app.state.obs.is_connected().await);
    }
}
