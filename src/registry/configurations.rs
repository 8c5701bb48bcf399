//! Configuration registry: grid layouts, the default flag and resolution

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ButtonLibrary, Collection, Entity};
use crate::error::{DeckError, EntityKind, Result};
use crate::models::{Configuration, GridPosition, ResolvedButton, ResolvedConfiguration};
use crate::storage::{BlobStore, CONFIGS_DOC};

impl Entity for Configuration {
    fn key(&self) -> &str {
        &self.id
    }
}

pub struct ConfigRegistry {
    configs: Collection<Configuration>,
    buttons: Arc<ButtonLibrary>,
}

impl ConfigRegistry {
    pub fn new(store: Arc<dyn BlobStore>, buttons: Arc<ButtonLibrary>) -> Result<Self> {
        let configs = Collection::load(store, CONFIGS_DOC)?;
        info!("Configuration registry loaded ({} configurations)", configs.len());
        Ok(Self { configs, buttons })
    }

    /// Insert a new configuration with a fresh id and timestamps
    ///
    /// A configuration created with `is_default` takes the flag from every
    /// other configuration in the same write.
    pub fn create(&self, mut config: Configuration) -> Result<Configuration> {
        let now = Utc::now();
        config.id = Uuid::new_v4().to_string();
        config.created_at = now;
        config.updated_at = now;

        let created = config.clone();
        self.configs.mutate(move |items| {
            if config.is_default {
                clear_defaults(items.values_mut());
            }
            items.insert(config.id.clone(), config);
            Ok(())
        })?;

        debug!("Created configuration '{}' ({})", created.name, created.id);
        Ok(created)
    }

    pub fn get(&self, id: &str) -> Result<Configuration> {
        self.configs
            .get(id)
            .ok_or_else(|| DeckError::not_found(EntityKind::Configuration, id))
    }

    pub fn list(&self) -> Vec<Configuration> {
        self.configs.values()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace an existing configuration, keeping its `created_at`
    pub fn update(&self, mut config: Configuration) -> Result<Configuration> {
        config.updated_at = Utc::now();

        self.configs.mutate(|items| {
            let existing = items
                .get(&config.id)
                .ok_or_else(|| DeckError::not_found(EntityKind::Configuration, config.id.as_str()))?;
            config.created_at = existing.created_at;

            if config.is_default {
                clear_defaults(items.values_mut());
            }
            items.insert(config.id.clone(), config.clone());
            Ok(())
        })?;

        Ok(config)
    }

    /// Remove a configuration; unknown ids are not an error
    pub fn delete(&self, id: &str) -> Result<()> {
        self.configs.mutate(|items| {
            items.remove(id);
            Ok(())
        })
    }

    /// Flag `id` as the single default configuration
    pub fn set_default(&self, id: &str) -> Result<()> {
        self.configs.mutate(|items| {
            clear_defaults(items.values_mut());
            let target = items
                .get_mut(id)
                .ok_or_else(|| DeckError::not_found(EntityKind::Configuration, id))?;
            target.is_default = true;
            target.updated_at = Utc::now();
            Ok(())
        })?;

        info!("⭐ Default configuration set to {}", id);
        Ok(())
    }

    pub fn get_default(&self) -> Result<Configuration> {
        self.configs
            .find(|c| c.is_default)
            .ok_or(DeckError::NoDefaultConfigured)
    }

    /// Inline every referenced button into a client-ready layout
    ///
    /// Malformed positions and dangling button ids are skipped.
    pub fn resolve(&self, id: &str) -> Result<ResolvedConfiguration> {
        let config = self.get(id)?;
        Ok(self.materialize(config))
    }

    pub fn resolve_default(&self) -> Result<ResolvedConfiguration> {
        let config = self.get_default()?;
        Ok(self.materialize(config))
    }

    fn materialize(&self, config: Configuration) -> ResolvedConfiguration {
        let mut buttons = Vec::with_capacity(config.buttons.len());

        for (key, button_id) in &config.buttons {
            let position = match key.parse::<GridPosition>() {
                Ok(p) => p,
                Err(e) => {
                    warn!("Configuration {}: skipping entry: {}", config.id, e);
                    continue;
                }
            };

            let Ok(button) = self.buttons.get(button_id) else {
                debug!(
                    "Configuration {}: button {} at {} no longer exists",
                    config.id, button_id, position
                );
                continue;
            };

            buttons.push(ResolvedButton {
                id: position.to_string(),
                row: position.row,
                col: position.col,
                text: button.name,
                icon: button.icon,
                color: button.color,
                action: button.action,
            });
        }

        ResolvedConfiguration {
            id: config.id,
            name: config.name,
            grid: config.grid,
            buttons,
        }
    }
}

fn clear_defaults<'a>(configs: impl Iterator<Item = &'a mut Configuration>) {
    for config in configs {
        config.is_default = false;
    }
}
