//! Button library: reusable button definitions

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Collection, Entity};
use crate::error::{DeckError, EntityKind, Result};
use crate::models::Button;
use crate::storage::{BlobStore, BUTTONS_DOC};

impl Entity for Button {
    fn key(&self) -> &str {
        &self.id
    }
}

pub struct ButtonLibrary {
    buttons: Collection<Button>,
}

impl ButtonLibrary {
    pub fn new(store: Arc<dyn BlobStore>) -> Result<Self> {
        let buttons = Collection::load(store, BUTTONS_DOC)?;
        info!("Button library loaded ({} buttons)", buttons.len());
        Ok(Self { buttons })
    }

    /// Insert a new button with a fresh id and timestamps
    pub fn create(&self, mut button: Button) -> Result<Button> {
        let now = Utc::now();
        button.id = Uuid::new_v4().to_string();
        button.created_at = now;
        button.updated_at = now;

        let created = button.clone();
        self.buttons.mutate(move |items| {
            items.insert(button.id.clone(), button);
            Ok(())
        })?;

        debug!("Created button '{}' ({})", created.name, created.id);
        Ok(created)
    }

    pub fn get(&self, id: &str) -> Result<Button> {
        self.buttons
            .get(id)
            .ok_or_else(|| DeckError::not_found(EntityKind::Button, id))
    }

    pub fn list(&self) -> Vec<Button> {
        self.buttons.values()
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace an existing button; `created_at` is kept from the stored copy
    pub fn update(&self, mut button: Button) -> Result<Button> {
        button.updated_at = Utc::now();

        self.buttons.mutate(|items| {
            let existing = items
                .get(&button.id)
                .ok_or_else(|| DeckError::not_found(EntityKind::Button, button.id.as_str()))?;
            button.created_at = existing.created_at;
            items.insert(button.id.clone(), button.clone());
            Ok(())
        })?;

        Ok(button)
    }

    /// Remove a button; unknown ids are not an error
    pub fn delete(&self, id: &str) -> Result<()> {
        self.buttons.mutate(|items| {
            items.remove(id);
            Ok(())
        })
    }
}
