//! Client sessions and inactivity eviction

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Collection, Entity};
use crate::error::{DeckError, Result};
use crate::models::ClientSession;
use crate::storage::{BlobStore, SESSIONS_DOC};

impl Entity for ClientSession {
    fn key(&self) -> &str {
        &self.session_id
    }
}

pub struct SessionRegistry {
    sessions: Collection<ClientSession>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn BlobStore>) -> Result<Self> {
        let sessions = Collection::load(store, SESSIONS_DOC)?;
        info!("Session registry loaded ({} sessions)", sessions.len());
        Ok(Self { sessions })
    }

    /// Register a client, or refresh the session it already owns
    ///
    /// A known `client_id` keeps its `session_id`. Its bound configuration is
    /// only replaced when `config_id` is non-empty.
    pub fn register_or_update(
        &self,
        client_id: &str,
        client_name: &str,
        config_id: &str,
        ip_address: &str,
    ) -> Result<ClientSession> {
        let now = Utc::now();

        let session = self.sessions.mutate(|items| {
            if let Some(existing) = items.values_mut().find(|s| s.client_id == client_id) {
                existing.client_name = client_name.to_string();
                existing.ip_address = ip_address.to_string();
                existing.last_connected = now;
                existing.last_active = now;
                if !config_id.is_empty() {
                    existing.config_id = config_id.to_string();
                }
                return Ok(existing.clone());
            }

            let session = ClientSession {
                session_id: Uuid::new_v4().to_string(),
                client_id: client_id.to_string(),
                client_name: client_name.to_string(),
                config_id: config_id.to_string(),
                ip_address: ip_address.to_string(),
                last_connected: now,
                last_active: now,
            };
            items.insert(session.session_id.clone(), session.clone());
            Ok(session)
        })?;

        debug!(
            "Session {} registered for client '{}' ({})",
            session.session_id, session.client_id, session.ip_address
        );
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Result<ClientSession> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| DeckError::SessionNotFound(session_id.to_string()))
    }

    pub fn get_by_client_id(&self, client_id: &str) -> Result<ClientSession> {
        self.sessions
            .find(|s| s.client_id == client_id)
            .ok_or_else(|| DeckError::SessionNotFound(client_id.to_string()))
    }

    /// Bind a session to another configuration
    pub fn update_config(&self, session_id: &str, config_id: &str) -> Result<ClientSession> {
        self.modify(session_id, |session| {
            session.config_id = config_id.to_string();
        })
    }

    /// Refresh `last_active`
    pub fn update_activity(&self, session_id: &str) -> Result<ClientSession> {
        self.modify(session_id, |_| {})
    }

    fn modify(&self, session_id: &str, edit: impl FnOnce(&mut ClientSession)) -> Result<ClientSession> {
        self.sessions.mutate(|items| {
            let session = items
                .get_mut(session_id)
                .ok_or_else(|| DeckError::SessionNotFound(session_id.to_string()))?;
            edit(session);
            session.last_active = Utc::now();
            Ok(session.clone())
        })
    }

    pub fn list(&self) -> Vec<ClientSession> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a session; unknown ids are not an error
    pub fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.mutate(|items| {
            items.remove(session_id);
            Ok(())
        })
    }

    /// Hard-delete every session idle for longer than `max_idle`
    pub fn cleanup_inactive(&self, max_idle: Duration) -> Result<usize> {
        self.cleanup_inactive_at(Utc::now(), max_idle)
    }

    /// Same as `cleanup_inactive`, with an explicit reference time
    pub fn cleanup_inactive_at(&self, now: DateTime<Utc>, max_idle: Duration) -> Result<usize> {
        let Some(cutoff) = chrono::Duration::from_std(max_idle)
            .ok()
            .and_then(|idle| now.checked_sub_signed(idle))
        else {
            return Ok(0);
        };

        let stale = self
            .sessions
            .values()
            .iter()
            .filter(|s| s.last_active < cutoff)
            .count();
        if stale == 0 {
            return Ok(0);
        }

        let removed = self.sessions.mutate(|items| {
            let before = items.len();
            items.retain(|_, s| s.last_active >= cutoff);
            Ok(before - items.len())
        })?;

        info!("🧹 Evicted {} inactive session(s)", removed);
        Ok(removed)
    }
}

/// Sweep inactive sessions now and then every `interval`
pub fn spawn_session_sweeper(
    sessions: Arc<SessionRegistry>,
    interval: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match sessions.cleanup_inactive(max_idle) {
                Ok(_) => debug!("Session sweep done, {} active", sessions.len()),
                Err(e) => tracing::error!("Session sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const THIRTY_MINUTES: Duration = Duration::from_secs(30 * 60);

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(MemoryStore::new())).unwrap()
    }

    fn session_idle_for(client_id: &str, minutes: i64) -> ClientSession {
        let at = Utc::now() - chrono::Duration::minutes(minutes);
        ClientSession {
            session_id: format!("sess-{}", client_id),
            client_id: client_id.to_string(),
            client_name: client_id.to_uppercase(),
            config_id: "cfg".to_string(),
            ip_address: "10.0.0.2".to_string(),
            last_connected: at,
            last_active: at,
        }
    }

    #[test]
    fn test_register_twice_keeps_session_id() {
        let sessions = registry();
        let first = sessions.register_or_update("host-a", "Desk", "cfg-1", "10.0.0.2").unwrap();
        let second = sessions.register_or_update("host-a", "Desk 2", "", "10.0.0.3").unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_eq!(second.client_name, "Desk 2");
        assert_eq!(second.ip_address, "10.0.0.3");
        // Empty config id keeps the existing binding
        assert_eq!(second.config_id, "cfg-1");
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_register_with_config_rebinds() {
        let sessions = registry();
        sessions.register_or_update("host-a", "Desk", "cfg-1", "10.0.0.2").unwrap();
        let again = sessions.register_or_update("host-a", "Desk", "cfg-2", "10.0.0.2").unwrap();

        assert_eq!(again.config_id, "cfg-2");
        assert_eq!(sessions.get_by_client_id("host-a").unwrap().config_id, "cfg-2");
    }

    #[test]
    fn test_lookups_report_session_not_found() {
        let sessions = registry();
        assert!(matches!(sessions.get("nope"), Err(DeckError::SessionNotFound(_))));
        assert!(matches!(sessions.get_by_client_id("nope"), Err(DeckError::SessionNotFound(_))));
        assert!(matches!(sessions.update_config("nope", "cfg"), Err(DeckError::SessionNotFound(_))));
        assert!(matches!(sessions.update_activity("nope"), Err(DeckError::SessionNotFound(_))));
    }

    #[test]
    fn test_update_config_refreshes_activity() {
        let sessions = registry();
        let s = sessions.register_or_update("host-a", "Desk", "cfg-1", "10.0.0.2").unwrap();

        let updated = sessions.update_config(&s.session_id, "cfg-9").unwrap();
        assert_eq!(updated.config_id, "cfg-9");
        assert!(updated.last_active >= s.last_active);
    }

    #[test]
    fn test_cleanup_evicts_only_idle_sessions() {
        let store: Arc<dyn BlobStore> = Arc::new(MemoryStore::new());
        store
            .save_json(
                SESSIONS_DOC,
                &vec![session_idle_for("stale", 31), session_idle_for("fresh", 10)],
            )
            .unwrap();
        let sessions = SessionRegistry::new(store).unwrap();

        let removed = sessions.cleanup_inactive(THIRTY_MINUTES).unwrap();

        assert_eq!(removed, 1);
        assert!(sessions.get_by_client_id("stale").is_err());
        assert!(sessions.get_by_client_id("fresh").is_ok());
    }

    #[test]
    fn test_evicted_client_gets_a_new_session() {
        let sessions = registry();
        let first = sessions.register_or_update("host-a", "Desk", "cfg-1", "10.0.0.2").unwrap();

        let later = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(sessions.cleanup_inactive_at(later, THIRTY_MINUTES).unwrap(), 1);
        assert!(matches!(sessions.get(&first.session_id), Err(DeckError::SessionNotFound(_))));

        let second = sessions.register_or_update("host-a", "Desk", "cfg-1", "10.0.0.2").unwrap();
        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn test_cleanup_without_stale_sessions_skips_write() {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionRegistry::new(store.clone()).unwrap();
        sessions.register_or_update("host-a", "Desk", "cfg-1", "10.0.0.2").unwrap();

        store.set_reject_writes(true);
        assert_eq!(sessions.cleanup_inactive(THIRTY_MINUTES).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweeper_runs_immediately() {
        let store: Arc<dyn BlobStore> = Arc::new(MemoryStore::new());
        store
            .save_json(SESSIONS_DOC, &vec![session_idle_for("stale", 45)])
            .unwrap();
        let sessions = Arc::new(SessionRegistry::new(store).unwrap());

        let task = spawn_session_sweeper(Arc::clone(&sessions), Duration::from_secs(300), THIRTY_MINUTES);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(sessions.is_empty());
        task.abort();
    }
}
