//! Session manager: create/get/extend/delete session state
//! in the KV collaborator, keyed by `session_id`.
//!
//! The in-process [`crate::processor::Processor`] holds STM/accumulator
//! state only while it is live; this module is what lets a caller
//! rehydrate that state for the next request against the same session
//! (`load_stm`/`load_accumulator`) and commit it back afterward
//! (`save_stm`/`save_accumulator`).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ProcessorConfig;
use crate::kb::KvStore;
use crate::pattern::Event;
use crate::{KatoError, Result};

const SESSION_PREFIX: &str = "session:";

fn header_key(session_id: &str) -> String {
    format!("session:{session_id}")
}
fn stm_key(session_id: &str) -> String {
    format!("session:{session_id}:stm")
}
fn emotives_key(session_id: &str) -> String {
    format!("session:{session_id}:emotives")
}
fn metadata_key(session_id: &str) -> String {
    format!("session:{session_id}:metadata")
}

/// Persisted session header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHeader {
    pub session_id: String,
    pub kb_id: String,
    pub config: ProcessorConfig,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionHeader {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Owns session lifecycle (create/get/extend/delete/gc) and the persisted
/// STM/accumulator blobs backing each session, all in the KV collaborator.
pub struct SessionManager {
    kv: Arc<dyn KvStore>,
}

impl SessionManager {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Create a new session bound to `kb_id`. `kb_id` is immutable for the
    /// session's lifetime thereafter.
    pub fn create(&self, kb_id: String, config: ProcessorConfig) -> Result<SessionHeader> {
        let now = Utc::now();
        let ttl = config.session_ttl_seconds;
        let header = SessionHeader {
            session_id: Uuid::new_v4().to_string(),
            kb_id,
            expires_at: now + Duration::seconds(ttl as i64),
            created_at: now,
            config,
        };
        self.put_header(&header, ttl)?;
        self.save_stm(&header.session_id, &[], ttl)?;
        self.save_accumulator(&header.session_id, &BTreeMap::new(), &BTreeMap::new(), ttl)?;
        tracing::info!(session_id = %header.session_id, kb_id = %header.kb_id, ttl, "session created");
        Ok(header)
    }

    /// Fetch a session header, failing with `SessionNotFound`/`SessionExpired`
    /// as appropriate. An expired session is garbage-collected eagerly.
    pub fn get(&self, session_id: &str) -> Result<SessionHeader> {
        let Some(blob) = self.kv.get_blob(&header_key(session_id))? else {
            return Err(KatoError::SessionNotFound(session_id.to_string()));
        };
        let header: SessionHeader = serde_json::from_slice(&blob)?;
        if header.is_expired(Utc::now()) {
            self.delete(session_id)?;
            return Err(KatoError::SessionExpired(session_id.to_string()));
        }
        Ok(header)
    }

    /// Reset the session's TTL from now, using its own configured
    /// `session_ttl_seconds` (`extend`, driven by `session_auto_extend`
    /// at the call site).
    pub fn extend(&self, session_id: &str) -> Result<SessionHeader> {
        let mut header = self.get(session_id)?;
        let ttl = header.config.session_ttl_seconds;
        header.expires_at = Utc::now() + Duration::seconds(ttl as i64);
        self.put_header(&header, ttl)?;
        Ok(header)
    }

    /// Persist a patched config against a live session, extending its TTL
    /// key lifetimes to match the (possibly changed) `session_ttl_seconds`.
    pub fn update_config(&self, session_id: &str, config: ProcessorConfig) -> Result<SessionHeader> {
        let mut header = self.get(session_id)?;
        header.config = config;
        let ttl = header.config.session_ttl_seconds;
        self.put_header(&header, ttl)?;
        Ok(header)
    }

    /// Delete all state for `session_id`. Idempotent.
    pub fn delete(&self, session_id: &str) -> Result<()> {
        self.kv.delete_blob(&header_key(session_id))?;
        self.kv.delete_blob(&stm_key(session_id))?;
        self.kv.delete_blob(&emotives_key(session_id))?;
        self.kv.delete_blob(&metadata_key(session_id))?;
        Ok(())
    }

    /// Sweep every session header, deleting any whose TTL has elapsed.
    /// Returns the number of sessions collected.
    pub fn gc_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut collected = 0;
        for key in self.kv.list_keys_with_prefix(SESSION_PREFIX)? {
            if key.matches(':').count() != 1 {
                continue; // skip :stm/:emotives/:metadata satellite keys
            }
            let Some(blob) = self.kv.get_blob(&key)? else {
                continue;
            };
            let Ok(header) = serde_json::from_slice::<SessionHeader>(&blob) else {
                continue;
            };
            if header.is_expired(now) {
                self.delete(&header.session_id)?;
                collected += 1;
            }
        }
        if collected > 0 {
            tracing::info!(collected, "garbage-collected expired sessions");
        }
        Ok(collected)
    }

    pub fn save_stm(&self, session_id: &str, stm: &[Event], ttl_seconds: u64) -> Result<()> {
        let bytes = serde_json::to_vec(stm)?;
        self.kv.put_blob(&stm_key(session_id), &bytes, Some(ttl_seconds))?;
        Ok(())
    }

    pub fn load_stm(&self, session_id: &str) -> Result<Vec<Event>> {
        match self.kv.get_blob(&stm_key(session_id))? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn save_accumulator(
        &self,
        session_id: &str,
        emotives: &BTreeMap<String, Vec<BTreeMap<String, f32>>>,
        metadata: &BTreeMap<String, HashSet<String>>,
        ttl_seconds: u64,
    ) -> Result<()> {
        self.kv
            .put_blob(&emotives_key(session_id), &serde_json::to_vec(emotives)?, Some(ttl_seconds))?;
        self.kv
            .put_blob(&metadata_key(session_id), &serde_json::to_vec(metadata)?, Some(ttl_seconds))?;
        Ok(())
    }

    fn put_header(&self, header: &SessionHeader, ttl_seconds: u64) -> Result<()> {
        let bytes = serde_json::to_vec(header)?;
        self.kv.put_blob(&header_key(&header.session_id), &bytes, Some(ttl_seconds))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::SqliteBackend;

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(SqliteBackend::open_in_memory().unwrap()))
    }

    #[test]
    fn create_then_get_roundtrips() {
        let mgr = manager();
        let header = mgr.create("kb1".to_string(), ProcessorConfig::default()).unwrap();
        let fetched = mgr.get(&header.session_id).unwrap();
        assert_eq!(fetched.kb_id, "kb1");
    }

    #[test]
    fn delete_is_idempotent() {
        let mgr = manager();
        let header = mgr.create("kb1".to_string(), ProcessorConfig::default()).unwrap();
        mgr.delete(&header.session_id).unwrap();
        mgr.delete(&header.session_id).unwrap();
        assert!(matches!(mgr.get(&header.session_id), Err(KatoError::SessionNotFound(_))));
    }

    #[test]
    fn expired_session_surfaces_and_self_deletes() {
        let mgr = manager();
        let mut config = ProcessorConfig::default();
        config.session_ttl_seconds = 0;
        let header = mgr.create("kb1".to_string(), config).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(matches!(mgr.get(&header.session_id), Err(KatoError::SessionExpired(_))));
        assert!(matches!(mgr.get(&header.session_id), Err(KatoError::SessionNotFound(_))));
    }

    #[test]
    fn stm_round_trips_through_kv() {
        let mgr = manager();
        let header = mgr.create("kb1".to_string(), ProcessorConfig::default()).unwrap();
        let stm = vec![vec!["a".to_string(), "b".to_string()]];
        mgr.save_stm(&header.session_id, &stm, 3600).unwrap();
        assert_eq!(mgr.load_stm(&header.session_id).unwrap(), stm);
    }
}
