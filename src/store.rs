//! Session storage.
//!
//! The store is the single shared mutable resource in the core and the
//! source of truth for session validity. The in-memory implementation keeps
//! every read-modify-write under one write guard, so per-key sequences like
//! "purge expired, then append" are atomic with respect to concurrent
//! callers, and a sweep never observes a key half-updated.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::chain::ChainId;
use crate::models::{SessionStats, SiwxSession};

/// Storage key: chain id plus lowercased address, so mixed-case EVM
/// addresses map to one identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chain_id: ChainId,
    pub address: String,
}

impl SessionKey {
    pub fn new(chain_id: &ChainId, address: &str) -> Self {
        Self {
            chain_id: chain_id.clone(),
            address: address.to_lowercase(),
        }
    }
}

/// Capability interface over session storage. Production deployments may
/// substitute a TTL-aware external store without touching the orchestrator.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Purge expired sessions for the identity, then append.
    async fn add(&self, session: SiwxSession);

    /// Bulk replace, grouped by identity (import/sync path).
    async fn set(&self, sessions: Vec<SiwxSession>);

    /// Currently-usable sessions for the identity; lazily evicts the rest.
    async fn get(&self, chain_id: &ChainId, address: &str) -> Vec<SiwxSession>;

    /// Raw lookup by session id, without eviction. Token validation needs to
    /// see revoked and expired records to report why they are unusable.
    async fn find(
        &self,
        chain_id: &ChainId,
        address: &str,
        session_id: &str,
    ) -> Option<SiwxSession>;

    /// Remove every session for the identity.
    async fn delete(&self, chain_id: &ChainId, address: &str);

    /// Sweep all identities, dropping unusable sessions. Returns how many
    /// were removed.
    async fn cleanup_expired(&self) -> usize;

    /// Counts of currently-usable sessions and identities holding at least
    /// one.
    async fn stats(&self) -> SessionStats;
}

/// In-process session map guarded by a single `RwLock`.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, Vec<SiwxSession>>>,
    max_sessions_per_identity: usize,
}

impl InMemorySessionStore {
    pub fn new(max_sessions_per_identity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions_per_identity,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn add(&self, session: SiwxSession) {
        let key = SessionKey::new(&session.chain_id, &session.address);
        let now = Utc::now();
        let mut map = self.sessions.write().await;
        let entries = map.entry(key).or_default();
        entries.retain(|s| s.is_usable(now));
        entries.push(session);
        // Oldest logins fall off first once the identity hits the cap
        if entries.len() > self.max_sessions_per_identity {
            let overflow = entries.len() - self.max_sessions_per_identity;
            entries.drain(..overflow);
        }
    }

    async fn set(&self, sessions: Vec<SiwxSession>) {
        let mut grouped: HashMap<SessionKey, Vec<SiwxSession>> = HashMap::new();
        for session in sessions {
            let key = SessionKey::new(&session.chain_id, &session.address);
            grouped.entry(key).or_default().push(session);
        }
        let mut map = self.sessions.write().await;
        for (key, entries) in grouped {
            map.insert(key, entries);
        }
    }

    async fn get(&self, chain_id: &ChainId, address: &str) -> Vec<SiwxSession> {
        let key = SessionKey::new(chain_id, address);
        let now = Utc::now();
        let mut map = self.sessions.write().await;
        let usable = match map.get_mut(&key) {
            Some(entries) => {
                entries.retain(|s| s.is_usable(now));
                entries.clone()
            }
            None => Vec::new(),
        };
        if usable.is_empty() {
            map.remove(&key);
        }
        usable
    }

    async fn find(
        &self,
        chain_id: &ChainId,
        address: &str,
        session_id: &str,
    ) -> Option<SiwxSession> {
        let key = SessionKey::new(chain_id, address);
        let map = self.sessions.read().await;
        map.get(&key)
            .and_then(|entries| entries.iter().find(|s| s.id == session_id))
            .cloned()
    }

    async fn delete(&self, chain_id: &ChainId, address: &str) {
        let key = SessionKey::new(chain_id, address);
        let mut map = self.sessions.write().await;
        map.remove(&key);
    }

    async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        let mut map = self.sessions.write().await;
        map.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|s| s.is_usable(now));
            removed += before - entries.len();
            !entries.is_empty()
        });
        removed
    }

    async fn stats(&self) -> SessionStats {
        let now = Utc::now();
        let map = self.sessions.read().await;
        let mut total_sessions = 0;
        let mut total_addresses = 0;
        for entries in map.values() {
            let usable = entries.iter().filter(|s| s.is_usable(now)).count();
            if usable > 0 {
                total_sessions += usable;
                total_addresses += 1;
            }
        }
        SessionStats {
            total_sessions,
            total_addresses,
        }
    }
}
