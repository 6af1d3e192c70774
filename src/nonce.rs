//! Nonce generation and single-use tracking.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

/// Generate a cryptographically random challenge nonce.
///
/// Returns a hex-encoded string (64 characters) from 32 random bytes.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Tracks issued nonces so each can be consumed exactly once.
///
/// A challenge nonce is recorded when issued and removed on first use or
/// after its TTL elapses. Without this, a captured (message, signature) pair
/// could be replayed until the message's expiration time.
pub struct NonceRegistry {
    ttl: Duration,
    issued: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl NonceRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Generate a fresh nonce and record it as outstanding.
    pub fn issue(&self) -> String {
        let nonce = generate_nonce();
        let expires_at = Utc::now() + self.ttl;
        self.lock().insert(nonce.clone(), expires_at);
        nonce
    }

    /// Consume a nonce. Returns `true` iff it was outstanding and unexpired.
    /// The entry is removed either way, so a second call always fails.
    pub fn consume(&self, nonce: &str) -> bool {
        match self.lock().remove(nonce) {
            Some(expires_at) => Utc::now() < expires_at,
            None => false,
        }
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut issued = self.lock();
        let before = issued.len();
        issued.retain(|_, expires_at| now < *expires_at);
        before - issued.len()
    }

    pub fn outstanding(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.issued.lock().unwrap_or_else(|e| e.into_inner())
    }
}
