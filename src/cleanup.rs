//! Background sweep of expired sessions and nonces.
//!
//! Expired entries are already evicted lazily on read; the sweep exists so
//! identities that never log in again don't pin memory forever.

use std::sync::Arc;
use std::time::Duration;

use crate::service::SiwxService;

/// Run the cleanup loop. Sweeps every `interval`; never returns.
pub async fn run_cleanup_loop(service: Arc<SiwxService>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;

        let removed = service.cleanup_expired_sessions().await;
        if removed > 0 {
            tracing::info!(removed, "Cleanup sweep completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiwxConfig;
    use crate::provisioner::InMemoryIdentityProvisioner;
    use crate::store::InMemorySessionStore;
    use zeroize::Zeroizing;

    #[tokio::test(start_paused = true)]
    async fn test_loop_ticks_without_panicking() {
        let config = SiwxConfig {
            token_secret: Zeroizing::new("cleanup-test-secret-0123456789abcd".to_string()),
            session_ttl_secs: 3600,
            nonce_ttl_secs: 300,
            cleanup_interval_secs: 1,
            max_sessions_per_identity: 5,
            require_issued_nonce: true,
        };
        let service = Arc::new(SiwxService::new(
            &config,
            Arc::new(InMemorySessionStore::new(5)),
            Arc::new(InMemoryIdentityProvisioner::new()),
        ));

        let handle = tokio::spawn(run_cleanup_loop(
            Arc::clone(&service),
            Duration::from_secs(1),
        ));

        // Let a few paused-clock intervals elapse, then make sure the loop
        // is still alive
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
