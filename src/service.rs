//! SIWX orchestration: composes nonce issuance, message construction,
//! signature verification, session storage, and token issuance into the
//! public authentication operations.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::chain::ChainId;
use crate::config::SiwxConfig;
use crate::error::SiwxError;
use crate::message::{MessageParams, SiwxMessage};
use crate::models::{
    NonceResponse, SessionStats, SessionView, SiwxSession, VerifyOutcome, VerifyRequest,
};
use crate::nonce::NonceRegistry;
use crate::provisioner::IdentityProvisioner;
use crate::store::SessionStore;
use crate::token::TokenCodec;
use crate::verify;

pub struct SiwxService {
    store: Arc<dyn SessionStore>,
    provisioner: Arc<dyn IdentityProvisioner>,
    tokens: TokenCodec,
    nonces: NonceRegistry,
    session_ttl: Duration,
    require_issued_nonce: bool,
}

impl SiwxService {
    pub fn new(
        config: &SiwxConfig,
        store: Arc<dyn SessionStore>,
        provisioner: Arc<dyn IdentityProvisioner>,
    ) -> Self {
        Self {
            store,
            provisioner,
            tokens: TokenCodec::new(&config.token_secret),
            nonces: NonceRegistry::new(Duration::seconds(config.nonce_ttl_secs as i64)),
            session_ttl: Duration::seconds(config.session_ttl_secs as i64),
            require_issued_nonce: config.require_issued_nonce,
        }
    }

    /// Issue a challenge nonce for a login attempt.
    pub fn create_nonce(&self, address: &str) -> Result<NonceResponse, SiwxError> {
        if address.trim().is_empty() {
            return Err(SiwxError::InvalidInput("address is required".to_string()));
        }
        let nonce = self.nonces.issue();
        tracing::debug!(action = "nonce_issued", address = %address, "Challenge nonce issued");
        Ok(NonceResponse { nonce })
    }

    /// Build the challenge message a wallet will sign.
    pub fn create_message(&self, params: MessageParams) -> Result<SiwxMessage, SiwxError> {
        SiwxMessage::build(params)
    }

    /// Verify a signed challenge and, on success, create a session and issue
    /// its bearer token. Failures come back as a generic outcome; the real
    /// reason goes to the log only.
    pub async fn verify_and_create_session(&self, request: VerifyRequest) -> VerifyOutcome {
        match self.verify_inner(request).await {
            Ok(view) => VerifyOutcome::success(view),
            Err(err) => {
                tracing::warn!(action = "auth_failed", error = %err, "Signature verification rejected");
                VerifyOutcome::failure(&err)
            }
        }
    }

    /// Same as [`verify_and_create_session`], but the message is carried
    /// inside the base64 JSON signature envelope (wallets that can't submit
    /// message and signature separately).
    ///
    /// [`verify_and_create_session`]: Self::verify_and_create_session
    pub async fn verify_and_create_session_from_signature(&self, encoded: &str) -> VerifyOutcome {
        match VerifyRequest::from_encoded(encoded) {
            Ok(request) => self.verify_and_create_session(request).await,
            Err(err) => {
                tracing::warn!(action = "auth_failed", error = %err, "Malformed signature payload");
                VerifyOutcome::failure(&err)
            }
        }
    }

    async fn verify_inner(&self, request: VerifyRequest) -> Result<SessionView, SiwxError> {
        let message = request.message;
        let chain_id = message.chain_id.clone();
        let address = message.address.clone();

        verify::validate_address(&address, &chain_id)?;

        // Single-use nonce: the message nonce must be one we issued and not
        // yet consumed. Consuming before the signature check means even a
        // failed attempt burns the nonce.
        if self.require_issued_nonce && !self.nonces.consume(&message.nonce) {
            tracing::warn!(action = "nonce_rejected", address = %address, "Unknown, expired, or replayed nonce");
            return Err(SiwxError::InvalidSignature);
        }

        let now = Utc::now();
        if let Some(expiration_time) = message.expiration_time {
            if now >= expiration_time {
                tracing::warn!(action = "message_expired", address = %address, "Challenge message past its expiration time");
                return Err(SiwxError::InvalidSignature);
            }
        }
        if let Some(not_before) = message.not_before {
            if now < not_before {
                tracing::warn!(action = "message_not_yet_valid", address = %address, "Challenge message not yet valid");
                return Err(SiwxError::InvalidSignature);
            }
        }

        verify::verify_signature(&message, &request.signature, &address, &chain_id)?;

        let expires_at = message
            .expiration_time
            .unwrap_or_else(|| now + self.session_ttl);
        let session = SiwxSession {
            id: nanoid::nanoid!(),
            address: address.clone(),
            chain_id: chain_id.clone(),
            message,
            signature: request.signature,
            issued_at: now,
            expires_at,
            is_valid: true,
        };

        let token = self.tokens.issue(&session)?;
        let view = SessionView::from_session(&session, Some(token));
        self.store.add(session).await;

        self.ensure_identity(&chain_id, &address).await;

        tracing::info!(
            action = "auth_success",
            chain_id = %chain_id,
            address = %address,
            session_id = %view.id,
            "Session created"
        );
        Ok(view)
    }

    /// Best-effort user provisioning. A failure here never fails the
    /// authentication result.
    async fn ensure_identity(&self, chain_id: &ChainId, address: &str) {
        let existing = match self.provisioner.get_by_address(chain_id, address).await {
            Ok(existing) => existing,
            Err(err) => {
                tracing::warn!(action = "provisioning_failed", error = %err, address = %address, "Identity lookup failed");
                return;
            }
        };
        if existing.is_none() {
            if let Err(err) = self.provisioner.create_from_address(chain_id, address).await {
                tracing::warn!(action = "provisioning_failed", error = %err, address = %address, "Identity creation failed");
            }
        }
    }

    /// Currently-usable sessions for an identity, as read-only projections.
    pub async fn get_sessions(&self, chain_id: &ChainId, address: &str) -> Vec<SessionView> {
        self.store
            .get(chain_id, address)
            .await
            .iter()
            .map(|s| SessionView::from_session(s, None))
            .collect()
    }

    /// Logout: drop every session for the identity. Outstanding tokens stop
    /// validating immediately.
    pub async fn revoke_sessions(&self, chain_id: &ChainId, address: &str) {
        self.store.delete(chain_id, address).await;
        tracing::info!(action = "sessions_revoked", chain_id = %chain_id, address = %address, "Sessions revoked");
    }

    /// Validate a bearer token against the store. The token proves nothing
    /// on its own; the stored session decides.
    pub async fn validate_session_token(&self, token: &str) -> Result<SessionView, SiwxError> {
        let claims = self.tokens.decode(token)?;
        let chain_id = ChainId::parse(&claims.chain_id);

        let session = self
            .store
            .find(&chain_id, &claims.address, &claims.sub)
            .await
            .ok_or(SiwxError::SessionNotFound)?;

        if !session.is_valid {
            return Err(SiwxError::SessionRevoked);
        }
        if Utc::now() >= session.expires_at {
            return Err(SiwxError::SessionExpired);
        }
        Ok(SessionView::from_session(&session, None))
    }

    /// Sweep expired sessions and nonces. Returns the number of sessions
    /// removed.
    pub async fn cleanup_expired_sessions(&self) -> usize {
        let sessions_removed = self.store.cleanup_expired().await;
        let nonces_removed = self.nonces.sweep_expired();
        if sessions_removed > 0 || nonces_removed > 0 {
            tracing::info!(
                sessions = sessions_removed,
                nonces = nonces_removed,
                "Expired entries swept"
            );
        }
        sessions_removed
    }

    pub async fn session_stats(&self) -> SessionStats {
        self.store.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioner::{Identity, InMemoryIdentityProvisioner, ProvisioningError};
    use crate::store::InMemorySessionStore;
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use async_trait::async_trait;
    use zeroize::Zeroizing;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn test_config() -> SiwxConfig {
        SiwxConfig {
            token_secret: Zeroizing::new("unit-test-secret-0123456789abcdef".to_string()),
            session_ttl_secs: 3600,
            nonce_ttl_secs: 300,
            max_sessions_per_identity: 5,
            cleanup_interval_secs: 600,
            require_issued_nonce: true,
        }
    }

    fn service() -> SiwxService {
        SiwxService::new(
            &test_config(),
            Arc::new(InMemorySessionStore::new(5)),
            Arc::new(InMemoryIdentityProvisioner::new()),
        )
    }

    fn evm_params(nonce: String) -> MessageParams {
        MessageParams {
            domain: "example.com".to_string(),
            address: TEST_ADDRESS.to_string(),
            statement: Some("Sign in".to_string()),
            uri: "https://example.com".to_string(),
            version: None,
            chain_id: ChainId::parse("eip155:1"),
            nonce,
            expiration_time: None,
            not_before: None,
            request_id: None,
            resources: None,
        }
    }

    fn evm_sign(message: &SiwxMessage) -> String {
        let signer: PrivateKeySigner = TEST_KEY.parse().unwrap();
        let signing_string = message.to_signing_string(TEST_ADDRESS);
        let signature = signer.sign_message_sync(signing_string.as_bytes()).unwrap();
        format!("0x{}", hex::encode(signature.as_bytes()))
    }

    async fn login(service: &SiwxService) -> VerifyOutcome {
        let nonce = service.create_nonce(TEST_ADDRESS).unwrap().nonce;
        let message = service.create_message(evm_params(nonce)).unwrap();
        let signature = evm_sign(&message);
        service
            .verify_and_create_session(VerifyRequest { message, signature })
            .await
    }

    #[tokio::test]
    async fn test_end_to_end_login_and_token_validation() {
        let service = service();
        let outcome = login(&service).await;
        assert!(outcome.is_valid, "{:?}", outcome.error);

        let session = outcome.session.unwrap();
        let token = session.token.clone().unwrap();

        let validated = service.validate_session_token(&token).await.unwrap();
        assert_eq!(validated.id, session.id);
        assert_eq!(validated.address, TEST_ADDRESS);
        assert!(validated.token.is_none());
    }

    #[tokio::test]
    async fn test_nonce_is_single_use() {
        let service = service();
        let nonce = service.create_nonce(TEST_ADDRESS).unwrap().nonce;
        let message = service.create_message(evm_params(nonce)).unwrap();
        let signature = evm_sign(&message);

        let first = service
            .verify_and_create_session(VerifyRequest {
                message: message.clone(),
                signature: signature.clone(),
            })
            .await;
        assert!(first.is_valid);

        // Replaying the identical signed message must fail
        let replay = service
            .verify_and_create_session(VerifyRequest { message, signature })
            .await;
        assert!(!replay.is_valid);
        assert_eq!(replay.error.as_deref(), Some("invalid signature"));
    }

    #[tokio::test]
    async fn test_self_invented_nonce_rejected() {
        let service = service();
        let message = service
            .create_message(evm_params("d".repeat(64)))
            .unwrap();
        let signature = evm_sign(&message);
        let outcome = service
            .verify_and_create_session(VerifyRequest { message, signature })
            .await;
        assert!(!outcome.is_valid);
    }

    #[tokio::test]
    async fn test_unsupported_chain_outcome() {
        let service = service();
        let nonce = service.create_nonce(TEST_ADDRESS).unwrap().nonce;
        let mut message = service.create_message(evm_params(nonce)).unwrap();
        message.chain_id = ChainId::parse("cosmos:1");
        let outcome = service
            .verify_and_create_session(VerifyRequest {
                message,
                signature: "0x00".to_string(),
            })
            .await;
        assert!(!outcome.is_valid);
        assert_eq!(outcome.error.as_deref(), Some("invalid signature"));
    }

    #[tokio::test]
    async fn test_revocation_invalidates_token() {
        let service = service();
        let outcome = login(&service).await;
        let token = outcome.session.unwrap().token.unwrap();

        let chain = ChainId::parse("eip155:1");
        service.revoke_sessions(&chain, TEST_ADDRESS).await;

        assert!(service.get_sessions(&chain, TEST_ADDRESS).await.is_empty());
        assert!(matches!(
            service.validate_session_token(&token).await,
            Err(SiwxError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_encoded_signature_path() {
        let service = service();
        let nonce = service.create_nonce(TEST_ADDRESS).unwrap().nonce;
        let message = service.create_message(evm_params(nonce)).unwrap();
        let signature = evm_sign(&message);
        let encoded = VerifyRequest { message, signature }.to_encoded().unwrap();

        let outcome = service
            .verify_and_create_session_from_signature(&encoded)
            .await;
        assert!(outcome.is_valid);

        let garbage = service
            .verify_and_create_session_from_signature("%%%")
            .await;
        assert!(!garbage.is_valid);
    }

    #[tokio::test]
    async fn test_payload_address_cannot_spoof() {
        // Sign for TEST_ADDRESS, then swap the message address. The signing
        // string is rebuilt from the claimed address, so recovery must fail.
        let service = service();
        let nonce = service.create_nonce(TEST_ADDRESS).unwrap().nonce;
        let mut message = service.create_message(evm_params(nonce)).unwrap();
        let signature = evm_sign(&message);
        message.address = "0x0000000000000000000000000000000000000001".to_string();

        let outcome = service
            .verify_and_create_session(VerifyRequest { message, signature })
            .await;
        assert!(!outcome.is_valid);
    }

    struct FailingProvisioner;

    #[async_trait]
    impl IdentityProvisioner for FailingProvisioner {
        async fn get_by_address(
            &self,
            _chain_id: &ChainId,
            _address: &str,
        ) -> Result<Option<Identity>, ProvisioningError> {
            Err(ProvisioningError("backend down".to_string()))
        }

        async fn create_from_address(
            &self,
            _chain_id: &ChainId,
            _address: &str,
        ) -> Result<Identity, ProvisioningError> {
            Err(ProvisioningError("backend down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_provisioning_failure_does_not_fail_auth() {
        let service = SiwxService::new(
            &test_config(),
            Arc::new(InMemorySessionStore::new(5)),
            Arc::new(FailingProvisioner),
        );
        let outcome = login(&service).await;
        assert!(outcome.is_valid);
    }

    #[tokio::test]
    async fn test_empty_address_nonce_request_rejected() {
        let service = service();
        assert!(matches!(
            service.create_nonce("  "),
            Err(SiwxError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_and_cleanup() {
        let service = service();
        assert!(login(&service).await.is_valid);
        let stats = service.session_stats().await;
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_addresses, 1);
        // Nothing is expired yet
        assert_eq!(service.cleanup_expired_sessions().await, 0);
    }
}
