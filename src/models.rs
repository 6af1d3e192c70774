//! Stored and boundary models for the SIWX core.
//!
//! `SiwxSession` is the canonical server-side record; everything that leaves
//! the trust boundary is a `SessionView` projection with the raw signature
//! and nonce stripped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::message::SiwxMessage;

/// An authenticated session, created only by a successful signature
/// verification. Usable iff `is_valid` and `now < expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiwxSession {
    pub id: String,
    pub address: String,
    pub chain_id: ChainId,
    pub message: SiwxMessage,
    /// Raw wallet signature. Never echoed to clients.
    pub signature: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Time-independent validity flag; false means revoked.
    pub is_valid: bool,
}

impl SiwxSession {
    /// The validity invariant: not revoked and not past expiry.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_valid && now < self.expires_at
    }
}

/// Read-only session projection handed to callers. No signature, no nonce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub address: String,
    pub chain_id: ChainId,
    pub domain: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Bearer token, present only on the session returned by a successful
    /// verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl SessionView {
    pub fn from_session(session: &SiwxSession, token: Option<String>) -> Self {
        Self {
            id: session.id.clone(),
            address: session.address.clone(),
            chain_id: session.chain_id.clone(),
            domain: session.message.domain.clone(),
            issued_at: session.issued_at,
            expires_at: session.expires_at,
            token,
        }
    }
}

/// Counts of currently-valid sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: usize,
    pub total_addresses: usize,
}

/// Request for a challenge nonce.
#[derive(Debug, Deserialize)]
pub struct NonceRequest {
    pub address: String,
}

/// Response containing the nonce to embed in the challenge.
#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Explicit verification payload: the full message plus the signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub message: SiwxMessage,
    pub signature: String,
}

impl VerifyRequest {
    /// Encode as the opaque base64 JSON envelope wallets hand back when the
    /// server must reconstruct the message from the signature payload alone.
    pub fn to_encoded(&self) -> Result<String, crate::error::SiwxError> {
        use base64::{engine::general_purpose, Engine as _};
        let json = serde_json::to_string(self)
            .map_err(|e| crate::error::SiwxError::Internal(format!("encode payload: {}", e)))?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    /// Decode the base64 JSON envelope. Malformed payloads are
    /// `InvalidInput`.
    pub fn from_encoded(encoded: &str) -> Result<Self, crate::error::SiwxError> {
        use base64::{engine::general_purpose, Engine as _};
        let json = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| {
                crate::error::SiwxError::InvalidInput(format!("invalid base64 payload: {}", e))
            })?;
        serde_json::from_slice(&json).map_err(|e| {
            crate::error::SiwxError::InvalidInput(format!("invalid signature payload: {}", e))
        })
    }
}

/// Result of a verification call. Failures carry a generic error string and
/// no session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyOutcome {
    pub fn success(session: SessionView) -> Self {
        Self {
            is_valid: true,
            session: Some(session),
            error: None,
        }
    }

    pub fn failure(error: &crate::error::SiwxError) -> Self {
        Self {
            is_valid: false,
            session: None,
            error: Some(error.user_message().to_string()),
        }
    }
}
