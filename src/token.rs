//! Bearer-token issuance and validation.
//!
//! Tokens are HS256 JWTs carrying the session identity. A structurally valid
//! token is never sufficient on its own: the orchestrator re-resolves the
//! session from the store, so revocation takes effect immediately.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::SiwxError;
use crate::models::SiwxSession;

const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims embedded in a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionTokenClaims {
    /// Session id.
    pub sub: String,
    pub address: String,
    pub chain_id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and validates session tokens with a server-held HMAC secret,
/// loaded once at startup.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &Zeroizing<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a bearer token for a freshly created session.
    pub fn issue(&self, session: &SiwxSession) -> Result<String, SiwxError> {
        let claims = SessionTokenClaims {
            sub: session.id.clone(),
            address: session.address.clone(),
            chain_id: session.chain_id.to_string(),
            iat: session.issued_at.timestamp(),
            exp: session.expires_at.timestamp(),
        };
        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| SiwxError::Internal(format!("token encoding failed: {}", e)))
    }

    /// Verify integrity and the expiry claim, returning the embedded
    /// identity. Expired tokens are `SessionExpired`; every other failure is
    /// `InvalidToken`.
    pub fn decode(&self, token: &str) -> Result<SessionTokenClaims, SiwxError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;

        match decode::<SessionTokenClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                Err(SiwxError::SessionExpired)
            }
            Err(_) => Err(SiwxError::InvalidToken),
        }
    }
}
