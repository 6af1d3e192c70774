//! Error taxonomy for the SIWX core.

/// Errors produced by message construction, signature verification, and
/// token/session validation.
#[derive(Debug, thiserror::Error)]
pub enum SiwxError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported chain namespace: {0}")]
    UnsupportedChain(String),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session revoked")]
    SessionRevoked,

    #[error("Session expired")]
    SessionExpired,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SiwxError {
    /// Client-facing rendering. Collapses the verification and token families
    /// into generic messages so the endpoint can't be used as an oracle for
    /// which internal check failed.
    pub fn user_message(&self) -> &'static str {
        match self {
            SiwxError::InvalidInput(_) => "invalid request",
            SiwxError::InvalidAddress(_)
            | SiwxError::UnsupportedChain(_)
            | SiwxError::InvalidSignature => "invalid signature",
            SiwxError::InvalidToken
            | SiwxError::SessionNotFound
            | SiwxError::SessionRevoked
            | SiwxError::SessionExpired => "invalid or expired token",
            SiwxError::Internal(_) => "internal error",
        }
    }
}
