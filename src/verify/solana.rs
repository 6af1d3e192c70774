//! Ed25519 signature verification for Solana chains.
//!
//! A Solana address is the base58-encoded 32-byte public key; wallets sign
//! the raw UTF-8 bytes of the challenge string. Exactly one deterministic
//! verification is performed; there is no fallback to alternate message
//! encodings on mismatch.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::error::SiwxError;

/// Decode a base58 Solana address into its 32-byte public key.
pub fn parse_address(address: &str) -> Result<[u8; 32], SiwxError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SiwxError::InvalidAddress(format!("invalid base58 address: {}", e)))?;

    bytes.try_into().map_err(|_| {
        SiwxError::InvalidAddress("expected 32-byte public key".to_string())
    })
}

/// Verify an Ed25519 signature over the signing string.
///
/// `signature` is base58-encoded (64 bytes). Decode failures and
/// cryptographic mismatches are both `InvalidSignature`.
pub fn verify(signing_string: &str, signature: &str, address: &str) -> Result<(), SiwxError> {
    let pubkey_bytes = parse_address(address)?;

    let verifying_key =
        VerifyingKey::from_bytes(&pubkey_bytes).map_err(|_| SiwxError::InvalidSignature)?;

    let signature_bytes = bs58::decode(signature)
        .into_vec()
        .map_err(|_| SiwxError::InvalidSignature)?;
    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| SiwxError::InvalidSignature)?;
    let signature = Signature::from_bytes(&signature_array);

    verifying_key
        .verify(signing_string.as_bytes(), &signature)
        .map_err(|_| SiwxError::InvalidSignature)
}
