//! ECDSA signature verification for EVM chains.
//!
//! Wallets sign the challenge with `personal_sign`, which hashes
//! `"\x19Ethereum Signed Message:\n" + len + message` with Keccak256 before
//! signing. We recover the signer from the 65-byte `r || s || v` signature
//! and compare it to the claimed address.

use alloy_primitives::{Address, Signature};

use crate::error::SiwxError;

/// Parse and validate a 20-byte hex EVM address.
pub fn parse_address(address: &str) -> Result<Address, SiwxError> {
    if !address.starts_with("0x") || address.len() != 42 {
        return Err(SiwxError::InvalidAddress(format!(
            "expected 0x-prefixed 20-byte hex address, got '{}'",
            address
        )));
    }
    address
        .parse::<Address>()
        .map_err(|e| SiwxError::InvalidAddress(format!("malformed EVM address: {}", e)))
}

/// Verify a personal-message signature by recovery.
///
/// `signature` is hex, with or without the `0x` prefix. Malformed signatures
/// and recovery failures are `InvalidSignature`, never a panic.
pub fn verify(signing_string: &str, signature: &str, address: &str) -> Result<(), SiwxError> {
    let expected = parse_address(address)?;

    let signature_hex = signature.strip_prefix("0x").unwrap_or(signature);
    let signature_bytes =
        hex::decode(signature_hex).map_err(|_| SiwxError::InvalidSignature)?;

    let signature =
        Signature::from_raw(&signature_bytes).map_err(|_| SiwxError::InvalidSignature)?;

    let recovered = signature
        .recover_address_from_msg(signing_string.as_bytes())
        .map_err(|_| SiwxError::InvalidSignature)?;

    // Address equality is over raw bytes, so hex casing never matters
    if recovered == expected {
        Ok(())
    } else {
        Err(SiwxError::InvalidSignature)
    }
}
