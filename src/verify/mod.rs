//! Chain-dispatched signature verification.

pub mod evm;
pub mod solana;

use crate::chain::ChainId;
use crate::error::SiwxError;
use crate::message::SiwxMessage;

/// Verify `signature` over the canonical signing string of `message` for
/// `address` under the rules of `chain_id`'s namespace.
///
/// Pure CPU work; no I/O. Expected failures come back as typed errors,
/// `Ok(())` means the signature cryptographically matches the address.
pub fn verify_signature(
    message: &SiwxMessage,
    signature: &str,
    address: &str,
    chain_id: &ChainId,
) -> Result<(), SiwxError> {
    let signing_string = message.to_signing_string(address);
    match chain_id {
        ChainId::Evm(_) => evm::verify(&signing_string, signature, address),
        ChainId::Solana(_) => solana::verify(&signing_string, signature, address),
        ChainId::Unsupported(s) => Err(SiwxError::UnsupportedChain(s.clone())),
    }
}

/// Chain-specific address well-formedness check, used before any signature
/// work so malformed identities fail fast with `InvalidAddress`.
pub fn validate_address(address: &str, chain_id: &ChainId) -> Result<(), SiwxError> {
    match chain_id {
        ChainId::Evm(_) => evm::parse_address(address).map(|_| ()),
        ChainId::Solana(_) => solana::parse_address(address).map(|_| ()),
        ChainId::Unsupported(s) => Err(SiwxError::UnsupportedChain(s.clone())),
    }
}
