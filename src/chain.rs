//! CAIP-2 chain identifiers.
//!
//! A chain id is `namespace:reference` (e.g. `eip155:1`, `solana:mainnet`).
//! The namespace selects the signature scheme; it is dispatched once at the
//! verifier boundary rather than threaded through the system as a string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A parsed CAIP-2 chain identifier.
///
/// Unknown namespaces are carried as `Unsupported` so that verification can
/// reject them with a typed reason instead of failing at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChainId {
    /// EVM chains, ECDSA recovery over the EIP-191 personal-message hash.
    Evm(String),
    /// Solana chains, Ed25519 over the raw signing string.
    Solana(String),
    /// Anything else; kept verbatim for error reporting.
    Unsupported(String),
}

impl ChainId {
    /// Parse a CAIP-2 string. The namespace is everything before the first
    /// `:`; a missing separator yields `Unsupported` with the whole input.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some(("eip155", reference)) => ChainId::Evm(reference.to_string()),
            Some(("solana", reference)) => ChainId::Solana(reference.to_string()),
            _ => ChainId::Unsupported(s.to_string()),
        }
    }

    /// The CAIP-2 namespace prefix.
    pub fn namespace(&self) -> &str {
        match self {
            ChainId::Evm(_) => "eip155",
            ChainId::Solana(_) => "solana",
            ChainId::Unsupported(s) => s.split(':').next().unwrap_or(s),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ChainId::Unsupported(_))
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainId::Evm(reference) => write!(f, "eip155:{}", reference),
            ChainId::Solana(reference) => write!(f, "solana:{}", reference),
            ChainId::Unsupported(s) => write!(f, "{}", s),
        }
    }
}

impl std::str::FromStr for ChainId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ChainId::parse(s))
    }
}

// On the wire a chain id is always the CAIP-2 string.
impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ChainId::parse(&s))
    }
}
