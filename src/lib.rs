//! Sign-In-With-X (SIWX) wallet authentication core.
//!
//! A client proves control of a blockchain address by signing a structured
//! challenge; the server verifies the signature under the rules of that
//! address's chain family (EVM ECDSA recovery or Solana Ed25519), then
//! issues a time-bounded session and a bearer token bound to it.
//!
//! [`service::SiwxService`] is the entry point; HTTP routing, user storage,
//! and rate limiting live outside this crate and consume it through
//! [`models`] and the [`store::SessionStore`] / [`provisioner::IdentityProvisioner`]
//! traits.

pub mod chain;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod message;
pub mod models;
pub mod nonce;
pub mod provisioner;
pub mod service;
pub mod store;
pub mod token;
pub mod verify;

pub use chain::ChainId;
pub use config::SiwxConfig;
pub use error::SiwxError;
pub use message::{MessageParams, SiwxMessage};
pub use models::{SessionStats, SessionView, SiwxSession, VerifyOutcome, VerifyRequest};
pub use service::SiwxService;
pub use store::{InMemorySessionStore, SessionStore};
