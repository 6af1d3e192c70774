//! Identity provisioning boundary.
//!
//! After a successful verification the orchestrator ensures a user record
//! exists for the address. Provisioning is best-effort: failures are logged
//! by the caller, never propagated into the authentication result.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// A user record owned by the external identity system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub address: String,
    pub chain_id: ChainId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("Provisioning failed: {0}")]
pub struct ProvisioningError(pub String);

/// External collaborator that maps verified addresses to user records.
#[async_trait]
pub trait IdentityProvisioner: Send + Sync {
    async fn get_by_address(
        &self,
        chain_id: &ChainId,
        address: &str,
    ) -> Result<Option<Identity>, ProvisioningError>;

    async fn create_from_address(
        &self,
        chain_id: &ChainId,
        address: &str,
    ) -> Result<Identity, ProvisioningError>;
}

/// In-process provisioner for tests and bootstrap deployments.
#[derive(Default)]
pub struct InMemoryIdentityProvisioner {
    identities: Mutex<HashMap<(String, String), Identity>>,
}

impl InMemoryIdentityProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(chain_id: &ChainId, address: &str) -> (String, String) {
        (chain_id.to_string(), address.to_lowercase())
    }
}

#[async_trait]
impl IdentityProvisioner for InMemoryIdentityProvisioner {
    async fn get_by_address(
        &self,
        chain_id: &ChainId,
        address: &str,
    ) -> Result<Option<Identity>, ProvisioningError> {
        let identities = self
            .identities
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        Ok(identities.get(&Self::key(chain_id, address)).cloned())
    }

    async fn create_from_address(
        &self,
        chain_id: &ChainId,
        address: &str,
    ) -> Result<Identity, ProvisioningError> {
        let identity = Identity {
            id: nanoid::nanoid!(12),
            address: address.to_string(),
            chain_id: chain_id.clone(),
            created_at: Utc::now(),
        };
        let mut identities = self
            .identities
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        identities.insert(Self::key(chain_id, address), identity.clone());
        Ok(identity)
    }
}
