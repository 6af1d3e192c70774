//! Challenge message construction and canonical rendering.
//!
//! `to_signing_string` is the single source of the signable text. Message
//! construction and every chain verifier go through it; a second rendering
//! path would silently break all signature checks.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::error::SiwxError;

/// Default challenge lifetime when the caller does not override it.
const DEFAULT_EXPIRY_HOURS: i64 = 24;

/// The structured challenge a wallet signs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiwxMessage {
    pub domain: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: ChainId,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

/// Caller-supplied fields for building a message. `issued_at` is always set
/// by the server; `expiration_time` defaults to 24h out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageParams {
    pub domain: String,
    pub address: String,
    #[serde(default)]
    pub statement: Option<String>,
    pub uri: String,
    #[serde(default)]
    pub version: Option<String>,
    pub chain_id: ChainId,
    pub nonce: String,
    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub resources: Option<Vec<String>>,
}

impl SiwxMessage {
    /// Build a challenge from caller fields, stamping `issued_at` and the
    /// default expiry.
    pub fn build(params: MessageParams) -> Result<Self, SiwxError> {
        if params.address.trim().is_empty() {
            return Err(SiwxError::InvalidInput("address is required".to_string()));
        }
        if params.domain.trim().is_empty() {
            return Err(SiwxError::InvalidInput("domain is required".to_string()));
        }
        if params.nonce.trim().is_empty() {
            return Err(SiwxError::InvalidInput("nonce is required".to_string()));
        }
        if !params.chain_id.is_supported() {
            return Err(SiwxError::InvalidInput(format!(
                "chainId '{}' is not a supported CAIP-2 identifier",
                params.chain_id
            )));
        }

        let issued_at = Utc::now();
        let expiration_time = params
            .expiration_time
            .or_else(|| Some(issued_at + Duration::hours(DEFAULT_EXPIRY_HOURS)));

        Ok(SiwxMessage {
            domain: params.domain,
            address: params.address,
            statement: params.statement,
            uri: params.uri,
            version: params.version.unwrap_or_else(|| "1".to_string()),
            chain_id: params.chain_id,
            nonce: params.nonce,
            issued_at,
            expiration_time,
            not_before: params.not_before,
            request_id: params.request_id,
            resources: params.resources,
        })
    }

    /// Render the canonical EIP-4361-style signing string.
    ///
    /// `address` is always the externally validated address, never
    /// `self.address`: a payload claiming a different address than the one
    /// being verified must not change what the signature covers.
    pub fn to_signing_string(&self, address: &str) -> String {
        let mut out = format!(
            "{} wants you to sign in with your account:\n{}\n",
            self.domain, address
        );

        if let Some(statement) = &self.statement {
            out.push('\n');
            out.push_str(statement);
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&format!("URI: {}\n", self.uri));
        out.push_str(&format!("Version: {}\n", self.version));
        out.push_str(&format!("Chain ID: {}\n", self.chain_id));
        out.push_str(&format!("Nonce: {}\n", self.nonce));
        out.push_str(&format!("Issued At: {}", rfc3339(&self.issued_at)));

        if let Some(expiration_time) = &self.expiration_time {
            out.push_str(&format!("\nExpiration Time: {}", rfc3339(expiration_time)));
        }
        if let Some(not_before) = &self.not_before {
            out.push_str(&format!("\nNot Before: {}", rfc3339(not_before)));
        }
        if let Some(request_id) = &self.request_id {
            out.push_str(&format!("\nRequest ID: {}", request_id));
        }
        if let Some(resources) = &self.resources {
            out.push_str("\nResources:");
            for resource in resources {
                out.push_str(&format!("\n- {}", resource));
            }
        }

        out
    }
}

fn rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
