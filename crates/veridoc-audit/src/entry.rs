//! Audit entry model and canonical entry hashing.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::AuditError;

/// The auditable event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TenantOnboarded,
    KeyRotated,
    DocumentIssued,
    DocumentRevoked,
    VerificationSuccess,
    VerificationFailed,
}

impl EventType {
    /// The wire string, also used in the canonical hash input.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenantOnboarded => "tenant_onboarded",
            Self::KeyRotated => "key_rotated",
            Self::DocumentIssued => "document_issued",
            Self::DocumentRevoked => "document_revoked",
            Self::VerificationSuccess => "verification_success",
            Self::VerificationFailed => "verification_failed",
        }
    }
}

/// An event as submitted by the caller, before chain linking.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_type: EventType,
    pub tenant_id: Option<String>,
    pub document_id: Option<String>,
    pub document_hash: Option<String>,
    pub actor_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: BTreeMap<String, Value>,
}

impl AuditEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            tenant_id: None,
            document_id: None,
            document_hash: None,
            actor_id: None,
            ip_address: None,
            user_agent: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn document_hash(mut self, hash: impl Into<String>) -> Self {
        self.document_hash = Some(hash.into());
        self
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn client(mut self, ip: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip;
        self.user_agent = user_agent;
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// One link in the audit chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event_type: EventType,
    pub tenant_id: Option<String>,
    pub document_id: Option<String>,
    pub document_hash: Option<String>,
    pub actor_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: BTreeMap<String, Value>,
    /// 1-indexed position within this entry's scope.
    pub chain_position: u64,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
    /// `log_hash` of the preceding entry in the scope; `None` at position 1.
    pub previous_log_hash: Option<String>,
    /// Canonical hash of this entry.
    pub log_hash: String,
}

impl AuditEntry {
    /// Link an event into the chain: assign position and previous hash,
    /// stamp the time, and compute the canonical hash.
    pub fn link(
        event: AuditEvent,
        chain_position: u64,
        previous_log_hash: Option<String>,
    ) -> Result<Self, AuditError> {
        let mut entry = Self {
            event_type: event.event_type,
            tenant_id: event.tenant_id,
            document_id: event.document_id,
            document_hash: event.document_hash,
            actor_id: event.actor_id,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            metadata: event.metadata,
            chain_position,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            previous_log_hash,
            log_hash: String::new(),
        };
        entry.log_hash = entry.compute_hash()?;
        Ok(entry)
    }

    /// Canonical hash of the entry.
    ///
    /// SHA-256 over the compact JSON of the hash-input fields with keys in
    /// sorted order. Actor and client fields are deliberately excluded so
    /// the hash commits to what happened, not who reported it.
    pub fn compute_hash(&self) -> Result<String, AuditError> {
        let mut input: BTreeMap<&str, Value> = BTreeMap::new();
        input.insert("event_type", Value::from(self.event_type.as_str()));
        input.insert("tenant_id", opt_str(&self.tenant_id));
        input.insert("document_id", opt_str(&self.document_id));
        input.insert("document_hash", opt_str(&self.document_hash));
        input.insert("previous_log_hash", opt_str(&self.previous_log_hash));
        input.insert("chain_position", Value::from(self.chain_position));
        input.insert("created_at", Value::from(self.created_at.as_str()));
        input.insert(
            "metadata",
            Value::Object(
                self.metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        );

        let serialized = serde_json::to_string(&input)?;
        Ok(hex::encode(Sha256::digest(serialized.as_bytes())))
    }
}

fn opt_str(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::from(s.as_str()),
        None => Value::Null,
    }
}
