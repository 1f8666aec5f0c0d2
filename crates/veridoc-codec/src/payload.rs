//! Credential payload wire shapes.
//!
//! Two shapes exist in the field. New credentials are W3C-VC-style JSON
//! with an embedded proof block; documents stamped by early deployments
//! carry a flat `{id, hash, sig, issuer}` object. Parsing accepts both
//! and normalizes to [`CredentialPayload`]; encoding always emits the
//! rich shape.

use serde_json::{json, Map, Value};

use crate::error::CodecError;

/// Document identifier namespace in the rich shape.
pub const URN_PREFIX: &str = "urn:veridoc:";
/// Issuer identifier namespace in the rich shape.
pub const DID_PREFIX: &str = "did:veridoc:";

const CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";
const PROOF_TYPE: &str = "Ed25519Signature2020";
const PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// A credential normalized out of either wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPayload {
    pub document_id: String,
    /// Hex SHA-256 of the original (pre-stamp) document.
    pub document_hash: String,
    pub issuer_id: String,
    /// Base64 Ed25519 signature over the UTF-8 bytes of `document_hash`.
    pub signature: String,
    /// Merkle root for multi-page documents.
    pub merkle_root: Option<String>,
    pub credential_type: Option<String>,
}

/// Optional extras for the rich wire shape.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Issuer display name; when set, `holder` becomes an object.
    pub issuer_name: Option<String>,
    /// Credential type to advertise; defaults to `"VerifiableCredential"`.
    pub credential_type: Option<String>,
}

impl CredentialPayload {
    /// Parse a decoded JSON value, auto-detecting the wire shape.
    pub fn parse(value: &Value) -> Result<Self, CodecError> {
        let Some(object) = value.as_object() else {
            return Err(CodecError::PayloadMalformed(
                "payload is not a JSON object".into(),
            ));
        };

        if object.contains_key("@context") || object.contains_key("proof") {
            Self::from_rich(object)
        } else if object.contains_key("hash") || object.contains_key("sig") {
            Self::from_legacy(object)
        } else {
            Err(CodecError::PayloadMalformed(
                "unrecognized payload shape".into(),
            ))
        }
    }

    /// Parse the raw string content of a QR code.
    pub fn parse_str(raw: &str) -> Result<Self, CodecError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| CodecError::DecodeUnreadable(format!("invalid JSON: {e}")))?;
        Self::parse(&value)
    }

    fn from_rich(object: &Map<String, Value>) -> Result<Self, CodecError> {
        let document_id = object
            .get("id")
            .and_then(Value::as_str)
            .map(|id| strip_prefix(id, URN_PREFIX))
            .unwrap_or_default();

        // holder is either "did:...:<id>" or {"id": "did:...:<id>", "name": ...}
        let issuer_raw = match object.get("holder") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(holder)) => holder
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        };
        let issuer_id = strip_prefix(&issuer_raw, DID_PREFIX);

        let proof = object
            .get("proof")
            .and_then(Value::as_object)
            .ok_or_else(|| CodecError::PayloadMalformed("missing proof block".into()))?;

        let signature = proof
            .get("proofValue")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let document_hash = proof
            .get("documentHash")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if document_hash.is_empty() || signature.is_empty() {
            return Err(CodecError::PayloadMalformed(
                "missing documentHash or proofValue in proof".into(),
            ));
        }

        let merkle_root = proof
            .get("merkleRoot")
            .and_then(Value::as_str)
            .map(str::to_string);

        let credential_type = object
            .get("type")
            .and_then(Value::as_array)
            .and_then(|types| {
                types
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|t| *t != PRESENTATION_TYPE)
            })
            .map(str::to_string);

        Ok(Self {
            document_id,
            document_hash: document_hash.to_string(),
            issuer_id,
            signature: signature.to_string(),
            merkle_root,
            credential_type,
        })
    }

    fn from_legacy(object: &Map<String, Value>) -> Result<Self, CodecError> {
        let document_hash = object
            .get("hash")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let signature = object.get("sig").and_then(Value::as_str).unwrap_or_default();
        if document_hash.is_empty() || signature.is_empty() {
            return Err(CodecError::PayloadMalformed(
                "missing hash or sig in payload".into(),
            ));
        }

        Ok(Self {
            document_id: object
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            document_hash: document_hash.to_string(),
            issuer_id: object
                .get("issuer")
                .and_then(Value::as_str)
                .unwrap_or("legacy")
                .to_string(),
            signature: signature.to_string(),
            merkle_root: None,
            credential_type: None,
        })
    }

    /// Encode as the rich wire shape, compact JSON.
    pub fn to_wire_json(&self, options: &EncodeOptions) -> Result<String, CodecError> {
        let credential_type = options
            .credential_type
            .clone()
            .or_else(|| self.credential_type.clone())
            .unwrap_or_else(|| "VerifiableCredential".to_string());

        let holder = match &options.issuer_name {
            Some(name) => json!({
                "id": format!("{DID_PREFIX}{}", self.issuer_id),
                "name": name,
            }),
            None => Value::from(format!("{DID_PREFIX}{}", self.issuer_id)),
        };

        let mut proof = json!({
            "type": PROOF_TYPE,
            "verificationMethod": format!("{DID_PREFIX}{}#key-1", self.issuer_id),
            "proofValue": self.signature,
            "documentHash": self.document_hash,
        });
        if let Some(root) = &self.merkle_root {
            proof["merkleRoot"] = Value::from(root.as_str());
        }

        let payload = json!({
            "@context": CONTEXT,
            "type": [PRESENTATION_TYPE, credential_type],
            "id": format!("{URN_PREFIX}{}", self.document_id),
            "holder": holder,
            "proof": proof,
        });

        Ok(serde_json::to_string(&payload)?)
    }
}

fn strip_prefix(value: &str, prefix: &str) -> String {
    value.strip_prefix(prefix).unwrap_or(value).to_string()
}
