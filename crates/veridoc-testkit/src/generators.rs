//! Proptest generators for property-based testing.

use proptest::prelude::*;

use veridoc_audit::{AuditEvent, EventType};
use veridoc_codec::CredentialPayload;
use veridoc_vault::Keypair;

/// A 64-char lowercase hex fingerprint.
pub fn fingerprint() -> impl Strategy<Value = String> {
    any::<[u8; 32]>().prop_map(hex::encode)
}

/// A deterministic keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// A non-empty Merkle leaf list of short hex strings.
pub fn leaf_list(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::collection::vec(any::<u8>(), 1..=8).prop_map(hex::encode),
        1..=max_len,
    )
}

/// A plausible identifier: short, printable, no namespace prefix.
pub fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,23}"
}

/// A normalized credential payload.
pub fn credential_payload() -> impl Strategy<Value = CredentialPayload> {
    (
        identifier(),
        fingerprint(),
        identifier(),
        prop::collection::vec(any::<u8>(), 64..=64),
        prop::option::of(fingerprint()),
        prop::option::of(identifier()),
    )
        .prop_map(
            |(document_id, document_hash, issuer_id, sig_bytes, merkle_root, credential_type)| {
                use base64::engine::general_purpose::STANDARD as BASE64;
                use base64::Engine;
                CredentialPayload {
                    document_id,
                    document_hash,
                    issuer_id,
                    signature: BASE64.encode(sig_bytes),
                    merkle_root,
                    credential_type,
                }
            },
        )
}

/// Any audit event type.
pub fn event_type() -> impl Strategy<Value = EventType> {
    prop_oneof![
        Just(EventType::TenantOnboarded),
        Just(EventType::KeyRotated),
        Just(EventType::DocumentIssued),
        Just(EventType::DocumentRevoked),
        Just(EventType::VerificationSuccess),
        Just(EventType::VerificationFailed),
    ]
}

/// A sequence of audit events, all bound to the same optional tenant so
/// they land in one chain scope.
pub fn event_sequence(max_len: usize) -> impl Strategy<Value = Vec<AuditEvent>> {
    (
        prop::option::of(identifier()),
        prop::collection::vec((event_type(), prop::option::of(fingerprint())), 1..=max_len),
    )
        .prop_map(|(tenant_id, kinds)| {
            kinds
                .into_iter()
                .map(|(event_type, document_hash)| {
                    let mut event = AuditEvent::new(event_type);
                    if let Some(tenant) = &tenant_id {
                        event = event.tenant(tenant.clone());
                    }
                    if let Some(hash) = document_hash {
                        event = event.document_hash(hash);
                    }
                    event
                })
                .collect()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridoc_codec::EncodeOptions;
    use veridoc_core::MerkleTree;

    proptest! {
        #[test]
        fn prop_payload_wire_roundtrip(payload in credential_payload()) {
            let wire = payload.to_wire_json(&EncodeOptions::default()).unwrap();
            let parsed = CredentialPayload::parse_str(&wire).unwrap();

            // Encoding defaults an absent credential type.
            let mut expected = payload;
            expected.credential_type = expected
                .credential_type
                .or_else(|| Some("VerifiableCredential".into()));
            prop_assert_eq!(parsed, expected);
        }

        #[test]
        fn prop_all_proofs_verify(leaves in leaf_list(16)) {
            let tree = MerkleTree::build(leaves.clone());
            for index in 0..leaves.len() {
                let proof = tree.proof(index).unwrap();
                prop_assert!(proof.verify());
            }
        }

        #[test]
        fn prop_signing_is_deterministic(kp in keypair(), fp in fingerprint()) {
            let s1 = kp.sign(fp.as_bytes());
            let s2 = kp.sign(fp.as_bytes());
            prop_assert_eq!(s1, s2);
            prop_assert!(kp.public_key().verify(fp.as_bytes(), &s1));
        }
    }
}
