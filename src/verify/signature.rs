//! ERC-1271 signature verification against a smart-contract identity.
//!
//! Smart-contract wallets cannot be verified by ECDSA recovery; the
//! contract itself is asked whether it considers the signature valid via
//! `isValidSignature(bytes32,bytes)`. The call is read-only and executed
//! through the fallback RPC client.

use crate::challenge::{codec, VerificationChallenge};
use crate::error::{Error, Result};
use crate::rpc::Rpc;
use crate::verify::abi;
use serde_json::json;
use tracing::{debug, warn};

/// Prove that the challenge's signature was produced by the identity it
/// names.
///
/// Local checks (format, expiry, address match, signature presence) run
/// before any network call; only a locally-sound challenge reaches
/// `eth_call`.
///
/// # Errors
///
/// * [`Error::Format`] for a malformed challenge.
/// * [`Error::ChallengeExpired`] past the validity window.
/// * [`Error::AddressMismatch`] if the caller-asserted identity differs
///   from the challenge's.
/// * [`Error::MissingSignature`] when no signature is attached.
/// * [`Error::InvalidSignature`] when the contract rejects the proof.
/// * [`Error::VerificationUnavailable`] when every RPC endpoint failed;
///   distinct from rejection, because the proof was never evaluated.
pub async fn verify_signature<R: Rpc>(
    rpc: &R,
    asserted_identity: &str,
    challenge: &VerificationChallenge,
) -> Result<()> {
    codec::validate_format(challenge)?;

    if codec::is_expired(challenge) {
        return Err(Error::ChallengeExpired);
    }

    if !asserted_identity.eq_ignore_ascii_case(&challenge.identity_address) {
        return Err(Error::AddressMismatch);
    }

    let Some(signature_hex) = &challenge.signature else {
        return Err(Error::MissingSignature);
    };
    // Format validation already guarantees well-formed hex.
    let signature = hex::decode(signature_hex.trim_start_matches("0x"))
        .map_err(|e| Error::Format(format!("signature is not valid hex: {e}")))?;

    let message = codec::signing_message(challenge);
    let digest = abi::personal_message_hash(&message);
    let call_data = abi::encode_is_valid_signature(&digest, &signature);

    debug!(
        identity = %challenge.identity_address,
        post_id = challenge.post_id,
        "querying isValidSignature"
    );

    let result = rpc
        .call(
            "eth_call",
            vec![
                json!({
                    "to": challenge.identity_address,
                    "data": format!("0x{}", hex::encode(&call_data)),
                }),
                json!("latest"),
            ],
        )
        .await
        .map_err(|e| match e {
            Error::RpcExhausted { last_error } => Error::VerificationUnavailable(last_error),
            other => other,
        })?;

    let result_hex = result
        .as_str()
        .ok_or_else(|| Error::VerificationUnavailable("eth_call returned a non-string".into()))?;

    if abi::result_matches_magic(result_hex) {
        debug!(identity = %challenge.identity_address, "contract accepted signature");
        Ok(())
    } else {
        warn!(
            identity = %challenge.identity_address,
            post_id = challenge.post_id,
            "contract rejected signature"
        );
        Err(Error::InvalidSignature)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::rpc::Rpc;
    use chrono::Utc;
    use parking_lot::Mutex;
    use serde_json::Value;

    /// Canned transport: returns a fixed result and records call payloads.
    struct MockRpc {
        result: Result<Value>,
        calls: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl MockRpc {
        fn returning(value: Value) -> Self {
            Self {
                result: Ok(value),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn exhausted() -> Self {
            Self {
                result: Err(Error::RpcExhausted {
                    last_error: "connection refused".into(),
                }),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Rpc for MockRpc {
        async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
            self.calls.lock().push((method.to_string(), params));
            match &self.result {
                Ok(v) => Ok(v.clone()),
                Err(Error::RpcExhausted { last_error }) => Err(Error::RpcExhausted {
                    last_error: last_error.clone(),
                }),
                Err(_) => Err(Error::InvalidSignature),
            }
        }
    }

    const MAGIC: &str = "0x1626ba7e00000000000000000000000000000000000000000000000000000000";
    const NOT_MAGIC: &str = "0xffffffff00000000000000000000000000000000000000000000000000000000";
    const IDENTITY: &str = "0xAbCd000000000000000000000000000000001234";

    fn live_challenge() -> VerificationChallenge {
        let now = Utc::now().timestamp();
        VerificationChallenge {
            identity_address: IDENTITY.to_string(),
            post_id: 42,
            nonce: "n1".to_string(),
            issued_at: now,
            expires_at: now + 300,
            signature: Some("0xdeadbeef".to_string()),
        }
    }

    #[tokio::test]
    async fn test_magic_value_accepts() {
        let rpc = MockRpc::returning(json!(MAGIC));
        verify_signature(&rpc, IDENTITY, &live_challenge())
            .await
            .expect("magic value passes");

        let calls = rpc.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "eth_call");
        let data = calls[0].1[0]["data"].as_str().expect("data field");
        assert!(data.starts_with("0x1626ba7e"), "selector leads the calldata");
        assert_eq!(calls[0].1[1], json!("latest"));
    }

    #[tokio::test]
    async fn test_non_magic_result_rejects() {
        let rpc = MockRpc::returning(json!(NOT_MAGIC));
        let err = verify_signature(&rpc, IDENTITY, &live_challenge())
            .await
            .expect_err("wrong prefix rejected");
        assert!(matches!(err, Error::InvalidSignature));
    }

    #[tokio::test]
    async fn test_rpc_exhaustion_is_unavailable_not_invalid() {
        let rpc = MockRpc::exhausted();
        let err = verify_signature(&rpc, IDENTITY, &live_challenge())
            .await
            .expect_err("unreachable verifier");
        assert!(
            matches!(err, Error::VerificationUnavailable(_)),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_address_mismatch_detected_before_network() {
        let rpc = MockRpc::returning(json!(MAGIC));
        let err = verify_signature(
            &rpc,
            "0x0000000000000000000000000000000000000001",
            &live_challenge(),
        )
        .await
        .expect_err("mismatched identity");
        assert!(matches!(err, Error::AddressMismatch));
        assert!(rpc.calls.lock().is_empty(), "no network call was made");
    }

    #[tokio::test]
    async fn test_address_compare_is_case_insensitive() {
        let rpc = MockRpc::returning(json!(MAGIC));
        verify_signature(&rpc, &IDENTITY.to_ascii_lowercase(), &live_challenge())
            .await
            .expect("case difference is not a mismatch");
    }

    #[tokio::test]
    async fn test_expired_challenge_rejected_before_network() {
        let rpc = MockRpc::returning(json!(MAGIC));
        let mut challenge = live_challenge();
        challenge.issued_at -= 600;
        challenge.expires_at = Utc::now().timestamp() - 1;

        let err = verify_signature(&rpc, IDENTITY, &challenge)
            .await
            .expect_err("expired");
        assert!(matches!(err, Error::ChallengeExpired));
        assert!(rpc.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_signature_rejected_before_network() {
        let rpc = MockRpc::returning(json!(MAGIC));
        let mut challenge = live_challenge();
        challenge.signature = None;

        let err = verify_signature(&rpc, IDENTITY, &challenge)
            .await
            .expect_err("no signature");
        assert!(matches!(err, Error::MissingSignature));
        assert!(rpc.calls.lock().is_empty());
    }
}
