//! Challenge envelope, wire codec, and single-use nonce registry.
//!
//! A [`VerificationChallenge`] is the structure a wallet signs to prove it
//! controls an identity before commenting on a gated post. The codec pins
//! the exact byte shape of the signed message; the [`NonceStore`] makes
//! each issued challenge usable at most once.

pub mod codec;
pub mod nonce;

pub use nonce::{NonceStats, NonceStore};

use serde::{Deserialize, Serialize};

/// The signed-challenge envelope exchanged with the web tier.
///
/// Field names serialize in camelCase to match the JSON produced by the
/// challenge-issuance endpoint. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationChallenge {
    /// The smart-contract-wallet address being proven.
    pub identity_address: String,

    /// The post this challenge is scoped to.
    pub post_id: i64,

    /// Opaque single-use token.
    pub nonce: String,

    /// Issuance time, unix seconds.
    pub issued_at: i64,

    /// End of the validity window, unix seconds.
    pub expires_at: i64,

    /// Hex-encoded signature over the signing message, if the wallet has
    /// signed yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}
