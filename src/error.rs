//! Error taxonomy for the verification engine.
//!
//! Every component returns a specific failure kind rather than a generic
//! error, so the web tier can translate each kind into an accurate HTTP
//! status and user-facing message. Nothing here is fatal to the process:
//! all failures are per-request.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure, used by callers to pick an HTTP
/// status family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or stale input, detected before any network call (400).
    ClientInput,
    /// Nonce already consumed or expired; the remedy is a fresh challenge (401).
    Replay,
    /// The proof or the on-chain state did not satisfy the gate (403).
    Denied,
    /// Every configured RPC endpoint failed; the verifier could not run (503).
    Unavailable,
    /// A declared requirement type is not yet supported; fail closed (501).
    PolicyUnsupported,
    /// Local misconfiguration or I/O failure (500).
    Internal,
}

/// Errors produced by the verification engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A challenge field is missing or malformed.
    #[error("Malformed challenge: {0}")]
    Format(String),

    /// The challenge's validity window has passed.
    #[error("Challenge has expired")]
    ChallengeExpired,

    /// The caller-asserted identity does not match the challenge.
    #[error("Challenge identity does not match the submitting address")]
    AddressMismatch,

    /// Gating is enabled for the target but no challenge was supplied.
    #[error("Verification challenge required for this post")]
    MissingChallenge,

    /// The challenge carries no signature.
    #[error("Challenge is missing a signature")]
    MissingSignature,

    /// The nonce was already consumed by an earlier submission.
    #[error("Challenge nonce has already been used")]
    NonceReplayed,

    /// The nonce record outlived its validity window unconsumed.
    #[error("Challenge nonce has expired")]
    NonceExpired,

    /// The identity contract rejected the signature.
    #[error("Signature verification failed")]
    InvalidSignature,

    /// The verifier could not be reached; distinct from a rejected proof.
    #[error("Verification temporarily unavailable: {0}")]
    VerificationUnavailable(String),

    /// On-chain balance below the declared threshold.
    #[error("Insufficient balance: required {required} wei, found {actual} wei")]
    InsufficientBalance {
        /// Threshold declared by the gating policy, in wei.
        required: String,
        /// Balance observed on chain, in wei.
        actual: String,
    },

    /// A declared requirement type has no checker yet.
    #[error("Requirement not supported: {0}")]
    NotImplemented(String),

    /// Every endpoint in the fallback list failed.
    #[error("All RPC endpoints failed: {last_error}")]
    RpcExhausted {
        /// The last endpoint's failure, kept for diagnostics.
        last_error: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error for HTTP status mapping.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Format(_)
            | Self::ChallengeExpired
            | Self::AddressMismatch
            | Self::MissingChallenge
            | Self::MissingSignature => ErrorClass::ClientInput,
            Self::NonceReplayed | Self::NonceExpired => ErrorClass::Replay,
            Self::InvalidSignature | Self::InsufficientBalance { .. } => ErrorClass::Denied,
            Self::VerificationUnavailable(_) | Self::RpcExhausted { .. } => {
                ErrorClass::Unavailable
            }
            Self::NotImplemented(_) => ErrorClass::PolicyUnsupported,
            Self::Config(_) | Self::Io(_) => ErrorClass::Internal,
        }
    }
}
