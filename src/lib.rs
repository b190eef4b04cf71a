//! Challenge-response verification engine for gated commenting.
//!
//! Proves that a commenter controls a smart-contract-wallet identity and
//! satisfies a post's on-chain requirements before the comment is
//! persisted. The proof is a signed, single-use, time-boxed challenge
//! verified against the identity contract via ERC-1271
//! (`isValidSignature`) over raw JSON-RPC, with an ordered endpoint
//! fallback list and a process-wide nonce store for replay protection.
//!
//! The web tier stays outside this crate: it issues challenges with
//! [`challenge::codec::issue`], hands submissions to
//! [`GateVerifier::verify_comment`], and maps the returned
//! [`Error`] kind onto an HTTP status via [`Error::class`].
//!
//! ```no_run
//! use gate_verifier::{GateConfig, GateVerifier, NonceStore, RpcClient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> gate_verifier::Result<()> {
//! let config = GateConfig::default();
//! let rpc = Arc::new(RpcClient::new(&config.rpc)?);
//! let nonces = NonceStore::new();
//! let _sweeper = nonces.spawn_sweeper(Duration::from_secs(
//!     config.challenge.sweep_interval_secs,
//! ));
//! let verifier = GateVerifier::new(rpc, nonces);
//! # let _ = verifier;
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod config;
pub mod error;
pub mod rpc;
pub mod verify;

pub use challenge::{NonceStore, VerificationChallenge};
pub use config::GateConfig;
pub use error::{Error, ErrorClass, Result};
pub use rpc::{Rpc, RpcClient};
pub use verify::{GateVerifier, GatingRequirements, GatingSettings};
