//! The single entry point the comment-creation flow calls.

use crate::challenge::{codec, NonceStore, VerificationChallenge};
use crate::error::{Error, Result};
use crate::rpc::Rpc;
use crate::verify::requirements::{verify_requirements, GatingSettings};
use crate::verify::signature::verify_signature;
use std::sync::Arc;
use tracing::{debug, info};

/// Composes challenge validation, nonce consumption, signature
/// verification and requirement checks into one pass/fail decision.
///
/// The pipeline is linear with no retries. Nonce consumption is
/// intentionally irreversible: a signature or requirement failure after
/// the nonce is consumed does not return it, so a wallet gets exactly one
/// attempt per issued challenge. That trades some user friction for never
/// having to reason about races between a nonce refund and a fresh
/// issuance.
pub struct GateVerifier<R: Rpc> {
    rpc: Arc<R>,
    nonces: NonceStore,
}

impl<R: Rpc> GateVerifier<R> {
    /// Create a verifier over a transport and a shared nonce store.
    ///
    /// Construct the store once at process start and share it; a fresh
    /// store per request would defeat replay protection.
    pub fn new(rpc: Arc<R>, nonces: NonceStore) -> Self {
        Self { rpc, nonces }
    }

    /// The shared nonce store, for issuance and sweeping.
    #[must_use]
    pub fn nonces(&self) -> &NonceStore {
        &self.nonces
    }

    /// Verify a comment submission against the target's gating settings.
    ///
    /// With gating disabled this is a no-op pass that touches nothing.
    /// Otherwise the checks run in a fixed order and the first failure
    /// wins; the only side effect on failure is the consumed nonce.
    ///
    /// # Errors
    ///
    /// Forwards each step's specific error untouched so the web tier can
    /// map it to an accurate HTTP status; see [`Error::class`].
    pub async fn verify_comment(
        &self,
        identity_address: &str,
        post_id: i64,
        challenge: Option<&VerificationChallenge>,
        settings: &GatingSettings,
    ) -> Result<()> {
        if !settings.enabled {
            debug!(post_id, "gating disabled, skipping verification");
            return Ok(());
        }

        let challenge = challenge.ok_or(Error::MissingChallenge)?;

        codec::validate_format(challenge)?;

        if codec::is_expired(challenge) {
            return Err(Error::ChallengeExpired);
        }

        if !identity_address.eq_ignore_ascii_case(&challenge.identity_address) {
            return Err(Error::AddressMismatch);
        }

        if challenge.post_id != post_id {
            return Err(Error::Format(format!(
                "challenge is scoped to post {}, not post {post_id}",
                challenge.post_id
            )));
        }

        // Irreversible past this point: the nonce is spent whether or not
        // the on-chain checks succeed.
        self.nonces
            .validate_and_consume(&challenge.nonce, identity_address, post_id)?;

        verify_signature(self.rpc.as_ref(), identity_address, challenge).await?;

        verify_requirements(self.rpc.as_ref(), identity_address, &settings.requirements).await?;

        info!(
            identity = identity_address,
            post_id, "comment verification passed"
        );
        Ok(())
    }
}
