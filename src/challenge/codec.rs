//! Challenge format rules and the signing-message renderer.
//!
//! The signing message must be byte-identical between issuance and
//! verification; any whitespace or ordering drift silently invalidates
//! every signature in flight. Changes here are wire-format changes.

use crate::challenge::{NonceStore, VerificationChallenge};
use crate::error::{Error, Result};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated challenge nonces.
const NONCE_LEN: usize = 32;

/// Check that a string is a well-formed 20-byte hex account address.
#[must_use]
pub fn is_well_formed_address(addr: &str) -> bool {
    let Some(body) = addr.strip_prefix("0x") else {
        return false;
    };
    body.len() == 40 && body.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Check that a string is a well-formed 0x-prefixed hex blob of even length.
#[must_use]
pub fn is_well_formed_hex(value: &str) -> bool {
    let Some(body) = value.strip_prefix("0x") else {
        return false;
    };
    !body.is_empty() && body.len() % 2 == 0 && body.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Validate that every required field is present and well-typed.
///
/// # Errors
///
/// Returns [`Error::Format`] naming the first malformed field.
pub fn validate_format(challenge: &VerificationChallenge) -> Result<()> {
    if !is_well_formed_address(&challenge.identity_address) {
        return Err(Error::Format(format!(
            "identityAddress is not a valid account address: {}",
            challenge.identity_address
        )));
    }
    if challenge.post_id <= 0 {
        return Err(Error::Format(format!(
            "postId must be a positive integer, got {}",
            challenge.post_id
        )));
    }
    if challenge.nonce.is_empty() {
        return Err(Error::Format("nonce must be a non-empty string".to_string()));
    }
    if challenge.expires_at <= challenge.issued_at {
        return Err(Error::Format(
            "expiresAt must be after issuedAt".to_string(),
        ));
    }
    if let Some(signature) = &challenge.signature {
        if !is_well_formed_hex(signature) {
            return Err(Error::Format(
                "signature must be 0x-prefixed hex of even length".to_string(),
            ));
        }
    }
    Ok(())
}

/// Whether the challenge's validity window has passed. No grace window.
#[must_use]
pub fn is_expired(challenge: &VerificationChallenge) -> bool {
    Utc::now().timestamp() >= challenge.expires_at
}

/// Render the exact human-readable message the wallet signs.
///
/// Embeds the identity address, post id, nonce and issuance timestamp so a
/// signature over one challenge cannot be replayed against another.
#[must_use]
pub fn signing_message(challenge: &VerificationChallenge) -> String {
    format!(
        "Verify your identity to comment\n\nIdentity: {}\nPost: {}\nNonce: {}\nIssued At: {}",
        challenge.identity_address, challenge.post_id, challenge.nonce, challenge.issued_at
    )
}

/// Issue a fresh challenge for an identity and post, registering its nonce.
///
/// The signing message rendered from the returned challenge is what the
/// wallet must sign; verification later reconstructs it from the same
/// fields.
///
/// # Errors
///
/// Returns [`Error::Format`] if the identity address is malformed or the
/// post id is not positive.
pub fn issue(
    identity_address: &str,
    post_id: i64,
    ttl_secs: i64,
    nonces: &NonceStore,
) -> Result<VerificationChallenge> {
    if !is_well_formed_address(identity_address) {
        return Err(Error::Format(format!(
            "cannot issue challenge for malformed address: {identity_address}"
        )));
    }
    if post_id <= 0 {
        return Err(Error::Format(format!(
            "cannot issue challenge for non-positive post id: {post_id}"
        )));
    }

    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect();

    let issued_at = Utc::now().timestamp();
    let expires_at = issued_at + ttl_secs;
    nonces.register(&nonce, identity_address, post_id, expires_at);

    Ok(VerificationChallenge {
        identity_address: identity_address.to_string(),
        post_id,
        nonce,
        issued_at,
        expires_at,
        signature: None,
    })
}
