//! Hand-rolled codec for the single contract call this engine makes:
//! `isValidSignature(bytes32,bytes)` per ERC-1271.
//!
//! A full contract-binding library is deliberately avoided; one fixed-shape
//! call is small enough to encode by hand and pin with byte-exact tests.
//! Do not generalize this into an ABI library unless more contract methods
//! are added.

use sha3::{Digest, Keccak256};

/// ERC-1271 magic value, also the 4-byte selector of
/// `isValidSignature(bytes32,bytes)`.
pub const ERC1271_MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Prefix of the standard personal-message signing scheme.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Hash a message the way `personal_sign` does: prefix, decimal byte
/// length, message bytes, then keccak256.
///
/// The wallet's signing flow used exactly this scheme; any drift here
/// silently yields `InvalidSignature` rather than a crash.
#[must_use]
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// ABI-encode a call to `isValidSignature(bytes32 hash, bytes signature)`.
///
/// Layout: 4-byte selector, the 32-byte digest, the offset word (`0x40`,
/// the dynamic `bytes` head starts after the two argument words), the
/// length word, then the signature bytes right-padded to a 32-byte
/// boundary.
#[must_use]
pub fn encode_is_valid_signature(digest: &[u8; 32], signature: &[u8]) -> Vec<u8> {
    let padded_len = signature.len().div_ceil(32) * 32;
    let mut data = Vec::with_capacity(4 + 96 + padded_len);
    data.extend_from_slice(&ERC1271_MAGIC_VALUE);
    data.extend_from_slice(digest);
    data.extend_from_slice(&abi_word(0x40));
    data.extend_from_slice(&abi_word(signature.len() as u64));
    data.extend_from_slice(signature);
    data.resize(data.len() + (padded_len - signature.len()), 0);
    data
}

/// Whether an `eth_call` result begins with the ERC-1271 magic value.
///
/// Contracts return the magic value left-aligned in a 32-byte word; only
/// the first 4 bytes are significant.
#[must_use]
pub fn result_matches_magic(result: &str) -> bool {
    let Some(body) = result.strip_prefix("0x") else {
        return false;
    };
    let Ok(bytes) = hex::decode(body) else {
        return false;
    };
    bytes.len() >= 4 && bytes[..4] == ERC1271_MAGIC_VALUE
}

/// A u64 left-padded into a 32-byte big-endian ABI word.
fn abi_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}
