use sha2::{Digest, Sha256};

use crate::id::RecordHash;

const FINGERPRINT_PREFIX: &str = "sha256:";

/// SHA-256 of a mutation payload, rendered as `sha256:<hex>`.
pub fn content_fingerprint(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    format!("{FINGERPRINT_PREFIX}{}", hex::encode(digest))
}

/// Domain-separated BLAKE3 hash: "warden\0trace\0" || version || body
pub fn record_hash(body: &[u8]) -> RecordHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"warden\0trace\0");
    hasher.update(&[1u8]); // version
    hasher.update(body);
    RecordHash::from_bytes(*hasher.finalize().as_bytes())
}
