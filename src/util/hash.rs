use sha2::{Digest, Sha256};

/// Derives a stable 64-bit id from a URL.
///
/// Feed sources and feed items are keyed by their URL; the id must survive
/// restarts and be identical across platforms, so it is taken from the first
/// eight bytes of the URL's SHA-256 digest rather than a process-seeded
/// hasher.
pub fn stable_id(url: &str) -> i64 {
    let digest = Sha256::digest(url.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}
