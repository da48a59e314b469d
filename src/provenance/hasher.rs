//! BLAKE3 hashing for state checksums.

/// Compute a composite hash from multiple components, order-sensitive.
/// Returns `"blake3:{hex}"`.
pub fn composite_hash(components: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in components {
        hasher.update(c.as_bytes());
        hasher.update(b"\0");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}
