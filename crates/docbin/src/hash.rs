//! String hashing for the string store

pub type StrHash = u64;

/// Hash a string to its store key: the first 8 bytes (LE) of BLAKE3(s).
/// The empty string is reserved as 0 and marks an unset attribute.
pub fn hash_string(s: &str) -> StrHash {
    if s.is_empty() {
        return 0;
    }
    let digest = blake3::hash(s.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}
