//! Content digest algorithms used for corruption detection in framed
//! entries. Non-cryptographic by design: these exist to catch torn
//! writes and bit rot, not to resist tampering.

use serde::{Deserialize, Serialize};

/// Selects the digest algorithm an [`crate::framing::EntrySerializer`]
/// uses for whole-payload and per-chunk digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashFunction {
    /// 128-bit xxHash3, the default.
    Xxh3_128,
}

impl Default for HashFunction {
    fn default() -> Self {
        HashFunction::Xxh3_128
    }
}

/// Computes a 128-bit content digest of `bytes` using `function`.
pub fn digest(function: HashFunction, bytes: &[u8]) -> u128 {
    match function {
        HashFunction::Xxh3_128 => xxhash_rust::xxh3::xxh3_128(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let a = digest(HashFunction::Xxh3_128, b"hello world");
        let b = digest(HashFunction::Xxh3_128, b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn digest_distinguishes_inputs() {
        let a = digest(HashFunction::Xxh3_128, b"hello");
        let b = digest(HashFunction::Xxh3_128, b"world");
        assert_ne!(a, b);
    }
}
