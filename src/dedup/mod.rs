//! Content fingerprinting for near-duplicate detection
//!
//! Pages are reduced to a 64-bit SimHash: every whitespace-delimited token is
//! hashed, and each output bit is the majority vote of that bit across all
//! token hashes. Similar token multisets land a small Hamming distance apart,
//! so "is this page a near-copy of one already seen" becomes a bit count.

use sha2::{Digest, Sha256};
use std::fmt;

/// Number of bits in a fingerprint
pub const FINGERPRINT_BITS: u32 = 64;

/// A 64-bit locality-sensitive content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimHash(pub u64);

impl SimHash {
    /// Computes the fingerprint of a page's extracted text
    ///
    /// # Examples
    ///
    /// ```
    /// use anteater::SimHash;
    ///
    /// let a = SimHash::of("the quick brown fox");
    /// let b = SimHash::of("the quick brown fox");
    /// assert_eq!(a.distance(b), 0);
    /// ```
    pub fn of(text: &str) -> Self {
        let mut votes = [0i64; FINGERPRINT_BITS as usize];

        for token in text.split_whitespace() {
            let hash = token_hash(token);
            for (bit, vote) in votes.iter_mut().enumerate() {
                if hash & (1u64 << bit) != 0 {
                    *vote += 1;
                } else {
                    *vote -= 1;
                }
            }
        }

        let value = votes
            .iter()
            .enumerate()
            .filter(|(_, vote)| **vote > 0)
            .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit));

        SimHash(value)
    }

    /// Hamming distance: the number of differing bits
    pub fn distance(self, other: SimHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// True if `other` lies strictly closer than `threshold` bits
    pub fn is_near(self, other: SimHash, threshold: u32) -> bool {
        self.distance(other) < threshold
    }

    /// Bit pattern as stored in a signed SQLite integer column
    pub fn to_i64(self) -> i64 {
        self.0 as i64
    }

    pub fn from_i64(value: i64) -> Self {
        SimHash(value as u64)
    }
}

impl fmt::Display for SimHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Computes the fingerprint of `text`
pub fn fingerprint(text: &str) -> SimHash {
    SimHash::of(text)
}

/// Hamming distance between two fingerprints
pub fn distance(a: SimHash, b: SimHash) -> u32 {
    a.distance(b)
}

/// Wide, process-independent token hash: the first 8 bytes of SHA-256
fn token_hash(token: &str) -> u64 {
    let digest = Sha256::digest(token.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
