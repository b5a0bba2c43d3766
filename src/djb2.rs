//! djb2 string hashing as a `BuildHasher`.
//!
//! `ChainedTable` feeds raw key bytes straight into `Hasher::write`, so the
//! value reported by `finish` is exactly djb2 of the key (no length or
//! terminator byte mixed in).

use core::hash::{BuildHasher, Hasher};

const SEED: u64 = 5381;

/// Builder for [`Djb2Hasher`]. Stateless and deterministic.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Djb2State;

impl BuildHasher for Djb2State {
    type Hasher = Djb2Hasher;

    fn build_hasher(&self) -> Djb2Hasher {
        Djb2Hasher::default()
    }
}

/// Rolling `hash * 33 + byte` hasher seeded at 5381.
#[derive(Copy, Clone, Debug)]
pub struct Djb2Hasher {
    hash: u64,
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self { hash: SEED }
    }
}

impl Hasher for Djb2Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.hash = self.hash.wrapping_mul(33).wrapping_add(u64::from(b));
        }
    }

    /// Truncated to 32 bits.
    #[inline]
    fn finish(&self) -> u64 {
        self.hash & 0xFFFF_FFFF
    }
}

/// djb2 of `bytes`, truncated to 32 bits.
pub fn djb2(bytes: &[u8]) -> u64 {
    let mut h = Djb2Hasher::default();
    h.write(bytes);
    h.finish()
}
