//! Explicit seed threading.
//!
//! Every random draw in the crate goes through a [`PrngKey`]. There is no ambient
//! generator: callers pass keys in, and split them whenever they need more than
//! one independent draw.
//!
//! - [`PrngKey`]: an explicit, consumable random key
//! - [`SeedSequence`]: expands a 64-bit seed into deterministic sub-seeds
//! - [`RngStream`]: the reproducible PRNG a key turns into (ChaCha8)

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Type alias for the default RNG stream used across the crate.
pub type RngStream = ChaCha8Rng;

/// SplitMix64 mixer used to expand a 64-bit seed into a sequence of pseudo-random u64 values.
#[derive(Clone, Debug)]
pub struct SeedSequence {
    state: u64,
}

impl SeedSequence {
    /// Create a new seed sequence from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next sub-seed deterministically.
    pub fn next_subseed(&mut self) -> u64 {
        // Weyl increment; the state never revisits a value within 2^64 draws.
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    /// Produce `n` sub-seeds deterministically from this sequence.
    pub fn split_n(&mut self, n: usize) -> Vec<u64> {
        (0..n).map(|_| self.next_subseed()).collect()
    }
}

/// An explicit random key.
///
/// Keys are deliberately not `Copy`: the consuming methods take `self`, so
/// drawing twice from the same key requires a visible `clone()`. Use
/// [`PrngKey::split`] to obtain decorrelated keys for independent draws.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PrngKey(u64);

impl PrngKey {
    /// Build a root key from a user seed.
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// The raw 64-bit key material.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Split into `n` independent sub-keys. Order is stable: sub-key `i` is the
    /// same for a given key and `n`.
    pub fn split(self, n: usize) -> Vec<PrngKey> {
        SeedSequence::new(self.0)
            .split_n(n)
            .into_iter()
            .map(PrngKey)
            .collect()
    }

    /// Split into exactly two sub-keys.
    pub fn split2(self) -> (PrngKey, PrngKey) {
        let mut seq = SeedSequence::new(self.0);
        let a = seq.next_subseed();
        let b = seq.next_subseed();
        (PrngKey(a), PrngKey(b))
    }

    /// Derive a new key by mixing `data` into this one, e.g. a lane index or a
    /// step counter.
    pub fn fold_in(self, data: u64) -> PrngKey {
        let mixed = self.0 ^ data.wrapping_mul(0xD6E8FEB86659FD93);
        PrngKey(SeedSequence::new(mixed).next_subseed())
    }

    /// Consume the key into a generator. This is the only way to draw numbers.
    pub fn into_rng(self) -> RngStream {
        RngStream::seed_from_u64(self.0)
    }
}

impl From<u64> for PrngKey {
    fn from(seed: u64) -> Self {
        PrngKey::new(seed)
    }
}

/// Split a root seed into N sub-keys (convenience helper).
pub fn split_n(seed: u64, n: usize) -> Vec<PrngKey> {
    PrngKey::new(seed).split(n)
}
