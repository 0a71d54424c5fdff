//! Deterministic random streams
//!
//! Every worker thread owns its own [`RandomStream`], so offset selection is
//! lock-free and reproducible per thread. The same generator also derives the
//! shared write-payload buffer once at startup.
//!
//! The generator is MT19937 (via `rand_mt`): a full 2^19937-1 period and
//! uniform 32-bit output, which keeps random offsets from cycling even over
//! very long duration phases. Seed entropy comes from the `rand` system
//! generator when the user does not pin a seed.

use rand_mt::Mt;

/// Size of the shared random write-payload buffer
pub const RANDOM_DATA_BYTES: usize = 1 << 20;

/// Seeded, deterministic generator of 32-bit random values
///
/// Not thread-safe and does not need to be: instances are never shared.
#[derive(Clone)]
pub struct RandomStream {
    mt: Mt,
}

impl RandomStream {
    /// Create a stream with a fixed seed
    pub fn seeded(seed: u32) -> Self {
        Self { mt: Mt::new(seed) }
    }

    /// Create a stream seeded from the system generator
    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }

    /// Reinitialize the internal state from a scalar seed
    pub fn reseed(&mut self, seed: u32) {
        self.mt = Mt::new(seed);
    }

    /// Next value, uniform over the full 32-bit range
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.mt.next_u32()
    }

    /// Pick a block-aligned offset strictly below `target_size`
    ///
    /// `block_size` must be nonzero and no larger than `target_size`; both are
    /// validated at configuration time.
    #[inline]
    pub fn block_offset(&mut self, target_size: u64, block_size: u64) -> u64 {
        let blocks = target_size / block_size;
        (u64::from(self.next_u32()) % blocks) * block_size
    }
}

/// Derive the shared write-payload buffer from a seed
///
/// The buffer is populated word-by-word from a fresh stream, so a sequential
/// write phase's on-disk content can be re-derived later from the same seed.
pub fn fill_random_data(seed: u32, len: usize) -> Vec<u8> {
    let mut stream = RandomStream::seeded(seed);
    let mut data = vec![0u8; len];
    for chunk in data.chunks_exact_mut(4) {
        chunk.copy_from_slice(&stream.next_u32().to_le_bytes());
    }
    data
}
