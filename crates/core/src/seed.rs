//! Deterministic seed mixing and pseudo-random stream helpers.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};

/// Stream identifiers for the randomized components of a run.
pub mod streams {
    pub const GENERATOR: u64 = 1;
    pub const MUTATION: u64 = 2;
    pub const POLICY: u64 = 3;
    pub const OPERATOR_BASE: u64 = 0x100;
}

pub fn mix_seed_stream(seed: u64, stream: u64) -> u64 {
    let mut mixed = seed ^ stream.wrapping_mul(0xD6E8_FD9A_5B89_7A4D);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    mixed ^ (mixed >> 33)
}

pub fn derive_level_seed(run_seed: u64, level: u32) -> u64 {
    let mut mixed = run_seed ^ 0x9E37_79B9_7F4A_7C15;
    mixed ^= u64::from(level).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 30;
    mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 27;
    mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
    mixed ^ (mixed >> 31)
}

pub fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(mix_seed_stream(seed, stream))
}

/// Uniform draw from `min_value..=max_value`.
pub fn random_usize(rng: &mut ChaCha8Rng, min_value: usize, max_value: usize) -> usize {
    debug_assert!(min_value <= max_value);
    let range_size = (max_value - min_value) as u64 + 1;
    min_value + (rng.next_u64() % range_size) as usize
}

/// Uniform draw from `[0, 1)`.
pub fn random_unit(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
}

pub fn choose<'a, T>(rng: &mut ChaCha8Rng, slice: &'a [T]) -> Option<&'a T> {
    if slice.is_empty() {
        return None;
    }
    slice.get(random_usize(rng, 0, slice.len() - 1))
}
