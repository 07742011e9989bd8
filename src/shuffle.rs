//! Deterministic token assignment.
//!
//! The permutation depends only on the input order and the seed. The
//! pseudo-random transform below is part of the published assignment
//! protocol: any change to it reassigns every token, so it is versioned
//! through [`SHUFFLE_PROTOCOL_VERSION`].

use crate::asset::Asset;
use sha2::{Digest, Sha256};

/// Version of the seeded transform and shuffle loop
pub const SHUFFLE_PROTOCOL_VERSION: u32 = 1;

/// Map a numeric seed into `[0, 1)` as `frac(sin(x) * 10000)`
///
/// `sin` comes from `libm` so the result does not vary with the host C library.
pub fn seeded_random(x: f64) -> f64 {
    let scaled = libm::sin(x) * 10000.0;
    scaled - libm::floor(scaled)
}

/// Fisher–Yates shuffle run backwards, drawing from [`seeded_random`]
///
/// # Parameters
/// * `items` - The sequence to permute, in its canonical order
/// * `seed` - The assignment seed
///
/// # Returns
/// A permutation of `items`; identical for identical inputs
pub fn deterministic_shuffle<T: Clone>(items: &[T], seed: i64) -> Vec<T> {
    let mut shuffled = items.to_vec();
    let mut current = shuffled.len();

    while current != 0 {
        let draw = seeded_random(seed as f64 + current as f64);
        let target = libm::floor(draw * current as f64) as usize;
        current -= 1;
        shuffled.swap(current, target);
    }

    shuffled
}

/// Assign assets to token IDs; position `i` of the result is token `i`
pub fn assign(assets: &[Asset], seed: i64) -> Vec<Asset> {
    deterministic_shuffle(assets, seed)
}

/// Hex SHA-256 over the assigned identifiers, one per line in token order
pub fn assignment_digest<'a, I>(identifiers: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    for (index, identifier) in identifiers.into_iter().enumerate() {
        if index > 0 {
            hasher.update(b"\n");
        }
        hasher.update(identifier.as_bytes());
    }
    hex::encode(hasher.finalize())
}
