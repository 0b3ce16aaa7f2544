//! Seed resolution.
//!
//! A locked, non-null seed is honored verbatim so that repeated generations
//! are reproducible. Otherwise a fresh seed is drawn from a
//! non-cryptographic RNG; nothing is guaranteed across calls.

use rand::Rng;

/// Exclusive upper bound for randomly drawn seeds.
pub const MAX_RANDOM_SEED: i64 = 2_000_000_000;

/// Draw a fresh random seed in `[0, 2e9)`.
pub fn random_seed() -> i64 {
    random_seed_with(&mut rand::rng())
}

/// Draw a random seed from the supplied RNG.
pub fn random_seed_with<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.random_range(0..MAX_RANDOM_SEED)
}

/// Resolve the seed a job will actually run with.
///
/// Returns `seed` unchanged when `lock_seed` is set and a seed is present;
/// otherwise a fresh random seed.
pub fn resolve_seed(lock_seed: bool, seed: Option<i64>) -> i64 {
    resolve_seed_with(&mut rand::rng(), lock_seed, seed)
}

/// [`resolve_seed`] with an explicit RNG, for seeded runs and tests.
pub fn resolve_seed_with<R: Rng + ?Sized>(rng: &mut R, lock_seed: bool, seed: Option<i64>) -> i64 {
    match (lock_seed, seed) {
        (true, Some(s)) => s,
        _ => random_seed_with(rng),
    }
}
