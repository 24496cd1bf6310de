//! Randomness plumbing.
//!
//! Every randomised routine in this crate takes its generator as an explicit
//! `&mut R` parameter; nothing draws from implicit process state. Callers that
//! do not carry their own generator can use [`DefaultSecureRng`].

use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};

use crate::torus::{f64_to_torus32, Torus32};

/// Default cryptographically secure generator (ChaCha20).
pub struct DefaultSecureRng {
    rng: ChaCha20Rng,
}

impl DefaultSecureRng {
    /// Seeds from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }
}

impl Default for DefaultSecureRng {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedableRng for DefaultSecureRng {
    type Seed = <ChaCha20Rng as SeedableRng>::Seed;

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed),
        }
    }
}

impl RngCore for DefaultSecureRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

impl CryptoRng for DefaultSecureRng {}

/// Uniform torus element.
pub fn random_uniform_torus32<R: Rng>(rng: &mut R) -> Torus32 {
    rng.gen::<u32>() as i32
}

pub fn fill_uniform_torus32<R: Rng>(rng: &mut R, out: &mut [Torus32]) {
    out.iter_mut().for_each(|v| *v = random_uniform_torus32(rng));
}

/// Gaussian torus element centered at `mean` with standard deviation `stddev`
/// (measured on the real torus).
pub fn random_gaussian_torus32<R: Rng>(rng: &mut R, mean: Torus32, stddev: f64) -> Torus32 {
    let normal = Normal::new(0.0, stddev).expect("noise stddev must be finite and non-negative");
    let e: f64 = normal.sample(rng);
    mean.wrapping_add(f64_to_torus32(e))
}

/// Uniform 0/1 coefficients for binary secrets.
pub fn fill_random_binary<R: Rng>(rng: &mut R, out: &mut [i32]) {
    out.iter_mut().for_each(|v| *v = rng.gen_range(0..2));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_rng_is_deterministic() {
        let mut a = DefaultSecureRng::seed_from_u64(0);
        let mut b = DefaultSecureRng::seed_from_u64(0);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn gaussian_with_zero_stddev_is_exact() {
        let mut rng = DefaultSecureRng::seed_from_u64(1);
        for _ in 0..8 {
            assert_eq!(random_gaussian_torus32(&mut rng, 1 << 29, 0.0), 1 << 29);
        }
    }

    #[test]
    fn binary_fill_only_produces_bits() {
        let mut rng = DefaultSecureRng::seed_from_u64(2);
        let mut out = vec![0i32; 256];
        fill_random_binary(&mut rng, &mut out);
        assert!(out.iter().all(|&v| v == 0 || v == 1));
        assert!(out.iter().any(|&v| v == 1));
    }
}
