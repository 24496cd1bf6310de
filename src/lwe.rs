//! LWE samples over the discretised torus.
//!
//! A sample is (a, b) with b = <a, s> + m + e for a binary secret s. The
//! key-switching machinery lives here too: switching re-encrypts a sample
//! from one parameter set to another by digit-decomposing its mask against a
//! table of encrypted key products.

use std::ops::{AddAssign, Neg, SubAssign};

use itertools::izip;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::random::{fill_random_binary, fill_uniform_torus32, random_gaussian_torus32};
use crate::torus::Torus32;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LweParams {
    pub n: usize,
    /// Noise of a fresh encryption under this parameter set.
    pub min_noise: f64,
    /// Largest noise for which decryption stays reliable.
    pub max_noise: f64,
}

impl LweParams {
    pub fn new(n: usize, min_noise: f64, max_noise: f64) -> Self {
        assert!(n > 0, "LWE dimension must be positive");
        Self { n, min_noise, max_noise }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LweKey {
    params: LweParams,
    key: Vec<i32>,
}

impl LweKey {
    pub fn generate<R: Rng>(params: &LweParams, rng: &mut R) -> Self {
        let mut key = vec![0i32; params.n];
        fill_random_binary(rng, &mut key);
        Self { params: params.clone(), key }
    }

    /// Key with the given coefficients; used by sample extraction.
    pub(crate) fn from_coeffs(params: LweParams, key: Vec<i32>) -> Self {
        assert_eq!(key.len(), params.n, "key length does not match parameters");
        Self { params, key }
    }

    pub fn params(&self) -> &LweParams {
        &self.params
    }

    pub(crate) fn coeffs(&self) -> &[i32] {
        &self.key
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LweSample {
    pub a: Vec<Torus32>,
    pub b: Torus32,
    pub current_variance: f64,
}

impl LweSample {
    /// Noiseless encryption of `mu` under any key of this parameter set.
    pub fn noiseless_trivial(mu: Torus32, params: &LweParams) -> Self {
        Self {
            a: vec![0; params.n],
            b: mu,
            current_variance: 0.0,
        }
    }

    pub fn n(&self) -> usize {
        self.a.len()
    }

    /// self += k * rhs.
    pub fn add_mul_assign(&mut self, k: i32, rhs: &LweSample) {
        assert_eq!(self.a.len(), rhs.a.len(), "LWE dimension mismatch");
        izip!(self.a.iter_mut(), rhs.a.iter())
            .for_each(|(x, y)| *x = x.wrapping_add(k.wrapping_mul(*y)));
        self.b = self.b.wrapping_add(k.wrapping_mul(rhs.b));
        self.current_variance += (k as f64) * (k as f64) * rhs.current_variance;
    }
}

impl AddAssign<&LweSample> for LweSample {
    fn add_assign(&mut self, rhs: &LweSample) {
        assert_eq!(self.a.len(), rhs.a.len(), "LWE dimension mismatch");
        izip!(self.a.iter_mut(), rhs.a.iter()).for_each(|(x, y)| *x = x.wrapping_add(*y));
        self.b = self.b.wrapping_add(rhs.b);
        self.current_variance += rhs.current_variance;
    }
}

impl SubAssign<&LweSample> for LweSample {
    fn sub_assign(&mut self, rhs: &LweSample) {
        assert_eq!(self.a.len(), rhs.a.len(), "LWE dimension mismatch");
        izip!(self.a.iter_mut(), rhs.a.iter()).for_each(|(x, y)| *x = x.wrapping_sub(*y));
        self.b = self.b.wrapping_sub(rhs.b);
        self.current_variance += rhs.current_variance;
    }
}

impl Neg for &LweSample {
    type Output = LweSample;

    fn neg(self) -> LweSample {
        LweSample {
            a: self.a.iter().map(|x| x.wrapping_neg()).collect(),
            b: self.b.wrapping_neg(),
            current_variance: self.current_variance,
        }
    }
}

/// Encrypts the torus message `mu` with fresh Gaussian noise of stddev `alpha`.
pub fn lwe_encrypt<R: Rng>(mu: Torus32, alpha: f64, key: &LweKey, rng: &mut R) -> LweSample {
    let mut a = vec![0; key.params.n];
    fill_uniform_torus32(rng, &mut a);
    let mut b = random_gaussian_torus32(rng, mu, alpha);
    izip!(a.iter(), key.key.iter()).for_each(|(ai, si)| {
        b = b.wrapping_add(ai.wrapping_mul(*si));
    });
    LweSample { a, b, current_variance: alpha * alpha }
}

/// b - <a, s>; approximates the encrypted message.
pub fn lwe_phase(sample: &LweSample, key: &LweKey) -> Torus32 {
    assert_eq!(sample.a.len(), key.params.n, "sample and key parameter mismatch");
    let mut phase = sample.b;
    izip!(sample.a.iter(), key.key.iter()).for_each(|(ai, si)| {
        phase = phase.wrapping_sub(ai.wrapping_mul(*si));
    });
    phase
}

/// Key-switching key from an input key s' to an output key s.
///
/// `ks[h - 1][j][i]` encrypts h * s'_i * 2^(32 - (j+1)*base_bits) under the
/// output key; the h = 0 plane is omitted (it would be a noiseless zero).
#[derive(Clone, Serialize, Deserialize)]
pub struct KeySwitchKey {
    input_size: usize,
    levels: usize,
    base_bits: u32,
    out_params: LweParams,
    ks: Vec<LweSample>,
}

impl KeySwitchKey {
    pub fn generate<R: Rng>(
        in_key: &LweKey,
        out_key: &LweKey,
        levels: usize,
        base_bits: u32,
        rng: &mut R,
    ) -> Self {
        assert!(levels as u32 * base_bits <= 32, "key-switch decomposition too deep");
        let base = 1usize << base_bits;
        let input_size = in_key.params.n;
        let alpha = out_key.params.min_noise;
        let mut ks = Vec::with_capacity((base - 1) * levels * input_size);
        for h in 1..base {
            for j in 0..levels {
                let gadget = (1u32 << (32 - (j as u32 + 1) * base_bits)) as i32;
                for i in 0..input_size {
                    let mu = (h as i32).wrapping_mul(in_key.key[i]).wrapping_mul(gadget);
                    ks.push(lwe_encrypt(mu, alpha, out_key, rng));
                }
            }
        }
        Self {
            input_size,
            levels,
            base_bits,
            out_params: out_key.params.clone(),
            ks,
        }
    }

    pub fn out_params(&self) -> &LweParams {
        &self.out_params
    }

    fn entry(&self, h: usize, j: usize, i: usize) -> &LweSample {
        debug_assert!(h >= 1);
        &self.ks[((h - 1) * self.levels + j) * self.input_size + i]
    }

    /// Folds the decomposition of one input mask into `(out_a, out_b)`.
    ///
    /// Shared between the single-key switch and the per-party blocks of the
    /// multi-key switch.
    pub(crate) fn accumulate(
        &self,
        in_a: &[Torus32],
        out_a: &mut [Torus32],
        out_b: &mut Torus32,
        out_variance: &mut f64,
    ) {
        assert_eq!(in_a.len(), self.input_size, "input mask length mismatch");
        assert_eq!(out_a.len(), self.out_params.n, "output mask length mismatch");
        let base_mask = (1u32 << self.base_bits) - 1;
        let prec_offset = 1i32 << (32 - 1 - self.levels as u32 * self.base_bits);
        for (i, ai) in in_a.iter().enumerate() {
            let ai_bar = ai.wrapping_add(prec_offset) as u32;
            for j in 0..self.levels {
                let digit = (ai_bar >> (32 - (j as u32 + 1) * self.base_bits)) & base_mask;
                if digit == 0 {
                    continue;
                }
                let entry = self.entry(digit as usize, j, i);
                izip!(out_a.iter_mut(), entry.a.iter())
                    .for_each(|(x, y)| *x = x.wrapping_sub(*y));
                *out_b = out_b.wrapping_sub(entry.b);
                *out_variance += entry.current_variance;
            }
        }
    }
}

/// Switches `sample` to the key-switch key's output parameter set.
pub fn lwe_keyswitch(ks: &KeySwitchKey, sample: &LweSample) -> LweSample {
    let mut out = LweSample::noiseless_trivial(sample.b, &ks.out_params);
    out.current_variance = sample.current_variance;
    let mut b = out.b;
    let mut variance = out.current_variance;
    ks.accumulate(&sample.a, &mut out.a, &mut b, &mut variance);
    out.b = b;
    out.current_variance = variance;
    out
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::random::DefaultSecureRng;
    use crate::torus::{decode_message, encode_message};

    #[test]
    fn encrypt_decrypt_works() {
        let params = LweParams::new(500, 1e-7, 0.012);
        let mut rng = DefaultSecureRng::seed_from_u64(0);
        let key = LweKey::generate(&params, &mut rng);
        for m in 0..8 {
            let mu = encode_message(m, 8);
            let ct = lwe_encrypt(mu, params.min_noise, &key, &mut rng);
            let back = decode_message(lwe_phase(&ct, &key), 8);
            assert_eq!(back, m, "expected {m} but got {back}");
        }
    }

    #[test]
    fn linear_combinations_track_messages() {
        let params = LweParams::new(500, 1e-8, 0.012);
        let mut rng = DefaultSecureRng::seed_from_u64(1);
        let key = LweKey::generate(&params, &mut rng);
        let c1 = lwe_encrypt(encode_message(1, 8), params.min_noise, &key, &mut rng);
        let c2 = lwe_encrypt(encode_message(2, 8), params.min_noise, &key, &mut rng);
        let mut sum = c1.clone();
        sum += &c2;
        assert_eq!(decode_message(lwe_phase(&sum, &key), 8), 3);
        sum -= &c1;
        assert_eq!(decode_message(lwe_phase(&sum, &key), 8), 2);
        sum.add_mul_assign(2, &c1);
        assert_eq!(decode_message(lwe_phase(&sum, &key), 8), 4);
        assert_eq!(decode_message(lwe_phase(&-&sum, &key), 8), 4);
        assert!(sum.current_variance > c1.current_variance);
    }

    #[test]
    fn keyswitch_preserves_message() {
        let in_params = LweParams::new(1024, 1e-9, 0.012);
        let out_params = LweParams::new(500, 2e-8, 0.012);
        let mut rng = DefaultSecureRng::seed_from_u64(2);
        let in_key = LweKey::generate(&in_params, &mut rng);
        let out_key = LweKey::generate(&out_params, &mut rng);
        let ks = KeySwitchKey::generate(&in_key, &out_key, 8, 2, &mut rng);
        for m in 0..4 {
            let mu = encode_message(m, 4);
            let ct = lwe_encrypt(mu, in_params.min_noise, &in_key, &mut rng);
            let switched = lwe_keyswitch(&ks, &ct);
            assert_eq!(switched.a.len(), out_params.n);
            let back = decode_message(lwe_phase(&switched, &out_key), 4);
            assert_eq!(back, m, "expected {m} but got {back}");
            assert!(switched.current_variance > ct.current_variance);
        }
    }

    #[test]
    fn trivial_sample_has_exact_phase() {
        let params = LweParams::new(16, 0.0, 0.012);
        let mut rng = DefaultSecureRng::seed_from_u64(3);
        let key = LweKey::generate(&params, &mut rng);
        let mu = encode_message(3, 8);
        let c = LweSample::noiseless_trivial(mu, &params);
        assert_eq!(lwe_phase(&c, &key), mu);
        assert_eq!(c.current_variance, 0.0);
    }
}
