//! Ring LWE over Z[X]/(X^N + 1) with torus coefficients.

use std::ops::{AddAssign, SubAssign};

use itertools::izip;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::fft::{transform_for, TransformedPolynomial};
use crate::lwe::{LweKey, LweParams, LweSample};
use crate::poly::{IntPolynomial, TorusPolynomial};
use crate::random::{fill_random_binary, fill_uniform_torus32, random_gaussian_torus32};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TLweParams {
    /// Ring size N, a power of two.
    pub n: usize,
    /// Mask size.
    pub k: usize,
    pub min_noise: f64,
    pub max_noise: f64,
}

impl TLweParams {
    pub fn new(n: usize, k: usize, min_noise: f64, max_noise: f64) -> Self {
        assert!(n.is_power_of_two(), "ring size {n} must be a power of two");
        assert!(k >= 1, "mask size must be positive");
        Self { n, k, min_noise, max_noise }
    }

    /// Parameters of the LWE samples produced by coefficient extraction.
    pub fn extracted_lwe_params(&self) -> LweParams {
        LweParams::new(self.k * self.n, self.min_noise, self.max_noise)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TLweKey {
    params: TLweParams,
    key: Vec<IntPolynomial>,
}

impl TLweKey {
    pub fn generate<R: Rng>(params: &TLweParams, rng: &mut R) -> Self {
        let key = (0..params.k)
            .map(|_| {
                let mut p = IntPolynomial::zero(params.n);
                fill_random_binary(rng, &mut p.coeffs);
                p
            })
            .collect();
        Self { params: params.clone(), key }
    }

    pub fn params(&self) -> &TLweParams {
        &self.params
    }

    pub(crate) fn polynomials(&self) -> &[IntPolynomial] {
        &self.key
    }

    /// LWE key over the concatenated polynomial coefficients; decrypts
    /// extracted samples.
    pub fn extracted_lwe_key(&self) -> LweKey {
        let coeffs = self.key.iter().flat_map(|p| p.coeffs.iter().copied()).collect();
        LweKey::from_coeffs(self.params.extracted_lwe_params(), coeffs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TLweSample {
    pub a: Vec<TorusPolynomial>,
    pub b: TorusPolynomial,
    pub current_variance: f64,
}

impl TLweSample {
    pub fn zero(params: &TLweParams) -> Self {
        Self {
            a: vec![TorusPolynomial::zero(params.n); params.k],
            b: TorusPolynomial::zero(params.n),
            current_variance: 0.0,
        }
    }

    pub fn noiseless_trivial(mu: TorusPolynomial, params: &TLweParams) -> Self {
        assert_eq!(mu.coeffs.len(), params.n, "message does not match ring size");
        Self {
            a: vec![TorusPolynomial::zero(params.n); params.k],
            b: mu,
            current_variance: 0.0,
        }
    }

    pub fn n(&self) -> usize {
        self.b.coeffs.len()
    }

    pub fn k(&self) -> usize {
        self.a.len()
    }

    /// Applies (X^a - 1) to every polynomial of the sample.
    pub fn mul_by_x_pow_minus_one(&self, exp: usize) -> TLweSample {
        TLweSample {
            a: self.a.iter().map(|p| p.mul_by_x_pow_minus_one(exp)).collect(),
            b: self.b.mul_by_x_pow_minus_one(exp),
            current_variance: 2.0 * self.current_variance,
        }
    }

    /// LWE sample whose phase is the constant coefficient of this sample's
    /// phase polynomial: mask polynomials are reversed with the anticyclic
    /// sign on wrap.
    pub fn extract_sample(&self) -> LweSample {
        let n = self.n();
        let mut a = Vec::with_capacity(self.a.len() * n);
        for poly in &self.a {
            a.push(poly.coeffs[0]);
            for i in 1..n {
                a.push(poly.coeffs[n - i].wrapping_neg());
            }
        }
        LweSample {
            a,
            b: self.b.coeffs[0],
            current_variance: self.current_variance,
        }
    }
}

impl AddAssign<&TLweSample> for TLweSample {
    fn add_assign(&mut self, rhs: &TLweSample) {
        assert_eq!(self.a.len(), rhs.a.len(), "mask size mismatch");
        izip!(self.a.iter_mut(), rhs.a.iter()).for_each(|(x, y)| *x += y);
        self.b += &rhs.b;
        self.current_variance += rhs.current_variance;
    }
}

impl SubAssign<&TLweSample> for TLweSample {
    fn sub_assign(&mut self, rhs: &TLweSample) {
        assert_eq!(self.a.len(), rhs.a.len(), "mask size mismatch");
        izip!(self.a.iter_mut(), rhs.a.iter()).for_each(|(x, y)| *x -= y);
        self.b -= &rhs.b;
        self.current_variance += rhs.current_variance;
    }
}

/// Encryption of the zero polynomial: uniform mask, b = sum a_j s_j + e.
pub fn tlwe_encrypt_zero<R: Rng>(alpha: f64, key: &TLweKey, rng: &mut R) -> TLweSample {
    let params = &key.params;
    let plan = transform_for(params.n);
    let mut a = Vec::with_capacity(params.k);
    let mut acc = TransformedPolynomial::zero(params.n);
    for s_j in &key.key {
        let mut a_j = TorusPolynomial::zero(params.n);
        fill_uniform_torus32(rng, &mut a_j.coeffs);
        acc.add_mul_assign(&plan.forward_int(s_j), &plan.forward_torus(&a_j));
        a.push(a_j);
    }
    let mut b = plan.inverse_torus(&acc);
    b.coeffs
        .iter_mut()
        .for_each(|c| *c = random_gaussian_torus32(rng, *c, alpha));
    TLweSample { a, b, current_variance: alpha * alpha }
}

/// Encryption of an arbitrary torus polynomial.
pub fn tlwe_encrypt<R: Rng>(
    mu: &TorusPolynomial,
    alpha: f64,
    key: &TLweKey,
    rng: &mut R,
) -> TLweSample {
    let mut out = tlwe_encrypt_zero(alpha, key, rng);
    out.b += mu;
    out
}

/// b - sum a_j s_j; approximates the plaintext polynomial.
pub fn tlwe_phase(sample: &TLweSample, key: &TLweKey) -> TorusPolynomial {
    assert_eq!(sample.a.len(), key.params.k, "sample and key parameter mismatch");
    assert_eq!(sample.n(), key.params.n, "sample and key ring size mismatch");
    let plan = transform_for(key.params.n);
    let mut acc = TransformedPolynomial::zero(key.params.n);
    for (a_j, s_j) in izip!(sample.a.iter(), key.key.iter()) {
        acc.add_mul_assign(&plan.forward_int(s_j), &plan.forward_torus(a_j));
    }
    let mut phase = sample.b.clone();
    phase -= &plan.inverse_torus(&acc);
    phase
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::lwe::lwe_phase;
    use crate::random::DefaultSecureRng;
    use crate::torus::encode_message;

    fn params() -> TLweParams {
        TLweParams::new(256, 1, 1e-9, 0.012)
    }

    #[test]
    fn zero_encryption_has_small_phase() {
        let params = params();
        let mut rng = DefaultSecureRng::seed_from_u64(10);
        let key = TLweKey::generate(&params, &mut rng);
        let ct = tlwe_encrypt_zero(params.min_noise, &key, &mut rng);
        for &c in &tlwe_phase(&ct, &key).coeffs {
            assert!(c.abs() < 1 << 16, "phase coefficient {c} too large");
        }
    }

    #[test]
    fn message_encryption_round_trips() {
        let params = params();
        let mut rng = DefaultSecureRng::seed_from_u64(11);
        let key = TLweKey::generate(&params, &mut rng);
        let mut mu = TorusPolynomial::zero(params.n);
        mu.coeffs[0] = encode_message(1, 8);
        mu.coeffs[3] = encode_message(-1, 8);
        let ct = tlwe_encrypt(&mu, params.min_noise, &key, &mut rng);
        let phase = tlwe_phase(&ct, &key);
        for (i, (&got, &want)) in izip!(phase.coeffs.iter(), mu.coeffs.iter()).enumerate() {
            let err = got.wrapping_sub(want);
            assert!(err.abs() < 1 << 16, "coeff {i}: err {err}");
        }
    }

    #[test]
    fn extraction_matches_constant_coefficient() {
        let params = params();
        let mut rng = DefaultSecureRng::seed_from_u64(12);
        let key = TLweKey::generate(&params, &mut rng);
        let mut mu = TorusPolynomial::zero(params.n);
        mu.coeffs[0] = encode_message(3, 8);
        let ct = tlwe_encrypt(&mu, params.min_noise, &key, &mut rng);
        let extracted = ct.extract_sample();
        let lwe_key = key.extracted_lwe_key();
        let phase = lwe_phase(&extracted, &lwe_key);
        let err = phase.wrapping_sub(mu.coeffs[0]);
        assert!(err.abs() < 1 << 16, "err {err}");
    }

    #[test]
    fn trivial_phase_is_exact() {
        let params = params();
        let mut rng = DefaultSecureRng::seed_from_u64(13);
        let key = TLweKey::generate(&params, &mut rng);
        let mu = TorusPolynomial::uniform_constant(encode_message(1, 8), params.n);
        let ct = TLweSample::noiseless_trivial(mu.clone(), &params);
        assert_eq!(tlwe_phase(&ct, &key).coeffs, mu.coeffs);
    }
}
