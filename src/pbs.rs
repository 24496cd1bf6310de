//! Programmable bootstrapping: CMux, blind rotation, sample extraction and
//! the gate bootstrap built on them.
//!
//! The accumulator starts as the trivial TLWE of X^(2N - b̄) * v and each
//! CMux step conditionally rotates it by ā_i positions, driven by the TGSW
//! encryption of the matching secret bit. Extraction then yields an LWE
//! sample of the selected test-vector coefficient, which key switching maps
//! back to the input parameter set.

use rand::Rng;

use crate::lwe::{lwe_keyswitch, KeySwitchKey, LweKey, LweSample};
use crate::poly::TorusPolynomial;
use crate::tgsw::{tgsw_encrypt, tgsw_extern_mul, TGswParams, TransformedTGswSample};
use crate::tlwe::{TLweKey, TLweSample};
use crate::torus::{mod_switch_from_torus32, Torus32};

/// Bootstrapping key: one transformed TGSW sample per input LWE secret bit.
pub struct BootstrapKey {
    pub(crate) key: Vec<TransformedTGswSample>,
    pub(crate) params: TGswParams,
}

impl BootstrapKey {
    /// Encrypts every bit of `lwe_key` under `tlwe_key`. Building the
    /// transformed samples here also warms the transform plan cache, so the
    /// bootstrap hot path never hits a plan miss.
    pub fn generate<R: Rng>(
        lwe_key: &LweKey,
        tlwe_key: &TLweKey,
        params: &TGswParams,
        rng: &mut R,
    ) -> Self {
        assert_eq!(
            tlwe_key.params(),
            &params.tlwe,
            "TGSW parameters do not match the ring key"
        );
        let alpha = params.tlwe.min_noise;
        let key = lwe_key
            .coeffs()
            .iter()
            .map(|&s_i| tgsw_encrypt(s_i, alpha, tlwe_key, params, rng).transform(params))
            .collect();
        Self { key, params: params.clone() }
    }

    pub fn input_size(&self) -> usize {
        self.key.len()
    }
}

/// One blind-rotation step: acc <- acc + bk_i (x) ((X^bara_i - 1) * acc).
///
/// bk_i encrypts the secret bit s_i, so the step rotates the accumulator by
/// s_i * bara_i positions. A zero rotation is skipped outright.
pub fn cmux(
    acc: &mut TLweSample,
    bk_i: &TransformedTGswSample,
    bara_i: usize,
    params: &TGswParams,
) {
    if bara_i == 0 {
        return;
    }
    let mut shifted = acc.mul_by_x_pow_minus_one(bara_i);
    tgsw_extern_mul(&mut shifted, bk_i, params);
    *acc += &shifted;
}

/// Rotates the accumulator by sum s_i * bara_i mod 2N.
pub fn blind_rotate(acc: &mut TLweSample, bk: &BootstrapKey, bara: &[usize]) {
    assert_eq!(bara.len(), bk.key.len(), "rotation count does not match key size");
    for (bk_i, &bara_i) in bk.key.iter().zip(bara.iter()) {
        cmux(acc, bk_i, bara_i, &bk.params);
    }
}

/// Blind-rotates the test polynomial and extracts the constant coefficient.
///
/// The result encrypts coefficient (barb - sum s_i * bara_i) mod 2N of `v`,
/// negated when the index wraps past N.
pub fn blind_rotate_and_extract(
    v: &TorusPolynomial,
    bk: &BootstrapKey,
    barb: usize,
    bara: &[usize],
) -> LweSample {
    let n2 = 2 * v.coeffs.len();
    let testvect = v.mul_by_x_pow((n2 - barb) & (n2 - 1));
    let mut acc = TLweSample::noiseless_trivial(testvect, &bk.params.tlwe);
    blind_rotate(&mut acc, bk, bara);
    acc.extract_sample()
}

/// Refreshes `x` into an LWE sample of +-mu under the extracted ring key.
pub fn bootstrap_wo_keyswitch(bk: &BootstrapKey, mu: Torus32, x: &LweSample) -> LweSample {
    assert_eq!(x.n(), bk.key.len(), "sample does not match bootstrapping key");
    let n2 = 2 * bk.params.tlwe.n;
    let barb = mod_switch_from_torus32(x.b, n2 as u32);
    let bara: Vec<usize> = x
        .a
        .iter()
        .map(|&a_i| mod_switch_from_torus32(a_i, n2 as u32))
        .collect();
    let testvect = TorusPolynomial::uniform_constant(mu, bk.params.tlwe.n);
    blind_rotate_and_extract(&testvect, bk, barb, &bara)
}

/// Full gate bootstrap: refresh, then switch back to the input key space.
pub fn bootstrap(
    bk: &BootstrapKey,
    ks: &KeySwitchKey,
    mu: Torus32,
    x: &LweSample,
) -> LweSample {
    lwe_keyswitch(ks, &bootstrap_wo_keyswitch(bk, mu, x))
}
