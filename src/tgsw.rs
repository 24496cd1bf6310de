//! TGSW (ring GSW) samples and the external product with TLWE.
//!
//! A TGSW sample encrypting an integer polynomial m is a (k+1) x levels array
//! of TLWE rows: row (bloc, i) is a zero encryption with m * g_i added to
//! polynomial `bloc` of the row. The external product decomposes a TLWE
//! sample against the gadget, transforms the digits, and dots them with the
//! (transformed) rows.

use itertools::izip;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::decomposer::SignedDecomposer;
use crate::fft::{transform_for, TransformedPolynomial};
use crate::poly::IntPolynomial;
use crate::tlwe::{tlwe_encrypt_zero, TLweKey, TLweParams, TLweSample};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TGswParams {
    pub decomposer: SignedDecomposer,
    pub tlwe: TLweParams,
}

impl TGswParams {
    pub fn new(levels: usize, base_bits: u32, tlwe: TLweParams) -> Self {
        Self {
            decomposer: SignedDecomposer::new(levels, base_bits),
            tlwe,
        }
    }

    /// Rows per sample: (k + 1) * levels.
    pub fn row_count(&self) -> usize {
        (self.tlwe.k + 1) * self.decomposer.levels()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TGswSample {
    pub rows: Vec<TLweSample>,
}

/// TGSW sample with every polynomial moved to the transformed domain.
#[derive(Clone, Debug)]
pub struct TransformedTGswSample {
    rows: Vec<Vec<TransformedPolynomial>>,
    row_variance: f64,
}

/// Encrypts the integer constant `m` (one TLWE row per gadget level and mask
/// position, with m * g_i on the matching polynomial).
pub fn tgsw_encrypt<R: Rng>(
    m: i32,
    alpha: f64,
    key: &TLweKey,
    params: &TGswParams,
    rng: &mut R,
) -> TGswSample {
    let k = params.tlwe.k;
    let levels = params.decomposer.levels();
    let gadget = params.decomposer.gadget();
    let mut rows = Vec::with_capacity(params.row_count());
    for bloc in 0..=k {
        for i in 0..levels {
            let mut row = tlwe_encrypt_zero(alpha, key, rng);
            let mu = m.wrapping_mul(gadget[i]);
            if bloc < k {
                row.a[bloc].coeffs[0] = row.a[bloc].coeffs[0].wrapping_add(mu);
            } else {
                row.b.coeffs[0] = row.b.coeffs[0].wrapping_add(mu);
            }
            rows.push(row);
        }
    }
    TGswSample { rows }
}

impl TGswSample {
    /// Moves every polynomial of every row into the transformed domain.
    pub fn transform(&self, params: &TGswParams) -> TransformedTGswSample {
        let plan = transform_for(params.tlwe.n);
        let mut row_variance: f64 = 0.0;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row_variance = row_variance.max(row.current_variance);
                row.a
                    .iter()
                    .map(|p| plan.forward_torus(p))
                    .chain(std::iter::once(plan.forward_torus(&row.b)))
                    .collect()
            })
            .collect();
        TransformedTGswSample { rows, row_variance }
    }
}

/// Decomposes every polynomial of `sample` against the gadget; the (k+1) *
/// levels digit polynomials line up with the TGSW row order.
pub fn tgsw_decompose(sample: &TLweSample, params: &TGswParams) -> Vec<IntPolynomial> {
    let mut out = Vec::with_capacity(params.row_count());
    for a_j in &sample.a {
        out.extend(params.decomposer.decompose_poly(a_j));
    }
    out.extend(params.decomposer.decompose_poly(&sample.b));
    out
}

/// External product: acc <- tgsw (x) acc.
///
/// Digits are transformed once, dotted against the rows with accumulation in
/// the transformed domain, and inverse-transformed per output polynomial.
pub fn tgsw_extern_mul(acc: &mut TLweSample, tgsw: &TransformedTGswSample, params: &TGswParams) {
    let k = params.tlwe.k;
    let n = params.tlwe.n;
    assert_eq!(acc.k(), k, "accumulator mask size mismatch");
    assert_eq!(acc.n(), n, "accumulator ring size mismatch");
    assert_eq!(tgsw.rows.len(), params.row_count(), "TGSW row count mismatch");

    let plan = transform_for(n);
    let digits = tgsw_decompose(acc, params);
    let mut out = vec![TransformedPolynomial::zero(n); k + 1];
    for (digit, row) in izip!(digits.iter(), tgsw.rows.iter()) {
        let digit_t = plan.forward_int(digit);
        for (slot, row_poly) in izip!(out.iter_mut(), row.iter()) {
            slot.add_mul_assign(&digit_t, row_poly);
        }
    }
    for (a_j, slot) in izip!(acc.a.iter_mut(), out.iter()) {
        *a_j = plan.inverse_torus(slot);
    }
    acc.b = plan.inverse_torus(&out[k]);

    // decomposition digits are bounded by B/2; rounding below the last
    // gadget level contributes independently per coefficient
    let levels = params.decomposer.levels() as f64;
    let half_base = (1u32 << (params.decomposer.base_bits() - 1)) as f64;
    let eps = crate::torus::torus32_to_f64(params.decomposer.rounding_error_bound() as i32 / 2);
    acc.current_variance = (k as f64 + 1.0) * levels * n as f64 * half_base * half_base
        * tgsw.row_variance
        + acc.current_variance
        + (1.0 + k as f64 * n as f64) * eps * eps;
}
