//! Signed balanced gadget decomposition.
//!
//! The gadget vector is g_i = 2^(32 - (i+1)*base_bits) for i = 0..levels.
//! A torus element x decomposes into digits d_i in [-B/2, B/2) such that
//! sum d_i * g_i reconstructs x within one ulp of the last gadget entry,
//! 2^(32 - levels*base_bits).

use serde::{Deserialize, Serialize};

use crate::poly::{IntPolynomial, TorusPolynomial};
use crate::torus::Torus32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDecomposer {
    levels: usize,
    base_bits: u32,
    half_base: i32,
    mask: u32,
    offset: u32,
}

impl SignedDecomposer {
    pub fn new(levels: usize, base_bits: u32) -> Self {
        assert!(levels >= 1, "decomposition needs at least one level");
        assert!(
            levels as u32 * base_bits <= 32,
            "decomposition depth {levels}x{base_bits} exceeds the torus precision"
        );
        let half_base = 1i32 << (base_bits - 1);
        // rounding offset: B/2 on every level, so truncation below rounds
        // to the nearest multiple of the last gadget entry
        let mut gadget_sum = 0u32;
        for i in 0..levels {
            gadget_sum = gadget_sum.wrapping_add(1u32 << (32 - (i as u32 + 1) * base_bits));
        }
        Self {
            levels,
            base_bits,
            half_base,
            mask: (1u32 << base_bits) - 1,
            offset: gadget_sum.wrapping_mul(half_base as u32),
        }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn base_bits(&self) -> u32 {
        self.base_bits
    }

    /// Gadget vector entries g_0 > g_1 > ... as torus elements.
    pub fn gadget(&self) -> Vec<Torus32> {
        (0..self.levels)
            .map(|i| (1u32 << (32 - (i as u32 + 1) * self.base_bits)) as i32)
            .collect()
    }

    /// Writes the digits of `x`, most significant level first.
    pub fn decompose_into(&self, x: Torus32, out: &mut [i32]) {
        assert_eq!(out.len(), self.levels, "digit buffer length mismatch");
        let shifted = (x as u32).wrapping_add(self.offset);
        for (i, digit) in out.iter_mut().enumerate() {
            let raw = (shifted >> (32 - (i as u32 + 1) * self.base_bits)) & self.mask;
            *digit = raw as i32 - self.half_base;
        }
    }

    /// Decomposes every coefficient of a torus polynomial, yielding one
    /// integer polynomial per level.
    pub fn decompose_poly(&self, p: &TorusPolynomial) -> Vec<IntPolynomial> {
        let n = p.coeffs.len();
        let mut out = vec![IntPolynomial::zero(n); self.levels];
        let mut digits = vec![0i32; self.levels];
        for (j, &c) in p.coeffs.iter().enumerate() {
            self.decompose_into(c, &mut digits);
            for (level, &d) in digits.iter().enumerate() {
                out[level].coeffs[j] = d;
            }
        }
        out
    }

    /// Largest reconstruction error of [`decompose_into`](Self::decompose_into):
    /// the decomposition truncates below the last level, so the error is one
    /// sided and strictly smaller than the last gadget entry.
    pub fn rounding_error_bound(&self) -> i64 {
        1i64 << (32 - self.levels as u32 * self.base_bits)
    }
}
