//! Polynomials modulo X^N + 1.
//!
//! Two flavours: integer coefficients (secrets, gadget digits) and torus
//! coefficients (ciphertext polynomials). All coefficient arithmetic wraps.

use std::ops::{AddAssign, Neg, SubAssign};

use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::torus::Torus32;

/// Polynomial with integer coefficients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntPolynomial {
    pub coeffs: Vec<i32>,
}

impl IntPolynomial {
    pub fn zero(n: usize) -> Self {
        Self { coeffs: vec![0; n] }
    }

    pub fn from_coeffs(coeffs: Vec<i32>) -> Self {
        Self { coeffs }
    }

    /// Constant polynomial c.
    pub fn constant(c: i32, n: usize) -> Self {
        let mut coeffs = vec![0; n];
        coeffs[0] = c;
        Self { coeffs }
    }

    pub fn degree_bound(&self) -> usize {
        self.coeffs.len()
    }
}

/// Polynomial with torus coefficients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorusPolynomial {
    pub coeffs: Vec<Torus32>,
}

impl TorusPolynomial {
    pub fn zero(n: usize) -> Self {
        Self { coeffs: vec![0; n] }
    }

    pub fn from_coeffs(coeffs: Vec<Torus32>) -> Self {
        Self { coeffs }
    }

    /// Polynomial with every coefficient equal to `mu` (the bootstrap test
    /// vector shape).
    pub fn uniform_constant(mu: Torus32, n: usize) -> Self {
        Self { coeffs: vec![mu; n] }
    }

    pub fn degree_bound(&self) -> usize {
        self.coeffs.len()
    }

    pub fn clear(&mut self) {
        self.coeffs.iter_mut().for_each(|c| *c = 0);
    }

    /// p(X) * X^a mod X^N + 1, with a in [0, 2N).
    pub fn mul_by_x_pow(&self, a: usize) -> TorusPolynomial {
        let n = self.coeffs.len();
        assert!(a < 2 * n, "exponent {a} out of range for ring size {n}");
        let mut out = vec![0; n];
        if a < n {
            for i in 0..a {
                out[i] = self.coeffs[n - a + i].wrapping_neg();
            }
            for i in a..n {
                out[i] = self.coeffs[i - a];
            }
        } else {
            let aa = a - n;
            for i in 0..aa {
                out[i] = self.coeffs[n - aa + i];
            }
            for i in aa..n {
                out[i] = self.coeffs[i - aa].wrapping_neg();
            }
        }
        TorusPolynomial { coeffs: out }
    }

    /// p(X) * (X^a - 1) mod X^N + 1, with a in [0, 2N).
    ///
    /// This is the anticyclic shift the CMux accumulator update is built on.
    pub fn mul_by_x_pow_minus_one(&self, a: usize) -> TorusPolynomial {
        let n = self.coeffs.len();
        assert!(a < 2 * n, "exponent {a} out of range for ring size {n}");
        let mut out = vec![0; n];
        if a < n {
            for i in 0..a {
                out[i] = self.coeffs[n - a + i].wrapping_neg().wrapping_sub(self.coeffs[i]);
            }
            for i in a..n {
                out[i] = self.coeffs[i - a].wrapping_sub(self.coeffs[i]);
            }
        } else {
            let aa = a - n;
            for i in 0..aa {
                out[i] = self.coeffs[n - aa + i].wrapping_sub(self.coeffs[i]);
            }
            for i in aa..n {
                out[i] = self.coeffs[i - aa].wrapping_neg().wrapping_sub(self.coeffs[i]);
            }
        }
        TorusPolynomial { coeffs: out }
    }
}

impl AddAssign<&TorusPolynomial> for TorusPolynomial {
    fn add_assign(&mut self, rhs: &TorusPolynomial) {
        assert_eq!(self.coeffs.len(), rhs.coeffs.len(), "ring size mismatch");
        izip!(self.coeffs.iter_mut(), rhs.coeffs.iter())
            .for_each(|(a, b)| *a = a.wrapping_add(*b));
    }
}

impl SubAssign<&TorusPolynomial> for TorusPolynomial {
    fn sub_assign(&mut self, rhs: &TorusPolynomial) {
        assert_eq!(self.coeffs.len(), rhs.coeffs.len(), "ring size mismatch");
        izip!(self.coeffs.iter_mut(), rhs.coeffs.iter())
            .for_each(|(a, b)| *a = a.wrapping_sub(*b));
    }
}

impl Neg for &TorusPolynomial {
    type Output = TorusPolynomial;

    fn neg(self) -> TorusPolynomial {
        TorusPolynomial {
            coeffs: self.coeffs.iter().map(|c| c.wrapping_neg()).collect(),
        }
    }
}

/// Schoolbook anticyclic product of an integer and a torus polynomial.
///
/// Quadratic; reference implementation for the transform tests and small
/// parameter sets only.
pub fn anticyclic_mul_naive(p: &IntPolynomial, q: &TorusPolynomial) -> TorusPolynomial {
    let n = q.coeffs.len();
    assert_eq!(p.coeffs.len(), n, "ring size mismatch");
    let mut out = vec![0i32; n];
    for (i, &pi) in p.coeffs.iter().enumerate() {
        if pi == 0 {
            continue;
        }
        for (j, &qj) in q.coeffs.iter().enumerate() {
            let term = pi.wrapping_mul(qj);
            let idx = i + j;
            if idx < n {
                out[idx] = out[idx].wrapping_add(term);
            } else {
                out[idx - n] = out[idx - n].wrapping_sub(term);
            }
        }
    }
    TorusPolynomial { coeffs: out }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_by_x_pow_rotates_anticyclically() {
        // p = 1 + 2X over X^4 + 1
        let p = TorusPolynomial::from_coeffs(vec![1, 2, 0, 0]);
        assert_eq!(p.mul_by_x_pow(1).coeffs, vec![0, 1, 2, 0]);
        // X^4 = -1
        assert_eq!(p.mul_by_x_pow(3).coeffs, vec![-2, 0, 0, 1]);
        assert_eq!(p.mul_by_x_pow(4).coeffs, vec![-1, -2, 0, 0]);
        assert_eq!(p.mul_by_x_pow(7).coeffs, vec![2, 0, 0, -1]);
    }

    #[test]
    fn mul_by_x_pow_minus_one_matches_difference() {
        let p = TorusPolynomial::from_coeffs(vec![5, -3, 7, 11, 0, 2, -9, 1]);
        for a in 0..16 {
            let mut want = p.mul_by_x_pow(a);
            want -= &p;
            assert_eq!(p.mul_by_x_pow_minus_one(a).coeffs, want.coeffs, "a = {a}");
        }
    }

    #[test]
    fn naive_product_agrees_with_monomial_shift() {
        let q = TorusPolynomial::from_coeffs(vec![3, 1, 4, 1, 5, 9, 2, 6]);
        for a in 0..8 {
            let mut xa = IntPolynomial::zero(8);
            xa.coeffs[a] = 1;
            assert_eq!(anticyclic_mul_naive(&xa, &q).coeffs, q.mul_by_x_pow(a).coeffs);
        }
    }
}
