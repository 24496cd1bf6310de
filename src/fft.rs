//! Negacyclic transform for polynomial multiplication modulo X^N + 1.
//!
//! A length-N polynomial is embedded antisymmetrically into a length-2N
//! complex FFT: coefficients in the first N slots, their negation in the next
//! N. The even-indexed bins of the spectrum vanish and the N/2 odd bins fully
//! describe the polynomial, so pointwise multiplication of odd bins realises
//! the anticyclic convolution. Integer polynomials are scaled by 1/2 on the
//! way in, torus polynomials by 2^-33; the inverse rescales by 2^32/N and
//! wraps back to i32.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use itertools::izip;
use num_traits::Zero;
use once_cell::sync::Lazy;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::poly::{IntPolynomial, TorusPolynomial};
use crate::torus::Torus32;

const IN_INT_SCALE: f64 = 0.5;
const IN_TORUS_SCALE: f64 = 1.0 / 8589934592.0; // 2^-33
const OUT_TORUS_SCALE_NUM: f64 = 4294967296.0; // 2^32, divided by N per plan

/// Forward and inverse plans for one ring size.
///
/// Plans are pure functions of N; they are built once and shared through the
/// process-wide cache below.
pub struct NegacyclicTransform {
    n: usize,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

static PLAN_CACHE: Lazy<Mutex<HashMap<usize, Arc<NegacyclicTransform>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the cached transform for ring size `n`, constructing it on first
/// use. Misses take the lock for the duration of plan construction; hits
/// clone an Arc.
pub fn transform_for(n: usize) -> Arc<NegacyclicTransform> {
    assert!(n.is_power_of_two() && n >= 2, "ring size {n} must be a power of two");
    let mut cache = PLAN_CACHE.lock().expect("transform plan cache poisoned");
    cache
        .entry(n)
        .or_insert_with(|| {
            let mut planner = FftPlanner::new();
            Arc::new(NegacyclicTransform {
                n,
                fwd: planner.plan_fft_forward(2 * n),
                inv: planner.plan_fft_inverse(2 * n),
            })
        })
        .clone()
}

/// Polynomial in the transformed (Lagrange) domain: N/2 complex values.
#[derive(Clone, Debug)]
pub struct TransformedPolynomial {
    pub(crate) values: Vec<Complex64>,
}

impl TransformedPolynomial {
    pub fn zero(n: usize) -> Self {
        Self {
            values: vec![Complex64::zero(); n / 2],
        }
    }

    /// self += a * b, elementwise.
    pub fn add_mul_assign(&mut self, a: &TransformedPolynomial, b: &TransformedPolynomial) {
        assert_eq!(self.values.len(), a.values.len(), "transform length mismatch");
        assert_eq!(self.values.len(), b.values.len(), "transform length mismatch");
        izip!(self.values.iter_mut(), a.values.iter(), b.values.iter())
            .for_each(|(out, x, y)| *out += x * y);
    }

}

impl NegacyclicTransform {
    fn forward_scaled(&self, coeffs: &[i32], scale: f64) -> TransformedPolynomial {
        let n = self.n;
        assert_eq!(coeffs.len(), n, "polynomial does not match plan size");
        let mut buf = vec![Complex64::zero(); 2 * n];
        for (i, &c) in coeffs.iter().enumerate() {
            let x = c as f64 * scale;
            buf[i] = Complex64::new(x, 0.0);
            buf[n + i] = Complex64::new(-x, 0.0);
        }
        self.fwd.process(&mut buf);
        TransformedPolynomial {
            values: (0..n / 2).map(|t| buf[2 * t + 1]).collect(),
        }
    }

    pub fn forward_int(&self, p: &IntPolynomial) -> TransformedPolynomial {
        self.forward_scaled(&p.coeffs, IN_INT_SCALE)
    }

    pub fn forward_torus(&self, p: &TorusPolynomial) -> TransformedPolynomial {
        self.forward_scaled(&p.coeffs, IN_TORUS_SCALE)
    }

    /// Inverse transform back to a torus polynomial, rounding each
    /// coefficient to the 2^-32 grid and wrapping.
    pub fn inverse_torus(&self, t: &TransformedPolynomial) -> TorusPolynomial {
        let n = self.n;
        assert_eq!(t.values.len(), n / 2, "transform does not match plan size");
        let mut buf = vec![Complex64::zero(); 2 * n];
        for (i, v) in t.values.iter().enumerate() {
            buf[2 * i + 1] = *v;
            buf[2 * n - 1 - 2 * i] = v.conj();
        }
        self.inv.process(&mut buf);
        let scale = OUT_TORUS_SCALE_NUM / n as f64;
        TorusPolynomial {
            coeffs: buf[..n]
                .iter()
                .map(|v| ((v.re * scale).round() as i64) as Torus32)
                .collect(),
        }
    }

    /// Anticyclic product of an integer and a torus polynomial.
    pub fn mul_int_torus(&self, p: &IntPolynomial, q: &TorusPolynomial) -> TorusPolynomial {
        let mut acc = TransformedPolynomial::zero(self.n);
        acc.add_mul_assign(&self.forward_int(p), &self.forward_torus(q));
        self.inverse_torus(&acc)
    }
}
