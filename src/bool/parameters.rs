//! Fixed parameter sets for the boolean gate API.

use serde::{Deserialize, Serialize};

use crate::lwe::LweParams;
use crate::tgsw::TGswParams;
use crate::tlwe::TLweParams;

pub(crate) const SQRT_TWO_OVER_PI: f64 = 0.7978845608028654;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoolParameters {
    pub lwe: LweParams,
    pub tgsw: TGswParams,
    pub ks_levels: usize,
    pub ks_base_bits: u32,
}

impl BoolParameters {
    /// The fixed ~128-bit set: n = 500, N = 1024, bootstrap gadget 2 x 10
    /// bits, key switch 8 x 2 bits.
    pub fn default_128() -> Self {
        let ks_noise = 2f64.powi(-15) * SQRT_TWO_OVER_PI;
        let bs_noise = 9e-9 * SQRT_TWO_OVER_PI;
        let max_noise = 2f64.powi(-6) * SQRT_TWO_OVER_PI;
        Self {
            lwe: LweParams::new(500, ks_noise, max_noise),
            tgsw: TGswParams::new(2, 10, TLweParams::new(1024, 1, bs_noise, max_noise)),
            ks_levels: 8,
            ks_base_bits: 2,
        }
    }

    /// Small insecure set for tests and experiments: same shape, much smaller
    /// lattice dimensions.
    pub fn toy() -> Self {
        let max_noise = 2f64.powi(-6) * SQRT_TWO_OVER_PI;
        Self {
            lwe: LweParams::new(64, 1e-8, max_noise),
            tgsw: TGswParams::new(2, 10, TLweParams::new(256, 1, 1e-9, max_noise)),
            ks_levels: 8,
            ks_base_bits: 2,
        }
    }
}
