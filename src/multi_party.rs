//! Multi-key gate bootstrapping.
//!
//! Each party holds its own LWE and ring keys. A shared key (a public CRS of
//! uniform polynomials) lets every party publish a public key b = s*a + e and
//! a uni-encryption of each of its LWE secret bits. The server expands the
//! uni-encryptions against all public keys into party-indexed samples, and
//! gates run a blind rotation over the concatenation of every party's mask.

use itertools::izip;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bool::parameters::SQRT_TWO_OVER_PI;
use crate::decomposer::SignedDecomposer;
use crate::fft::{transform_for, TransformedPolynomial};
use crate::lwe::{KeySwitchKey, LweKey, LweParams};
use crate::poly::{IntPolynomial, TorusPolynomial};
use crate::random::{fill_random_binary, fill_uniform_torus32, random_gaussian_torus32};
use crate::tlwe::{TLweKey, TLweParams};
use crate::torus::{encode_message, mod_switch_from_torus32, Torus32};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MkBoolParameters {
    pub lwe: LweParams,
    pub rlwe: TLweParams,
    pub decomposer: SignedDecomposer,
    pub ks_levels: usize,
    pub ks_base_bits: u32,
}

impl MkBoolParameters {
    /// The fixed ~128-bit multi-key set: n = 500, N = 1024, uni-encryption
    /// gadget 4 x 7 bits, key switch 8 x 2 bits.
    pub fn default_128() -> Self {
        let ks_noise = 2f64.powi(-15) * SQRT_TWO_OVER_PI;
        let max_noise = 2f64.powi(-6) * SQRT_TWO_OVER_PI;
        let params = Self {
            lwe: LweParams::new(500, ks_noise, max_noise),
            rlwe: TLweParams::new(1024, 1, 3.29e-10, max_noise),
            decomposer: SignedDecomposer::new(4, 7),
            ks_levels: 8,
            ks_base_bits: 2,
        };
        params.assert_valid();
        params
    }

    /// Small insecure set for tests; the full-depth gadget makes the
    /// expansion algebra exact.
    pub fn toy() -> Self {
        let max_noise = 2f64.powi(-6) * SQRT_TWO_OVER_PI;
        let params = Self {
            lwe: LweParams::new(32, 1e-8, max_noise),
            rlwe: TLweParams::new(256, 1, 1e-10, max_noise),
            decomposer: SignedDecomposer::new(4, 8),
            ks_levels: 8,
            ks_base_bits: 2,
        };
        params.assert_valid();
        params
    }

    /// The expansion and external-product formulas below are written for a
    /// single mask polynomial.
    fn assert_valid(&self) {
        assert_eq!(self.rlwe.k, 1, "multi-key formulas require k = 1");
    }

    fn levels(&self) -> usize {
        self.decomposer.levels()
    }
}

/// Per-party secret material.
pub struct MkClientKey {
    pub(crate) lwe_key: LweKey,
    pub(crate) rlwe_key: TLweKey,
    params: MkBoolParameters,
}

impl MkClientKey {
    pub fn generate<R: Rng>(params: &MkBoolParameters, rng: &mut R) -> Self {
        Self {
            lwe_key: LweKey::generate(&params.lwe, rng),
            rlwe_key: TLweKey::generate(&params.rlwe, rng),
            params: params.clone(),
        }
    }

    fn ring_secret(&self) -> &IntPolynomial {
        &self.rlwe_key.polynomials()[0]
    }
}

/// Common reference string: one uniform torus polynomial per gadget level,
/// known to every party.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SharedKey {
    pub a: Vec<TorusPolynomial>,
}

impl SharedKey {
    pub fn generate<R: Rng>(params: &MkBoolParameters, rng: &mut R) -> Self {
        let a = (0..params.levels())
            .map(|_| {
                let mut p = TorusPolynomial::zero(params.rlwe.n);
                fill_uniform_torus32(rng, &mut p.coeffs);
                p
            })
            .collect();
        Self { a }
    }
}

/// Party public key: b_i = s * a_i + e_i over the shared polynomials.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicKey {
    pub b: Vec<TorusPolynomial>,
}

impl PublicKey {
    pub fn generate<R: Rng>(
        key: &MkClientKey,
        shared: &SharedKey,
        params: &MkBoolParameters,
        rng: &mut R,
    ) -> Self {
        let plan = transform_for(params.rlwe.n);
        let s_t = plan.forward_int(key.ring_secret());
        let b = shared
            .a
            .iter()
            .map(|a_i| {
                let mut acc = TransformedPolynomial::zero(params.rlwe.n);
                acc.add_mul_assign(&s_t, &plan.forward_torus(a_i));
                let mut b_i = plan.inverse_torus(&acc);
                b_i.coeffs
                    .iter_mut()
                    .for_each(|c| *c = random_gaussian_torus32(rng, *c, params.rlwe.min_noise));
                b_i
            })
            .collect();
        Self { b }
    }
}

/// Uni-encryption of a message polynomial m by one party:
/// (c0, c1) encrypt m under the party secret, (d0, d1) tie m to the shared
/// polynomials through a fresh 0/1 polynomial r, and (f0, f1) encrypt r.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UniEncSample {
    pub c0: Vec<TorusPolynomial>,
    pub c1: Vec<TorusPolynomial>,
    pub d0: Vec<TorusPolynomial>,
    pub d1: Vec<TorusPolynomial>,
    pub f0: Vec<TorusPolynomial>,
    pub f1: Vec<TorusPolynomial>,
}

pub fn uni_encrypt<R: Rng>(
    m: &IntPolynomial,
    key: &MkClientKey,
    shared: &SharedKey,
    public: &PublicKey,
    params: &MkBoolParameters,
    rng: &mut R,
) -> UniEncSample {
    let n = params.rlwe.n;
    assert_eq!(m.coeffs.len(), n, "message does not match ring size");
    let plan = transform_for(n);
    let alpha = params.rlwe.min_noise;
    let gadget = params.decomposer.gadget();

    let s_t = plan.forward_int(key.ring_secret());
    let mut r = IntPolynomial::zero(n);
    fill_random_binary(rng, &mut r.coeffs);
    let r_t = plan.forward_int(&r);

    let levels = params.levels();
    let mut out = UniEncSample {
        c0: Vec::with_capacity(levels),
        c1: Vec::with_capacity(levels),
        d0: Vec::with_capacity(levels),
        d1: Vec::with_capacity(levels),
        f0: Vec::with_capacity(levels),
        f1: Vec::with_capacity(levels),
    };

    // b = factor * x + e (+ message), with the factor in the transformed
    // domain already
    let enc_under = |x: &TorusPolynomial,
                     msg: Option<&TorusPolynomial>,
                     factor_t: &TransformedPolynomial,
                     rng: &mut R| {
        let mut acc = TransformedPolynomial::zero(n);
        acc.add_mul_assign(factor_t, &plan.forward_torus(x));
        let mut b = plan.inverse_torus(&acc);
        b.coeffs
            .iter_mut()
            .for_each(|c| *c = random_gaussian_torus32(rng, *c, alpha));
        if let Some(msg) = msg {
            b += msg;
        }
        b
    };

    for (i, &g_i) in gadget.iter().enumerate() {
        let m_g = scale_int_poly(m, g_i);
        let r_g = scale_int_poly(&r, g_i);

        let mut c1 = TorusPolynomial::zero(n);
        fill_uniform_torus32(rng, &mut c1.coeffs);
        let c0 = enc_under(&c1, Some(&m_g), &s_t, rng);

        let mut f1 = TorusPolynomial::zero(n);
        fill_uniform_torus32(rng, &mut f1.coeffs);
        let f0 = enc_under(&f1, Some(&r_g), &s_t, rng);

        let d1 = enc_under(&shared.a[i], Some(&m_g), &r_t, rng);
        let d0 = enc_under(&public.b[i], None, &r_t, rng);

        out.c0.push(c0);
        out.c1.push(c1);
        out.d0.push(d0);
        out.d1.push(d1);
        out.f0.push(f0);
        out.f1.push(f1);
    }
    out
}

/// m * g as a torus polynomial.
fn scale_int_poly(m: &IntPolynomial, g: Torus32) -> TorusPolynomial {
    TorusPolynomial::from_coeffs(m.coeffs.iter().map(|&c| c.wrapping_mul(g)).collect())
}

/// Uni-encryption expanded against all parties' public keys and moved to the
/// transformed domain; usable in any P-party external product.
///
/// `x` and `y` hold one column of `levels` polynomials per party.
#[derive(Clone, Debug)]
pub struct MkTransformedRgsw {
    x: Vec<Vec<TransformedPolynomial>>,
    y: Vec<Vec<TransformedPolynomial>>,
    c0: Vec<TransformedPolynomial>,
    c1: Vec<TransformedPolynomial>,
    party: usize,
}

/// Expands a party's uni-encryption: for every other party q the column
/// (x[q], y[q]) re-encrypts r * b_q through the gadget decomposition of
/// b_q - b_p dotted with (f0, f1); the owner's column keeps (d0, d1) as is.
pub fn expand(
    ue: &UniEncSample,
    party: usize,
    public_keys: &[PublicKey],
    params: &MkBoolParameters,
) -> MkTransformedRgsw {
    let n = params.rlwe.n;
    let parties = public_keys.len();
    assert!(party < parties, "party index {party} out of range");
    let plan = transform_for(n);
    let levels = params.levels();

    let mut x = Vec::with_capacity(parties);
    let mut y = Vec::with_capacity(parties);
    for q in 0..parties {
        if q == party {
            x.push(ue.d0.iter().map(|p| plan.forward_torus(p)).collect());
            y.push(ue.d1.iter().map(|p| plan.forward_torus(p)).collect());
            continue;
        }
        let mut x_q = Vec::with_capacity(levels);
        let mut y_q = Vec::with_capacity(levels);
        for j in 0..levels {
            let mut diff = public_keys[q].b[j].clone();
            diff -= &public_keys[party].b[j];
            let u = params.decomposer.decompose_poly(&diff);

            let mut acc_x = TransformedPolynomial::zero(n);
            let mut acc_y = TransformedPolynomial::zero(n);
            for (u_l, f0_l, f1_l) in izip!(u.iter(), ue.f0.iter(), ue.f1.iter()) {
                let u_t = plan.forward_int(u_l);
                acc_x.add_mul_assign(&u_t, &plan.forward_torus(f0_l));
                acc_y.add_mul_assign(&u_t, &plan.forward_torus(f1_l));
            }
            let mut x_poly = plan.inverse_torus(&acc_x);
            x_poly += &ue.d0[j];
            x_q.push(plan.forward_torus(&x_poly));
            y_q.push(plan.forward_torus(&plan.inverse_torus(&acc_y)));
        }
        x.push(x_q);
        y.push(y_q);
    }

    MkTransformedRgsw {
        x,
        y,
        c0: ue.c0.iter().map(|p| plan.forward_torus(p)).collect(),
        c1: ue.c1.iter().map(|p| plan.forward_torus(p)).collect(),
        party,
    }
}

/// Ring sample under the concatenation of every party's ring key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MkTLweSample {
    pub a: Vec<TorusPolynomial>,
    pub b: TorusPolynomial,
    pub current_variance: f64,
}

impl MkTLweSample {
    pub fn noiseless_trivial(mu: TorusPolynomial, parties: usize, n: usize) -> Self {
        assert_eq!(mu.coeffs.len(), n, "message does not match ring size");
        Self {
            a: vec![TorusPolynomial::zero(n); parties],
            b: mu,
            current_variance: 0.0,
        }
    }

    pub fn parties(&self) -> usize {
        self.a.len()
    }

    fn mul_by_x_pow_minus_one(&self, exp: usize) -> MkTLweSample {
        MkTLweSample {
            a: self.a.iter().map(|p| p.mul_by_x_pow_minus_one(exp)).collect(),
            b: self.b.mul_by_x_pow_minus_one(exp),
            current_variance: 2.0 * self.current_variance,
        }
    }

    fn add_assign(&mut self, rhs: &MkTLweSample) {
        assert_eq!(self.a.len(), rhs.a.len(), "party count mismatch");
        izip!(self.a.iter_mut(), rhs.a.iter()).for_each(|(x, y)| *x += y);
        self.b += &rhs.b;
        self.current_variance += rhs.current_variance;
    }

    /// Per-party coefficient extraction, as in the single-key case.
    pub fn extract_sample(&self) -> MkLweSample {
        let n = self.b.coeffs.len();
        let a = self
            .a
            .iter()
            .map(|poly| {
                let mut block = Vec::with_capacity(n);
                block.push(poly.coeffs[0]);
                for i in 1..n {
                    block.push(poly.coeffs[n - i].wrapping_neg());
                }
                block
            })
            .collect();
        MkLweSample {
            a,
            b: self.b.coeffs[0],
            current_variance: self.current_variance,
        }
    }
}

/// LWE sample under the concatenation of every party's LWE key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MkLweSample {
    /// One mask block per party.
    pub a: Vec<Vec<Torus32>>,
    pub b: Torus32,
    pub current_variance: f64,
}

impl MkLweSample {
    pub fn noiseless_trivial(mu: Torus32, parties: usize, n: usize) -> Self {
        Self {
            a: vec![vec![0; n]; parties],
            b: mu,
            current_variance: 0.0,
        }
    }

    fn sub_assign(&mut self, rhs: &MkLweSample) {
        assert_eq!(self.a.len(), rhs.a.len(), "party count mismatch");
        for (x, y) in izip!(self.a.iter_mut(), rhs.a.iter()) {
            assert_eq!(x.len(), y.len(), "mask block length mismatch");
            izip!(x.iter_mut(), y.iter()).for_each(|(xi, yi)| *xi = xi.wrapping_sub(*yi));
        }
        self.b = self.b.wrapping_sub(rhs.b);
        self.current_variance += rhs.current_variance;
    }
}

/// Gadget dot of transformed digits against a column of `levels` polynomials,
/// inverse-transformed back to the coefficient domain.
fn gadget_dot(
    plan: &crate::fft::NegacyclicTransform,
    digits: &[TransformedPolynomial],
    column: &[TransformedPolynomial],
    n: usize,
) -> TorusPolynomial {
    assert_eq!(digits.len(), column.len(), "gadget level mismatch");
    let mut acc = TransformedPolynomial::zero(n);
    for (d, c) in izip!(digits.iter(), column.iter()) {
        acc.add_mul_assign(d, c);
    }
    plan.inverse_torus(&acc)
}

/// Multi-key external product acc <- rgsw (x) acc.
///
/// Cross-party mask blocks are dotted against the owner's d1 column; the
/// owner block collects every party's y column plus the c1 dot, and the body
/// every x column plus the c0 dot. The outer per-party sums are performed on
/// inverse-transformed samples to keep the transform dynamic range bounded.
pub fn mk_extern_mul(acc: &mut MkTLweSample, rgsw: &MkTransformedRgsw, params: &MkBoolParameters) {
    let n = params.rlwe.n;
    let parties = acc.parties();
    let p = rgsw.party;
    assert!(p < parties, "sample does not cover the owning party");
    assert_eq!(rgsw.x.len(), parties, "sample and expanded key party count mismatch");
    let plan = transform_for(n);

    // decompose and transform every mask block and the body
    let ua_t: Vec<Vec<TransformedPolynomial>> = acc
        .a
        .iter()
        .map(|a_i| {
            params
                .decomposer
                .decompose_poly(a_i)
                .iter()
                .map(|d| plan.forward_int(d))
                .collect()
        })
        .collect();
    let ub_t: Vec<TransformedPolynomial> = params
        .decomposer
        .decompose_poly(&acc.b)
        .iter()
        .map(|d| plan.forward_int(d))
        .collect();

    let mut new_a: Vec<TorusPolynomial> = (0..parties)
        .map(|i| {
            if i == p {
                TorusPolynomial::zero(n)
            } else {
                gadget_dot(&plan, &ua_t[i], &rgsw.y[p], n)
            }
        })
        .collect();

    let mut own = gadget_dot(&plan, &ub_t, &rgsw.c1, n);
    for (i, ua_i) in ua_t.iter().enumerate() {
        own += &gadget_dot(&plan, ua_i, &rgsw.y[i], n);
    }
    new_a[p] = own;

    let mut body = gadget_dot(&plan, &ub_t, &rgsw.c0, n);
    for (i, ua_i) in ua_t.iter().enumerate() {
        body += &gadget_dot(&plan, ua_i, &rgsw.x[i], n);
    }

    acc.a = new_a;
    acc.b = body;

    let levels = params.levels() as f64;
    let half_base = (1u32 << (params.decomposer.base_bits() - 1)) as f64;
    let eps = crate::torus::torus32_to_f64((params.decomposer.rounding_error_bound() / 2) as i32);
    let fresh = params.rlwe.min_noise * params.rlwe.min_noise;
    acc.current_variance += (parties as f64 + 1.0) * levels * n as f64 * half_base * half_base
        * fresh
        + (parties as f64 + 1.0) * n as f64 * eps * eps;
}

/// One multi-key blind-rotation step for the owning party of `rgsw`.
pub fn mk_cmux(
    acc: &mut MkTLweSample,
    rgsw: &MkTransformedRgsw,
    bara: usize,
    params: &MkBoolParameters,
) {
    if bara == 0 {
        return;
    }
    let mut shifted = acc.mul_by_x_pow_minus_one(bara);
    mk_extern_mul(&mut shifted, rgsw, params);
    acc.add_assign(&shifted);
}

/// Rotates the accumulator by sum over parties i and positions j of
/// s_ij * bara[i][j].
pub fn mk_blind_rotate(
    acc: &mut MkTLweSample,
    bk: &[Vec<MkTransformedRgsw>],
    bara: &[Vec<usize>],
    params: &MkBoolParameters,
) {
    assert_eq!(bk.len(), bara.len(), "party count mismatch");
    for (bk_i, bara_i) in izip!(bk.iter(), bara.iter()) {
        assert_eq!(bk_i.len(), bara_i.len(), "rotation count does not match key size");
        for (rgsw, &exp) in izip!(bk_i.iter(), bara_i.iter()) {
            mk_cmux(acc, rgsw, exp, params);
        }
    }
}

/// Switches every party block of an extracted sample back to that party's
/// LWE key.
pub fn mk_keyswitch(ks: &[KeySwitchKey], sample: &MkLweSample) -> MkLweSample {
    assert_eq!(ks.len(), sample.a.len(), "one key-switch key per party required");
    let out_n = ks[0].out_params().n;
    let mut out = MkLweSample::noiseless_trivial(sample.b, sample.a.len(), out_n);
    let mut b = out.b;
    let mut variance = sample.current_variance;
    for (ks_p, block, out_block) in izip!(ks.iter(), sample.a.iter(), out.a.iter_mut()) {
        ks_p.accumulate(block, out_block, &mut b, &mut variance);
    }
    out.b = b;
    out.current_variance = variance;
    out
}

/// One party's published contribution to the evaluation key.
pub struct CloudKeyPart {
    pub public_key: PublicKey,
    pub(crate) bk_uni: Vec<UniEncSample>,
    pub(crate) ks: KeySwitchKey,
}

impl CloudKeyPart {
    /// Uni-encrypts every LWE secret bit and builds the key-switch key from
    /// the party's extracted ring key.
    pub fn generate<R: Rng>(
        key: &MkClientKey,
        shared: &SharedKey,
        params: &MkBoolParameters,
        rng: &mut R,
    ) -> Self {
        let public_key = PublicKey::generate(key, shared, params, rng);
        let n = params.rlwe.n;
        let bk_uni = key
            .lwe_key
            .coeffs()
            .iter()
            .map(|&s_j| {
                let m = IntPolynomial::constant(s_j, n);
                uni_encrypt(&m, key, shared, &public_key, params, rng)
            })
            .collect();
        let ks = KeySwitchKey::generate(
            &key.rlwe_key.extracted_lwe_key(),
            &key.lwe_key,
            params.ks_levels,
            params.ks_base_bits,
            rng,
        );
        Self { public_key, bk_uni, ks }
    }
}

/// Aggregated evaluation key for a fixed set of parties.
pub struct MkCloudKey {
    bk: Vec<Vec<MkTransformedRgsw>>,
    ks: Vec<KeySwitchKey>,
    params: MkBoolParameters,
}

impl MkCloudKey {
    /// Expands every party's uni-encrypted bootstrap key against the full
    /// set of public keys.
    pub fn from_parts(parts: &[CloudKeyPart], params: &MkBoolParameters) -> Self {
        assert!(!parts.is_empty(), "at least one party required");
        let public_keys: Vec<PublicKey> =
            parts.iter().map(|p| p.public_key.clone()).collect();
        let bk = parts
            .iter()
            .enumerate()
            .map(|(party, part)| {
                part.bk_uni
                    .iter()
                    .map(|ue| expand(ue, party, &public_keys, params))
                    .collect()
            })
            .collect();
        Self {
            bk,
            ks: parts.iter().map(|p| p.ks.clone()).collect(),
            params: params.clone(),
        }
    }

    pub fn parties(&self) -> usize {
        self.bk.len()
    }

    /// Multi-key gate bootstrap at the given mu.
    pub fn bootstrap(&self, mu: Torus32, x: &MkLweSample) -> MkLweSample {
        assert_eq!(x.a.len(), self.parties(), "sample party count mismatch");
        let n = self.params.rlwe.n;
        let n2 = 2 * n;
        let barb = mod_switch_from_torus32(x.b, n2 as u32);
        let bara: Vec<Vec<usize>> = x
            .a
            .iter()
            .map(|block| {
                block
                    .iter()
                    .map(|&a| mod_switch_from_torus32(a, n2 as u32))
                    .collect()
            })
            .collect();

        let testvect = TorusPolynomial::uniform_constant(mu, n);
        let rotated = testvect.mul_by_x_pow((n2 - barb) & (n2 - 1));
        let mut acc = MkTLweSample::noiseless_trivial(rotated, self.parties(), n);
        mk_blind_rotate(&mut acc, &self.bk, &bara, &self.params);
        mk_keyswitch(&self.ks, &acc.extract_sample())
    }

    /// result = not (x and y).
    pub fn nand(&self, x: &MkLweSample, y: &MkLweSample) -> MkLweSample {
        let mu = encode_message(1, 8);
        let mut t = MkLweSample::noiseless_trivial(mu, self.parties(), self.params.lwe.n);
        t.sub_assign(x);
        t.sub_assign(y);
        self.bootstrap(mu, &t)
    }
}

/// Fresh encryption by one party: the other mask blocks stay zero.
pub fn mk_encrypt<R: Rng>(
    key: &MkClientKey,
    party: usize,
    parties: usize,
    m: bool,
    rng: &mut R,
) -> MkLweSample {
    assert!(party < parties, "party index {party} out of range");
    let params = &key.params;
    let mu = if m { encode_message(1, 8) } else { encode_message(-1, 8) };
    let mut out = MkLweSample::noiseless_trivial(0, parties, params.lwe.n);
    fill_uniform_torus32(rng, &mut out.a[party]);
    let mut b = random_gaussian_torus32(rng, mu, params.lwe.min_noise);
    izip!(out.a[party].iter(), key.lwe_key.coeffs()).for_each(|(ai, si)| {
        b = b.wrapping_add(ai.wrapping_mul(*si));
    });
    out.b = b;
    out.current_variance = params.lwe.min_noise * params.lwe.min_noise;
    out
}

/// Joint phase b - sum over parties of <a_p, s_p>.
pub fn mk_phase(keys: &[MkClientKey], c: &MkLweSample) -> Torus32 {
    assert_eq!(keys.len(), c.a.len(), "every party's key is required");
    let mut phase = c.b;
    for (key, block) in izip!(keys.iter(), c.a.iter()) {
        assert_eq!(block.len(), key.params.lwe.n, "mask block length mismatch");
        izip!(block.iter(), key.lwe_key.coeffs()).for_each(|(ai, si)| {
            phase = phase.wrapping_sub(ai.wrapping_mul(*si));
        });
    }
    phase
}

/// Decryption with every party's secret key present.
pub fn mk_decrypt(keys: &[MkClientKey], c: &MkLweSample) -> bool {
    mk_phase(keys, c) > 0
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::random::DefaultSecureRng;

    fn setup(parties: usize, seed: u64) -> (MkBoolParameters, Vec<MkClientKey>, MkCloudKey) {
        let params = MkBoolParameters::toy();
        let mut rng = DefaultSecureRng::seed_from_u64(seed);
        let shared = SharedKey::generate(&params, &mut rng);
        let keys: Vec<MkClientKey> = (0..parties)
            .map(|_| MkClientKey::generate(&params, &mut rng))
            .collect();
        let parts: Vec<CloudKeyPart> = keys
            .iter()
            .map(|k| CloudKeyPart::generate(k, &shared, &params, &mut rng))
            .collect();
        let cloud = MkCloudKey::from_parts(&parts, &params);
        (params, keys, cloud)
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let params = MkBoolParameters::toy();
        let mut rng = DefaultSecureRng::seed_from_u64(50);
        let keys: Vec<MkClientKey> = (0..2)
            .map(|_| MkClientKey::generate(&params, &mut rng))
            .collect();
        for party in 0..2 {
            for m in [false, true] {
                let c = mk_encrypt(&keys[party], party, 2, m, &mut rng);
                assert_eq!(mk_decrypt(&keys, &c), m, "party {party} m {m}");
            }
        }
    }

    #[test]
    fn two_party_nand_truth_table() {
        let (_, keys, cloud) = setup(2, 51);
        let mut rng = DefaultSecureRng::seed_from_u64(52);
        for (m1, m2) in [(false, false), (false, true), (true, false), (true, true)] {
            for trial in 0..10 {
                let c1 = mk_encrypt(&keys[0], 0, 2, m1, &mut rng);
                let c2 = mk_encrypt(&keys[1], 1, 2, m2, &mut rng);
                let out = cloud.nand(&c1, &c2);
                assert_eq!(
                    mk_decrypt(&keys, &out),
                    !(m1 && m2),
                    "m1 {m1} m2 {m2} trial {trial}"
                );
            }
        }
    }

    #[test]
    fn three_party_cmux_rotates_or_passes_through() {
        // stretch setup: P = 3, exercising uni-encryption and expansion with
        // two cross-party columns
        let params = MkBoolParameters::toy();
        let mut rng = DefaultSecureRng::seed_from_u64(53);
        let shared = SharedKey::generate(&params, &mut rng);
        let keys: Vec<MkClientKey> = (0..3)
            .map(|_| MkClientKey::generate(&params, &mut rng))
            .collect();
        let publics: Vec<PublicKey> = keys
            .iter()
            .map(|k| PublicKey::generate(k, &shared, &params, &mut rng))
            .collect();

        let n = params.rlwe.n;
        let mu = encode_message(1, 8);
        let mut v = TorusPolynomial::zero(n);
        v.coeffs[0] = mu;
        v.coeffs[7] = mu.wrapping_neg();

        for (party, bit) in [(1usize, 0i32), (2, 1), (0, 1)] {
            let m = IntPolynomial::constant(bit, n);
            let ue = uni_encrypt(&m, &keys[party], &shared, &publics[party], &params, &mut rng);
            let rgsw = expand(&ue, party, &publics, &params);

            let mut acc = MkTLweSample::noiseless_trivial(v.clone(), 3, n);
            let bara = 5;
            mk_cmux(&mut acc, &rgsw, bara, &params);

            let want = if bit == 0 { v.clone() } else { v.mul_by_x_pow(bara) };
            let extracted = acc.extract_sample();
            // decrypt the constant coefficient against all ring keys
            let mut phase = extracted.b;
            for (key, block) in izip!(keys.iter(), extracted.a.iter()) {
                izip!(block.iter(), key.rlwe_key.extracted_lwe_key().coeffs())
                    .for_each(|(ai, si)| phase = phase.wrapping_sub(ai.wrapping_mul(*si)));
            }
            let err = phase.wrapping_sub(want.coeffs[0]);
            assert!(err.abs() < 1 << 25, "party {party} bit {bit}: err {err}");
        }
    }

    #[test]
    fn three_party_nand() {
        let (_, keys, cloud) = setup(3, 54);
        let mut rng = DefaultSecureRng::seed_from_u64(55);
        let c1 = mk_encrypt(&keys[0], 0, 3, true, &mut rng);
        let c2 = mk_encrypt(&keys[2], 2, 3, true, &mut rng);
        let out = cloud.nand(&c1, &c2);
        assert!(!mk_decrypt(&keys, &out));
        let c3 = mk_encrypt(&keys[1], 1, 3, false, &mut rng);
        let out = cloud.nand(&c1, &c3);
        assert!(mk_decrypt(&keys, &out));
    }

    #[test]
    fn keyswitch_brings_sample_back_to_party_keys() {
        let (params, keys, cloud) = setup(2, 56);
        let mut rng = DefaultSecureRng::seed_from_u64(57);
        let c = mk_encrypt(&keys[0], 0, 2, true, &mut rng);
        let refreshed = cloud.bootstrap(encode_message(1, 8), &c);
        assert_eq!(refreshed.a.len(), 2);
        for block in &refreshed.a {
            assert_eq!(block.len(), params.lwe.n);
        }
        assert!(mk_decrypt(&keys, &refreshed));
    }
}
