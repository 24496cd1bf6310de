//! Boolean gate evaluation.
//!
//! Every binary gate is a small linear combination of its inputs followed by
//! a gate bootstrap at mu = 1/8; NOT is a plain negation and needs no
//! refresh. Inputs must come out of `ClientKey::encrypt` or a previous gate.

mod keys;
pub mod parameters;

pub use keys::{gen_keys, ClientKey, ServerKey};

use crate::lwe::{lwe_keyswitch, LweSample};
use crate::pbs::{bootstrap, bootstrap_wo_keyswitch};
use crate::torus::encode_message;

impl ServerKey {
    /// result = not (x and y).
    pub fn nand(&self, x: &LweSample, y: &LweSample) -> LweSample {
        let mu = encode_message(1, 8);
        let mut t = LweSample::noiseless_trivial(mu, &self.params.lwe);
        t -= x;
        t -= y;
        bootstrap(&self.bootstrap_key, &self.keyswitch_key, mu, &t)
    }

    pub fn and(&self, x: &LweSample, y: &LweSample) -> LweSample {
        let mu = encode_message(1, 8);
        let mut t = LweSample::noiseless_trivial(encode_message(-1, 8), &self.params.lwe);
        t += x;
        t += y;
        bootstrap(&self.bootstrap_key, &self.keyswitch_key, mu, &t)
    }

    pub fn or(&self, x: &LweSample, y: &LweSample) -> LweSample {
        let mu = encode_message(1, 8);
        let mut t = LweSample::noiseless_trivial(mu, &self.params.lwe);
        t += x;
        t += y;
        bootstrap(&self.bootstrap_key, &self.keyswitch_key, mu, &t)
    }

    /// XOR amplifies the inputs by two before the bootstrap so the four
    /// message combinations land on distinct quarters of the torus.
    pub fn xor(&self, x: &LweSample, y: &LweSample) -> LweSample {
        let mu = encode_message(1, 8);
        let mut t = LweSample::noiseless_trivial(encode_message(1, 4), &self.params.lwe);
        t.add_mul_assign(2, x);
        t.add_mul_assign(2, y);
        bootstrap(&self.bootstrap_key, &self.keyswitch_key, mu, &t)
    }

    /// Free gate: negation flips the encoded sign without bootstrapping.
    pub fn not(&self, x: &LweSample) -> LweSample {
        -x
    }

    /// result = if cond { x } else { y }.
    ///
    /// Two bootstraps in the extracted parameter set, one shared key switch.
    pub fn mux(&self, cond: &LweSample, x: &LweSample, y: &LweSample) -> LweSample {
        let mu = encode_message(1, 8);

        // cond and x
        let mut t = LweSample::noiseless_trivial(encode_message(-1, 8), &self.params.lwe);
        t += cond;
        t += x;
        let u1 = bootstrap_wo_keyswitch(&self.bootstrap_key, mu, &t);

        // (not cond) and y
        let mut t = LweSample::noiseless_trivial(encode_message(-1, 8), &self.params.lwe);
        t -= cond;
        t += y;
        let u2 = bootstrap_wo_keyswitch(&self.bootstrap_key, mu, &t);

        let extracted_params = self.params.tgsw.tlwe.extracted_lwe_params();
        let mut out = LweSample::noiseless_trivial(mu, &extracted_params);
        out += &u1;
        out += &u2;
        lwe_keyswitch(&self.keyswitch_key, &out)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::parameters::BoolParameters;
    use super::*;
    use crate::lwe::lwe_phase;
    use crate::random::DefaultSecureRng;

    #[test]
    fn fresh_encryption_round_trips() {
        let params = BoolParameters::default_128();
        let mut rng = DefaultSecureRng::seed_from_u64(0);
        let (ck, _sk) = gen_keys(&params, &mut rng);
        let c = ck.encrypt(true, &mut rng);
        assert!(lwe_phase(&c, &ck.lwe_key) > 0);
        assert!(ck.decrypt(&c));
        let c = ck.encrypt(false, &mut rng);
        assert!(!ck.decrypt(&c));
    }

    #[test]
    fn additive_combination_without_bootstrap() {
        // enc(m1) + enc(m2) - trivial(1/8) carries the NAND phase directly
        let params = BoolParameters::toy();
        let mut rng = DefaultSecureRng::seed_from_u64(40);
        let (ck, _sk) = gen_keys(&params, &mut rng);
        for (m1, m2) in [(false, false), (false, true), (true, false), (true, true)] {
            let c1 = ck.encrypt(m1, &mut rng);
            let c2 = ck.encrypt(m2, &mut rng);
            let mu = crate::torus::encode_message(1, 8);
            let mut t = LweSample::noiseless_trivial(mu, &params.lwe);
            t -= &c1;
            t -= &c2;
            let phase = lwe_phase(&t, &ck.lwe_key);
            assert_eq!(phase > 0, !(m1 && m2), "m1 {m1} m2 {m2}");
        }
    }

    #[test]
    fn gate_truth_tables() {
        let params = BoolParameters::toy();
        let mut rng = DefaultSecureRng::seed_from_u64(41);
        let (ck, sk) = gen_keys(&params, &mut rng);
        for (m1, m2) in [(false, false), (false, true), (true, false), (true, true)] {
            let c1 = ck.encrypt(m1, &mut rng);
            let c2 = ck.encrypt(m2, &mut rng);
            assert_eq!(ck.decrypt(&sk.nand(&c1, &c2)), !(m1 && m2), "nand {m1} {m2}");
            assert_eq!(ck.decrypt(&sk.and(&c1, &c2)), m1 && m2, "and {m1} {m2}");
            assert_eq!(ck.decrypt(&sk.or(&c1, &c2)), m1 || m2, "or {m1} {m2}");
            assert_eq!(ck.decrypt(&sk.xor(&c1, &c2)), m1 ^ m2, "xor {m1} {m2}");
            assert_eq!(ck.decrypt(&sk.not(&c1)), !m1, "not {m1}");
        }
    }

    #[test]
    fn mux_selects_either_branch() {
        let params = BoolParameters::toy();
        let mut rng = DefaultSecureRng::seed_from_u64(42);
        let (ck, sk) = gen_keys(&params, &mut rng);
        for cond in [false, true] {
            for (x, y) in [(false, true), (true, false), (true, true), (false, false)] {
                let c_cond = ck.encrypt(cond, &mut rng);
                let c_x = ck.encrypt(x, &mut rng);
                let c_y = ck.encrypt(y, &mut rng);
                let out = sk.mux(&c_cond, &c_x, &c_y);
                let want = if cond { x } else { y };
                assert_eq!(ck.decrypt(&out), want, "cond {cond} x {x} y {y}");
            }
        }
    }

    #[test]
    fn gates_compose_across_bootstraps() {
        let params = BoolParameters::toy();
        let mut rng = DefaultSecureRng::seed_from_u64(43);
        let (ck, sk) = gen_keys(&params, &mut rng);
        // full adder on (1, 1, carry 0) -> sum 0, carry 1
        let a = ck.encrypt(true, &mut rng);
        let b = ck.encrypt(true, &mut rng);
        let cin = ck.encrypt(false, &mut rng);
        let axb = sk.xor(&a, &b);
        let sum = sk.xor(&axb, &cin);
        let carry = sk.or(&sk.and(&a, &b), &sk.and(&axb, &cin));
        assert!(!ck.decrypt(&sum));
        assert!(ck.decrypt(&carry));
    }
}
