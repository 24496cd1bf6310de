//! End-to-end gate evaluation on the fixed 128-bit parameter set.

use rand::SeedableRng;

use bitfrost::bool::parameters::BoolParameters;
use bitfrost::{gen_keys, DefaultSecureRng};

#[test]
fn nand_truth_table_at_full_parameters() {
    let params = BoolParameters::default_128();
    let mut rng = DefaultSecureRng::seed_from_u64(0);
    let (ck, sk) = gen_keys(&params, &mut rng);

    for (m1, m2) in [(false, false), (false, true), (true, false), (true, true)] {
        let c1 = ck.encrypt(m1, &mut rng);
        let c2 = ck.encrypt(m2, &mut rng);
        let out = sk.nand(&c1, &c2);
        assert_eq!(ck.decrypt(&out), !(m1 && m2), "nand {m1} {m2}");
    }
}

#[test]
fn xor_truth_table_at_full_parameters() {
    let params = BoolParameters::default_128();
    let mut rng = DefaultSecureRng::seed_from_u64(1);
    let (ck, sk) = gen_keys(&params, &mut rng);

    for (m1, m2) in [(false, false), (false, true), (true, false), (true, true)] {
        let c1 = ck.encrypt(m1, &mut rng);
        let c2 = ck.encrypt(m2, &mut rng);
        let out = sk.xor(&c1, &c2);
        assert_eq!(ck.decrypt(&out), m1 ^ m2, "xor {m1} {m2}");
    }
}

#[test]
fn gate_outputs_feed_further_gates() {
    let params = BoolParameters::default_128();
    let mut rng = DefaultSecureRng::seed_from_u64(2);
    let (ck, sk) = gen_keys(&params, &mut rng);

    // not (not (a nand b)) == a nand b, through two extra gate layers
    let a = ck.encrypt(true, &mut rng);
    let b = ck.encrypt(true, &mut rng);
    let nand = sk.nand(&a, &b);
    let and = sk.and(&a, &b);
    let check = sk.or(&nand, &and);
    assert!(ck.decrypt(&check));
    assert!(!ck.decrypt(&nand));
    assert!(ck.decrypt(&and));
}
