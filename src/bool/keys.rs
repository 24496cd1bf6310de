//! Client and server key material for the boolean gate API.

use rand::Rng;

use super::parameters::BoolParameters;
use crate::lwe::{lwe_encrypt, lwe_phase, KeySwitchKey, LweKey, LweSample};
use crate::pbs::BootstrapKey;
use crate::tlwe::TLweKey;
use crate::torus::encode_message;

/// Secret key material: the LWE key samples are encrypted under and the ring
/// key the bootstrapping key refers to.
pub struct ClientKey {
    pub(crate) lwe_key: LweKey,
    pub(crate) tlwe_key: TLweKey,
    pub(crate) params: BoolParameters,
}

/// Published evaluation key: bootstrapping key plus the key-switching key
/// back into the LWE parameter set. Safe to hand to an untrusted evaluator.
pub struct ServerKey {
    pub(crate) bootstrap_key: BootstrapKey,
    pub(crate) keyswitch_key: KeySwitchKey,
    pub(crate) params: BoolParameters,
}

/// Generates a fresh (client, server) key pair.
pub fn gen_keys<R: Rng>(params: &BoolParameters, rng: &mut R) -> (ClientKey, ServerKey) {
    let lwe_key = LweKey::generate(&params.lwe, rng);
    let tlwe_key = TLweKey::generate(&params.tgsw.tlwe, rng);
    let bootstrap_key = BootstrapKey::generate(&lwe_key, &tlwe_key, &params.tgsw, rng);
    let keyswitch_key = KeySwitchKey::generate(
        &tlwe_key.extracted_lwe_key(),
        &lwe_key,
        params.ks_levels,
        params.ks_base_bits,
        rng,
    );
    (
        ClientKey {
            lwe_key,
            tlwe_key,
            params: params.clone(),
        },
        ServerKey {
            bootstrap_key,
            keyswitch_key,
            params: params.clone(),
        },
    )
}

impl ClientKey {
    /// Encrypts a boolean as +-1/8 on the torus.
    pub fn encrypt<R: Rng>(&self, m: bool, rng: &mut R) -> LweSample {
        let mu = if m { encode_message(1, 8) } else { encode_message(-1, 8) };
        lwe_encrypt(mu, self.params.lwe.min_noise, &self.lwe_key, rng)
    }

    /// Thresholds on the sign of the phase.
    pub fn decrypt(&self, c: &LweSample) -> bool {
        lwe_phase(c, &self.lwe_key) > 0
    }

    pub fn params(&self) -> &BoolParameters {
        &self.params
    }
}

impl ServerKey {
    pub fn params(&self) -> &BoolParameters {
        &self.params
    }
}
