//! Gate-bootstrapped fully-homomorphic encryption over the discretised
//! torus, with a multi-key extension.
//!
//! The single-key API lives in [`bool`]: generate a key pair, encrypt
//! booleans, evaluate gates on the server key. The multi-key API lives in
//! [`multi_party`]: each party publishes a public key and a cloud-key part
//! over a shared reference string, the server expands them once, and gates
//! run against the aggregated key.
//!
//! ```no_run
//! use bitfrost::{bool::parameters::BoolParameters, bool::gen_keys, DefaultSecureRng};
//!
//! let mut rng = DefaultSecureRng::new();
//! let (client, server) = gen_keys(&BoolParameters::default_128(), &mut rng);
//! let x = client.encrypt(true, &mut rng);
//! let y = client.encrypt(false, &mut rng);
//! let out = server.nand(&x, &y);
//! assert!(client.decrypt(&out));
//! ```

pub mod bool;
pub mod decomposer;
pub mod fft;
pub mod lwe;
pub mod multi_party;
pub mod pbs;
pub mod poly;
mod random;
pub mod tgsw;
pub mod tlwe;
pub mod torus;

pub use bool::{gen_keys, ClientKey, ServerKey};
pub use fft::TransformedPolynomial;
pub use multi_party::{
    mk_decrypt, mk_encrypt, CloudKeyPart, MkBoolParameters, MkClientKey, MkCloudKey, MkLweSample,
    PublicKey, SharedKey,
};
pub use random::{DefaultSecureRng, fill_uniform_torus32, random_gaussian_torus32};
pub use torus::Torus32;
