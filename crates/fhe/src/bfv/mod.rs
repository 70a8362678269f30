#![warn(missing_docs, unused_imports)]

//! The Brakerski-Fan-Vercauteren homomorphic encryption scheme

mod ciphertext;
mod decryptor;
mod encoder;
mod encryptor;
mod evaluator;
mod keygen;
mod keys;
mod ops;
mod parameters;
mod plaintext;
mod prng;

pub mod traits;
pub use ciphertext::Ciphertext;
pub use decryptor::Decryptor;
pub use encoder::Encoder;
pub use encryptor::{
	new_encryptor, Encryptor, KeyMaterial, PkEncryptor, PrngEncryptor, SkEncryptor,
};
pub use evaluator::{Evaluator, Operand};
pub use keygen::KeyGenerator;
pub use keys::{
	EvaluationKey, PublicKey, RelinearizationKey, RotationKey, RotationKeySet, SecretKey,
};
pub use parameters::{
	BfvParameters, BfvParametersBuilder, BfvParametersLiteral, ErrorDistribution,
	SecretDistribution,
};
pub use plaintext::{Encoding, Plaintext};
pub use prng::KeyedPrng;
