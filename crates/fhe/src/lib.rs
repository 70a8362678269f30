#![crate_name = "fhe"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Leveled homomorphic encryption in the Brakerski-Fan-Vercauteren scheme.
//!
//! Integer vectors are encoded into plaintexts by the [`bfv::Encoder`],
//! encrypted by a [`bfv::Encryptor`], combined homomorphically by the
//! [`bfv::Evaluator`], and recovered by the [`bfv::Decryptor`]. All the
//! polynomial arithmetic is delegated to the `fhe-math` crate.

mod errors;

pub mod bfv;
pub use errors::{Error, ParametersError, Result};
