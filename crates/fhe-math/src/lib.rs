#![crate_name = "fhe_math"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Mathematical utilities for the fhe.rs library.
//!
//! The crate is organized bottom-up: [`zq`] implements word-size modular
//! arithmetic and the negacyclic number-theoretic transform, [`rns`] handles
//! exact conversions between residue number systems, and [`rq`] builds RNS
//! polynomials in the cyclotomic ring `Z_q[X]/(X^N+1)` on top of both.

mod errors;

pub mod rns;
pub mod rq;
pub mod zq;

pub use errors::{Error, Result};
