#![crate_name = "fhe_util"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Utilities for the fhe.rs library.

use num_bigint_dig::{prime::probably_prime, BigInt, BigUint, ModInverse};
use num_traits::ToPrimitive;
use rand::{CryptoRng, RngCore};

/// Number of Miller-Rabin rounds run on top of the Baillie-PSW test.
const PRIMALITY_ROUNDS: usize = 20;

/// Returns whether the modulus p is prime.
pub fn is_prime(p: u64) -> bool {
	p >= 2 && probably_prime(&BigUint::from(p), PRIMALITY_ROUNDS)
}

/// Returns the inverse of a modulo p, if it exists.
///
/// The modulus does not need to be prime.
pub fn inverse(a: u64, p: u64) -> Option<u64> {
	if p < 2 {
		return None;
	}
	let p_big = BigUint::from(p);
	let b = BigUint::from(a % p).mod_inverse(&p_big)?;
	let p_big = BigInt::from(p);
	(((b % &p_big) + &p_big) % &p_big).to_u64()
}

/// Sample a vector of independent centered binomial distributions of a given
/// variance. Returns an error if the variance is strictly less than 1 or
/// strictly larger than 16.
pub fn sample_vec_cbd<R: RngCore + CryptoRng>(
	vector_size: usize,
	variance: usize,
	rng: &mut R,
) -> Result<Vec<i64>, &'static str> {
	if !(1..=16).contains(&variance) {
		return Err("The variance should be between 1 and 16");
	}

	// A centered binomial of parameter eta has variance eta / 2.
	let eta = 2 * variance as u32;
	let mask = if eta == 64 {
		u64::MAX
	} else {
		(1u64 << eta) - 1
	};

	Ok((0..vector_size)
		.map(|_| {
			let r = rng.next_u64();
			let a = (r & mask).count_ones() as i64;
			let b = ((r >> eta) & mask).count_ones() as i64;
			a - b
		})
		.collect())
}

/// Compute the sample variance of a list of values.
pub fn variance<T: ToPrimitive>(values: &[T]) -> f64 {
	assert!(values.len() > 1);
	let values = values
		.iter()
		.map(|v| v.to_f64().unwrap_or(f64::NAN))
		.collect::<Vec<_>>();
	let mean = values.iter().sum::<f64>() / values.len() as f64;
	values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (values.len() as f64 - 1.0)
}
