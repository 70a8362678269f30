#![warn(missing_docs, unused_imports)]

//! Residue-Number System operations.

use crate::{zq::Modulus, Error, Result};
use itertools::izip;
use ndarray::ArrayView1;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;

mod scaler;

pub use scaler::{RnsScaler, ScalingFactor};

/// Context for a Residue Number System.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RnsContext {
	moduli_u64: Vec<u64>,
	moduli: Vec<Modulus>,
	q_tilde: Vec<u64>,
	q_tilde_shoup: Vec<u64>,
	q_star: Vec<BigUint>,
	garner: Vec<BigUint>,
	product: BigUint,
}

impl RnsContext {
	/// Create a RNS context from a list of moduli.
	///
	/// Returns an error if the list is empty, or if the moduli are not
	/// coprime.
	pub fn new(moduli_u64: &[u64]) -> Result<Self> {
		if moduli_u64.is_empty() {
			return Err(Error::Default("The list of moduli is empty".to_string()));
		}

		let mut product = BigUint::from(1u64);
		for (i, qi) in moduli_u64.iter().enumerate() {
			for qj in &moduli_u64[i + 1..] {
				if qi.gcd(qj) != 1 {
					return Err(Error::Default("The moduli are not coprime".to_string()));
				}
			}
			product *= *qi;
		}

		let mut moduli = Vec::with_capacity(moduli_u64.len());
		let mut q_tilde = Vec::with_capacity(moduli_u64.len());
		let mut q_tilde_shoup = Vec::with_capacity(moduli_u64.len());
		let mut q_star = Vec::with_capacity(moduli_u64.len());
		let mut garner = Vec::with_capacity(moduli_u64.len());
		for qi in moduli_u64 {
			let m = Modulus::new(*qi)?;

			// q* = product / qi and q~ = (q*)^(-1) mod qi.
			let q_star_i = &product / *qi;
			let q_tilde_i = m
				.inv(reduce_biguint(&q_star_i, *qi))
				.ok_or_else(|| Error::Default("The moduli are not coprime".to_string()))?;

			garner.push(&q_star_i * q_tilde_i);
			q_star.push(q_star_i);
			q_tilde_shoup.push(m.shoup(q_tilde_i));
			q_tilde.push(q_tilde_i);
			moduli.push(m);
		}

		Ok(Self {
			moduli_u64: moduli_u64.to_owned(),
			moduli,
			q_tilde,
			q_tilde_shoup,
			q_star,
			garner,
			product,
		})
	}

	/// Returns the product of the moduli used when creating the RNS context.
	pub const fn modulus(&self) -> &BigUint {
		&self.product
	}

	/// Returns the moduli of the RNS context.
	pub fn moduli(&self) -> &[u64] {
		&self.moduli_u64
	}

	/// Project a BigUint into its rests.
	pub fn project(&self, a: &BigUint) -> Vec<u64> {
		self.moduli_u64
			.iter()
			.map(|qi| reduce_biguint(a, *qi))
			.collect()
	}

	/// Lift rests into a BigUint.
	///
	/// Aborts if the number of rests is different than the number of moduli in
	/// debug mode.
	pub fn lift(&self, rests: ArrayView1<u64>) -> BigUint {
		debug_assert_eq!(rests.len(), self.moduli_u64.len());

		let mut result = BigUint::zero();
		izip!(
			rests.iter(),
			self.q_star.iter(),
			self.q_tilde.iter(),
			self.q_tilde_shoup.iter(),
			self.moduli.iter()
		)
		.for_each(|(xi, q_star_i, q_tilde_i, q_tilde_shoup_i, qi)| {
			result += q_star_i * qi.mul_shoup(qi.reduce(*xi), *q_tilde_i, *q_tilde_shoup_i);
		});

		result % &self.product
	}

	/// Getter for the i-th garner coefficient, i.e. the integer that is 1
	/// modulo the i-th modulus and 0 modulo all the others.
	pub fn get_garner(&self, i: usize) -> Option<&BigUint> {
		self.garner.get(i)
	}
}

/// Reduce a BigUint modulo a word-size modulus.
pub(crate) fn reduce_biguint(a: &BigUint, q: u64) -> u64 {
	(a % q).iter_u64_digits().next().unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::RnsContext;
	use ndarray::ArrayView1;
	use num_bigint::BigUint;
	use rand::{thread_rng, RngCore};

	#[test]
	fn constructor() {
		assert!(RnsContext::new(&[2]).is_ok());
		assert!(RnsContext::new(&[2, 3]).is_ok());
		assert!(RnsContext::new(&[4, 15, 1153]).is_ok());

		assert!(RnsContext::new(&[]).is_err());
		assert!(RnsContext::new(&[2, 4]).is_err());
		assert!(RnsContext::new(&[2, 3, 5, 30]).is_err());
		assert!(RnsContext::new(&[1 << 62]).is_err());
	}

	#[test]
	fn garner() {
		let rns = RnsContext::new(&[4, 15, 1153]).unwrap();
		assert_eq!(rns.modulus(), &BigUint::from(4u64 * 15 * 1153));
		assert_eq!(rns.moduli(), &[4, 15, 1153]);

		for i in 0..3 {
			let gi = rns.get_garner(i).unwrap();
			let projected = rns.project(gi);
			for (j, pj) in projected.iter().enumerate() {
				assert_eq!(*pj, (i == j) as u64);
			}
		}
		assert!(rns.get_garner(3).is_none());
	}

	#[test]
	fn project_lift() {
		let ntests = 100;
		let rns = RnsContext::new(&[4, 15, 1153, 4611686018326724609]).unwrap();
		let mut rng = thread_rng();

		for _ in 0..ntests {
			let mut bytes = vec![0u8; 16];
			rng.fill_bytes(&mut bytes);
			let a = BigUint::from_bytes_le(&bytes) % rns.modulus();

			let rests = rns.project(&a);
			assert_eq!(rns.lift(ArrayView1::from(&rests)), a);
		}

		let rests = [3u64, 14, 1152, 4611686018326724608];
		assert_eq!(
			rns.lift(ArrayView1::from(&rests)),
			rns.modulus() - BigUint::from(1u64)
		);
	}
}
