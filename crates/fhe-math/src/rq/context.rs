use itertools::Itertools;
use num_bigint::BigUint;
use std::{fmt::Debug, sync::Arc};

use crate::{
	rns::RnsContext,
	zq::{ntt::NttOperator, Modulus},
	Error, Result,
};

/// Struct that holds the context associated with elements in rq.
#[derive(Clone)]
pub struct Context {
	pub(crate) moduli: Box<[u64]>,
	pub(crate) q: Box<[Modulus]>,
	pub(crate) rns: Arc<RnsContext>,
	pub(crate) ops: Box<[NttOperator]>,
	pub(crate) degree: usize,
}

impl Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context")
			.field("moduli", &self.moduli)
			.field("degree", &self.degree)
			.finish()
	}
}

impl PartialEq for Context {
	fn eq(&self, other: &Self) -> bool {
		self.degree == other.degree && self.moduli == other.moduli
	}
}

impl Eq for Context {}

impl Context {
	/// Creates a context from a list of moduli and a polynomial degree.
	///
	/// Returns an error if the moduli are not primes less than 62 bits which
	/// supports the NTT of size `degree`, or if they are not distinct.
	pub fn new(moduli: &[u64], degree: usize) -> Result<Self> {
		if !degree.is_power_of_two() || degree < 8 {
			return Err(Error::Default(
				"The degree is not a power of two larger or equal to 8".to_string(),
			));
		}
		if !moduli.iter().all_unique() {
			return Err(Error::Default("The moduli are not distinct".to_string()));
		}

		let rns = Arc::new(RnsContext::new(moduli)?);
		let mut q = Vec::with_capacity(moduli.len());
		let mut ops = Vec::with_capacity(moduli.len());
		for modulus in moduli {
			let qi = Modulus::new(*modulus)?;
			let op = NttOperator::new(&qi, degree).ok_or_else(|| {
				Error::Default(format!(
					"Impossible to construct a Ntt operator for modulus {modulus}"
				))
			})?;
			q.push(qi);
			ops.push(op);
		}

		Ok(Self {
			moduli: moduli.to_owned().into_boxed_slice(),
			q: q.into_boxed_slice(),
			rns,
			ops: ops.into_boxed_slice(),
			degree,
		})
	}

	/// Creates a context in an `Arc`.
	pub fn new_arc(moduli: &[u64], degree: usize) -> Result<Arc<Self>> {
		Self::new(moduli, degree).map(Arc::new)
	}

	/// Returns the modulus as a BigUint.
	pub fn modulus(&self) -> &BigUint {
		self.rns.modulus()
	}

	/// Returns a reference to the moduli in this context.
	pub fn moduli(&self) -> &[u64] {
		&self.moduli
	}

	/// Returns a reference to the moduli as Modulus in this context.
	pub fn moduli_operators(&self) -> &[Modulus] {
		&self.q
	}

	/// Returns the polynomial degree.
	pub const fn degree(&self) -> usize {
		self.degree
	}

	/// Returns the RNS context underlying this context.
	pub const fn rns(&self) -> &Arc<RnsContext> {
		&self.rns
	}
}

#[cfg(test)]
mod tests {
	use std::error::Error;

	use crate::rq::Context;

	const MODULI: &[u64; 3] = &[1153, 4611686018326724609, 4611686018309947393];

	#[test]
	fn context_constructor() {
		for modulus in MODULI {
			assert!(Context::new(&[*modulus], 16).is_ok());
		}

		assert!(Context::new(MODULI, 16).is_ok());
		assert!(Context::new(MODULI, 4).is_err());
		assert!(Context::new(MODULI, 24).is_err());
		assert!(Context::new(&[1153, 1153], 16).is_err());
		// 1153 does not support the NTT of size 1024.
		assert!(Context::new(&[1153], 1024).is_err());
		assert!(Context::new(&[], 16).is_err());
	}

	#[test]
	fn context_accessors() -> Result<(), Box<dyn Error>> {
		let ctx = Context::new_arc(MODULI, 16)?;
		assert_eq!(ctx.moduli(), MODULI);
		assert_eq!(ctx.degree(), 16);
		assert_eq!(ctx.moduli_operators().len(), 3);
		assert_eq!(
			ctx.modulus(),
			&(num_bigint::BigUint::from(MODULI[0]) * MODULI[1] * MODULI[2])
		);
		assert_eq!(ctx.as_ref(), &Context::new(MODULI, 16)?);
		assert_ne!(ctx.as_ref(), &Context::new(&MODULI[..2], 16)?);
		Ok(())
	}
}
