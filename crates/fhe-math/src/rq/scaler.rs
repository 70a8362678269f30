#![warn(missing_docs, unused_imports)]

//! Polynomial scaler.

use super::{Context, Poly, Representation};
use crate::{
	rns::{RnsScaler, ScalingFactor},
	Error, Result,
};
use itertools::izip;
use ndarray::{Array2, Axis};
use std::sync::Arc;

/// Context extender.
///
/// Scales the coefficients of a polynomial by a rational factor, rounding to
/// the nearest integer, and outputs a polynomial in a (possibly different)
/// context. With a factor of one, the scaler performs an exact basis
/// extension of the centered coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaler {
	from: Arc<Context>,
	to: Arc<Context>,
	scaler: RnsScaler,
}

impl Scaler {
	/// Create a scaler from a context `from` to a context `to`.
	pub fn new(from: &Arc<Context>, to: &Arc<Context>, factor: ScalingFactor) -> Result<Self> {
		if from.degree != to.degree {
			return Err(Error::Default("Incompatible degrees".to_string()));
		}

		Ok(Self {
			from: from.clone(),
			to: to.clone(),
			scaler: RnsScaler::new(&from.rns, &to.rns, factor),
		})
	}

	/// Returns the source context.
	pub const fn from(&self) -> &Arc<Context> {
		&self.from
	}

	/// Returns the target context.
	pub const fn to(&self) -> &Arc<Context> {
		&self.to
	}

	/// Scale a polynomial in PowerBasis representation.
	pub(crate) fn scale(&self, p: &Poly) -> Result<Poly> {
		if p.ctx.as_ref() != self.from.as_ref() {
			return Err(Error::InvalidContext);
		}
		if p.representation != Representation::PowerBasis {
			return Err(Error::IncorrectRepresentation(
				p.representation,
				Representation::PowerBasis,
			));
		}

		let mut coefficients = Array2::zeros((self.to.q.len(), self.to.degree));
		izip!(
			coefficients.axis_iter_mut(Axis(1)),
			p.coefficients.axis_iter(Axis(1))
		)
		.for_each(|(out, rests)| self.scaler.scale(rests, out));

		Ok(Poly {
			ctx: self.to.clone(),
			representation: Representation::PowerBasis,
			coefficients,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::Scaler;
	use crate::{
		rns::ScalingFactor,
		rq::{Context, Poly, Representation},
		zq::Modulus,
		Error as MathError,
	};
	use num_bigint::BigUint;
	use num_traits::One;
	use rand::thread_rng;
	use std::{error::Error, sync::Arc};

	const Q: &[u64; 2] = &[4611686018326724609, 4611686018309947393];
	const T: u64 = 1153;

	#[test]
	fn scaler() -> Result<(), Box<dyn Error>> {
		let from = Arc::new(Context::new(Q, 16)?);
		let to = Arc::new(Context::new(&[T], 16)?);
		let qt = Modulus::new(T)?;

		// Round(t * x / Q) for x = floor(Q / t) * m + small recovers m.
		let delta = from.modulus() / T;
		let scaler = Scaler::new(
			&from,
			&to,
			ScalingFactor::new(&BigUint::from(T), from.modulus()),
		)?;
		let m = (0..16).map(|i| (i * 71) as i64).collect::<Vec<_>>();
		let e = (0..16).map(|i| (i as i64) - 8).collect::<Vec<_>>();
		let mut p = Poly::from_i64(&from, &e)?;
		let mut m_poly = Poly::from_i64(&from, &m)?;
		m_poly *= &delta;
		p += &m_poly;

		let q = p.scale(&scaler)?;
		assert_eq!(q.ctx().as_ref(), to.as_ref());
		assert_eq!(
			q.coefficients().row(0).to_vec(),
			m.iter().map(|mi| qt.reduce_i64(*mi)).collect::<Vec<_>>()
		);

		let mut p_ntt = p.clone();
		p_ntt.change_representation(Representation::Ntt);
		assert_eq!(
			p_ntt.scale(&scaler).unwrap_err(),
			MathError::IncorrectRepresentation(Representation::Ntt, Representation::PowerBasis)
		);
		assert_eq!(q.scale(&scaler).unwrap_err(), MathError::InvalidContext);
		Ok(())
	}

	#[test]
	fn extender() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let from = Arc::new(Context::new(&Q[..1], 16)?);
		let to = Arc::new(Context::new(Q, 16)?);
		let extender = Scaler::new(&from, &to, ScalingFactor::one())?;

		// Small values are extended exactly, including negative ones.
		let p = Poly::small(&from, Representation::PowerBasis, 10, &mut rng)?;
		let q = p.scale(&extender)?;
		assert_eq!(q.restrict(&from)?, p);
		let q0 = Modulus::new(Q[0])?;
		let q1 = Modulus::new(Q[1])?;
		for (c0, c1) in q.coefficients().row(0).iter().zip(q.coefficients().row(1)) {
			assert_eq!(q0.center(*c0), q1.center(*c1));
		}

		let other = Arc::new(Context::new(Q, 32)?);
		assert!(Scaler::new(&from, &other, ScalingFactor::one()).is_err());
		assert_eq!(
			Scaler::new(&from, &to, ScalingFactor::new(&BigUint::one(), &BigUint::one()))?,
			extender
		);
		Ok(())
	}
}
