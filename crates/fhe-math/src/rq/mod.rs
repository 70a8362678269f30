#![warn(missing_docs, unused_imports)]

//! Polynomials in R_q\[x\] = (ZZ_q1 x ... x ZZ_qn)\[x\] where the qi's are
//! prime moduli in zq.

mod context;
mod ops;
mod scaler;
pub mod traits;

pub use context::Context;
pub use scaler::Scaler;

use crate::{Error, Result};
use fhe_util::sample_vec_cbd;
use itertools::izip;
use ndarray::{Array2, ArrayView2, Axis};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroize;

/// Possible representations of the underlying polynomial.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
	/// This is the list of coefficients ci, such that the polynomial is c0 + c1
	/// * x + ... + c_(degree - 1) * x^(degree - 1)
	#[default]
	PowerBasis,
	/// This is the NTT representation of the PowerBasis representation.
	Ntt,
}

/// An exponent for a substitution x -> x^exponent.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubstitutionExponent {
	ctx: Arc<Context>,
	exponent: usize,
}

impl SubstitutionExponent {
	/// Creates a substitution element from an exponent.
	///
	/// The exponent is reduced modulo 2 * degree, and must then be odd.
	pub fn new(ctx: &Arc<Context>, exponent: usize) -> Result<Self> {
		let exponent = exponent % (2 * ctx.degree);
		if exponent & 1 == 0 {
			return Err(Error::Default(
				"The exponent should be odd modulo 2 * degree".to_string(),
			));
		}
		Ok(Self {
			ctx: ctx.clone(),
			exponent,
		})
	}

	/// Returns the exponent, reduced modulo 2 * degree.
	pub const fn exponent(&self) -> usize {
		self.exponent
	}
}

/// Struct that holds a polynomial for a specific context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
	ctx: Arc<Context>,
	representation: Representation,
	coefficients: Array2<u64>,
}

/// Apply `f` to every row of `a` given as a contiguous slice, along with the
/// index of the row.
fn for_each_row_mut<F: FnMut(usize, &mut [u64])>(a: &mut Array2<u64>, mut f: F) {
	for (i, mut row) in a.outer_iter_mut().enumerate() {
		match row.as_slice_mut() {
			Some(slice) => f(i, slice),
			None => {
				let mut v = row.to_vec();
				f(i, &mut v);
				row.iter_mut().zip(v).for_each(|(r, vi)| *r = vi);
			}
		}
	}
}

impl Poly {
	/// Creates a polynomial holding the constant 0.
	pub fn zero(ctx: &Arc<Context>, representation: Representation) -> Self {
		Self {
			ctx: ctx.clone(),
			representation,
			coefficients: Array2::zeros((ctx.q.len(), ctx.degree)),
		}
	}

	/// Current representation of the polynomial.
	pub const fn representation(&self) -> &Representation {
		&self.representation
	}

	/// Context of the polynomial.
	pub const fn ctx(&self) -> &Arc<Context> {
		&self.ctx
	}

	/// Change the representation of the underlying polynomial.
	pub fn change_representation(&mut self, to: Representation) {
		match (self.representation, to) {
			(Representation::PowerBasis, Representation::Ntt) => self.ntt_forward(),
			(Representation::Ntt, Representation::PowerBasis) => self.ntt_backward(),
			_ => {}
		}
		self.representation = to;
	}

	/// Generate a random polynomial, uniform modulo every modulus.
	pub fn random<R: RngCore + CryptoRng>(
		ctx: &Arc<Context>,
		representation: Representation,
		rng: &mut R,
	) -> Self {
		let mut p = Poly::zero(ctx, representation);
		for_each_row_mut(&mut p.coefficients, |i, row| {
			row.copy_from_slice(&ctx.q[i].random_vec(ctx.degree, rng))
		});
		p
	}

	/// Generate a small polynomial with coefficients sampled from a centered
	/// binomial distribution of the given variance.
	///
	/// Returns an error if the variance does not belong to [1, ..., 16].
	pub fn small<R: RngCore + CryptoRng>(
		ctx: &Arc<Context>,
		representation: Representation,
		variance: usize,
		rng: &mut R,
	) -> Result<Self> {
		let coeffs = sample_vec_cbd(ctx.degree, variance, rng)
			.map_err(|e| Error::Default(e.to_string()))?;
		let mut p = Poly::from_i64(ctx, &coeffs)?;
		p.change_representation(representation);
		Ok(p)
	}

	/// Create a polynomial in PowerBasis representation from signed
	/// coefficients.
	///
	/// Returns an error if the number of coefficients differs from the degree.
	pub fn from_i64(ctx: &Arc<Context>, coeffs: &[i64]) -> Result<Self> {
		if coeffs.len() != ctx.degree {
			return Err(Error::Default(format!(
				"Expected {} coefficients, got {}",
				ctx.degree,
				coeffs.len()
			)));
		}
		let mut p = Poly::zero(ctx, Representation::PowerBasis);
		for_each_row_mut(&mut p.coefficients, |i, row| {
			izip!(row.iter_mut(), coeffs.iter()).for_each(|(r, c)| *r = ctx.q[i].reduce_i64(*c))
		});
		Ok(p)
	}

	/// Access the polynomial coefficients in RNS representation, one row per
	/// modulus.
	pub fn coefficients(&self) -> ArrayView2<'_, u64> {
		self.coefficients.view()
	}

	/// Substitute x by x^i in a polynomial.
	///
	/// In PowerBasis representation, the substitution is a signed permutation
	/// of the coefficients; a polynomial in Ntt representation is converted
	/// back and forth.
	pub fn substitute(&self, i: &SubstitutionExponent) -> Result<Poly> {
		if self.ctx != i.ctx {
			return Err(Error::InvalidContext);
		}

		if self.representation == Representation::Ntt {
			let mut p = self.clone();
			p.change_representation(Representation::PowerBasis);
			let mut q = p.substitute(i)?;
			q.change_representation(Representation::Ntt);
			return Ok(q);
		}

		let degree = self.ctx.degree;
		let mut q = Poly::zero(&self.ctx, Representation::PowerBasis);
		izip!(
			q.coefficients.outer_iter_mut(),
			self.coefficients.outer_iter(),
			self.ctx.q.iter()
		)
		.for_each(|(mut q_row, p_row, qi)| {
			let mut power = 0usize;
			for c in p_row.iter() {
				if power < degree {
					q_row[power] = *c;
				} else {
					q_row[power - degree] = qi.neg(*c);
				}
				power = (power + i.exponent) % (2 * degree);
			}
		});
		Ok(q)
	}

	/// Scale a polynomial using a scaler.
	pub fn scale(&self, scaler: &Scaler) -> Result<Poly> {
		scaler.scale(self)
	}

	/// Restrict a polynomial to a context whose moduli are a subset of the
	/// moduli of the context of the polynomial. The representation is kept.
	///
	/// Returns an error if one of the moduli of the target context does not
	/// belong to the current context.
	pub fn restrict(&self, ctx: &Arc<Context>) -> Result<Poly> {
		if ctx.degree != self.ctx.degree {
			return Err(Error::InvalidContext);
		}

		let mut q = Poly::zero(ctx, self.representation);
		for (mut row, qi) in izip!(q.coefficients.outer_iter_mut(), ctx.moduli.iter()) {
			let index = self
				.ctx
				.moduli
				.iter()
				.position(|m| m == qi)
				.ok_or(Error::InvalidContext)?;
			row.assign(&self.coefficients.index_axis(Axis(0), index));
		}
		Ok(q)
	}

	fn ntt_forward(&mut self) {
		let ops = &self.ctx.ops;
		for_each_row_mut(&mut self.coefficients, |i, row| ops[i].forward(row));
	}

	fn ntt_backward(&mut self) {
		let ops = &self.ctx.ops;
		for_each_row_mut(&mut self.coefficients, |i, row| ops[i].backward(row));
	}
}

impl Zeroize for Poly {
	fn zeroize(&mut self) {
		for_each_row_mut(&mut self.coefficients, |_, row| row.zeroize());
	}
}

#[cfg(test)]
mod tests {
	use super::{Context, Poly, Representation, SubstitutionExponent};
	use crate::zq::Modulus;
	use ndarray::Axis;
	use rand::thread_rng;
	use std::{error::Error, sync::Arc};
	use zeroize::Zeroize;

	const MODULI: &[u64; 3] = &[1153, 4611686018326724609, 4611686018309947393];

	#[test]
	fn poly_zero() -> Result<(), Box<dyn Error>> {
		let ctx = Arc::new(Context::new(MODULI, 16)?);
		let p = Poly::zero(&ctx, Representation::PowerBasis);
		let q = Poly::zero(&ctx, Representation::Ntt);
		assert_ne!(p, q);
		assert!(p.coefficients().iter().all(|c| *c == 0));
		assert_eq!(p.coefficients().shape(), &[3, 16]);
		Ok(())
	}

	#[test]
	fn random() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let ctx = Arc::new(Context::new(MODULI, 16)?);
		let p = Poly::random(&ctx, Representation::Ntt, &mut rng);
		for (row, qi) in p.coefficients().outer_iter().zip(MODULI) {
			assert!(row.iter().all(|c| c < qi));
		}
		let q = Poly::random(&ctx, Representation::Ntt, &mut rng);
		assert_ne!(p, q);
		Ok(())
	}

	#[test]
	fn change_representation() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let ctx = Arc::new(Context::new(MODULI, 16)?);

		let mut p = Poly::random(&ctx, Representation::PowerBasis, &mut rng);
		let q = p.clone();
		p.change_representation(Representation::PowerBasis);
		assert_eq!(p, q);

		p.change_representation(Representation::Ntt);
		assert_eq!(p.representation(), &Representation::Ntt);
		assert_ne!(p.coefficients(), q.coefficients());

		p.change_representation(Representation::PowerBasis);
		assert_eq!(p, q);
		Ok(())
	}

	#[test]
	fn small() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let ctx = Arc::new(Context::new(MODULI, 16)?);
		assert!(Poly::small(&ctx, Representation::PowerBasis, 0, &mut rng).is_err());
		assert!(Poly::small(&ctx, Representation::PowerBasis, 17, &mut rng).is_err());

		let p = Poly::small(&ctx, Representation::PowerBasis, 1, &mut rng)?;
		for (row, qi) in p.coefficients().outer_iter().zip(MODULI) {
			let q = Modulus::new(*qi)?;
			assert!(row.iter().all(|c| q.center(*c).abs() <= 2));
		}
		Ok(())
	}

	#[test]
	fn from_i64() -> Result<(), Box<dyn Error>> {
		let ctx = Arc::new(Context::new(MODULI, 16)?);
		assert!(Poly::from_i64(&ctx, &[1, 2, 3]).is_err());

		let coeffs = (0..16).map(|i| i - 8).collect::<Vec<i64>>();
		let p = Poly::from_i64(&ctx, &coeffs)?;
		assert_eq!(p.representation(), &Representation::PowerBasis);
		for (row, qi) in p.coefficients().outer_iter().zip(MODULI) {
			let q = Modulus::new(*qi)?;
			assert_eq!(row.iter().map(|c| q.center(*c)).collect::<Vec<_>>(), coeffs);
		}
		Ok(())
	}

	#[test]
	fn substitute() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let ctx = Arc::new(Context::new(MODULI, 16)?);

		assert!(SubstitutionExponent::new(&ctx, 0).is_err());
		assert!(SubstitutionExponent::new(&ctx, 2).is_err());
		assert_eq!(SubstitutionExponent::new(&ctx, 33)?.exponent(), 1);

		// x -> x^3 maps x^15 to x^45 = x^13 * x^32 = x^13.
		let mut coeffs = vec![0i64; 16];
		coeffs[15] = 1;
		let p = Poly::from_i64(&ctx, &coeffs)?;
		let q = p.substitute(&SubstitutionExponent::new(&ctx, 3)?)?;
		let mut expected = vec![0i64; 16];
		expected[13] = 1;
		assert_eq!(q, Poly::from_i64(&ctx, &expected)?);

		// x -> x^5 maps x^15 to x^75 = x^11 * x^64 = x^11 * (x^16)^4 = x^11.
		let q = p.substitute(&SubstitutionExponent::new(&ctx, 5)?)?;
		let mut expected = vec![0i64; 16];
		expected[11] = 1;
		assert_eq!(q, Poly::from_i64(&ctx, &expected)?);

		// x -> x^3 maps x^6 to x^18 = -x^2.
		let mut coeffs = vec![0i64; 16];
		coeffs[6] = 1;
		let q = Poly::from_i64(&ctx, &coeffs)?.substitute(&SubstitutionExponent::new(&ctx, 3)?)?;
		let mut expected = vec![0i64; 16];
		expected[2] = -1;
		assert_eq!(q, Poly::from_i64(&ctx, &expected)?);

		// Substitution commutes with the NTT, and composes.
		let p = Poly::random(&ctx, Representation::PowerBasis, &mut rng);
		let mut p_ntt = p.clone();
		p_ntt.change_representation(Representation::Ntt);
		let e = SubstitutionExponent::new(&ctx, 3)?;
		let mut q_ntt = p_ntt.substitute(&e)?;
		q_ntt.change_representation(Representation::PowerBasis);
		assert_eq!(q_ntt, p.substitute(&e)?);

		let e_inv = SubstitutionExponent::new(&ctx, 11)?;
		assert_eq!(p.substitute(&e)?.substitute(&e_inv)?, p);

		let other_ctx = Arc::new(Context::new(&MODULI[..1], 16)?);
		assert!(p
			.substitute(&SubstitutionExponent::new(&other_ctx, 3)?)
			.is_err());
		Ok(())
	}

	#[test]
	fn restrict() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let ctx = Arc::new(Context::new(MODULI, 16)?);
		let sub_ctx = Arc::new(Context::new(&[MODULI[2], MODULI[0]], 16)?);
		let other_ctx = Arc::new(Context::new(&[12289], 16)?);

		let p = Poly::random(&ctx, Representation::Ntt, &mut rng);
		let q = p.restrict(&sub_ctx)?;
		assert_eq!(q.representation(), &Representation::Ntt);
		assert_eq!(q.coefficients().index_axis(Axis(0), 0), p.coefficients().index_axis(Axis(0), 2));
		assert_eq!(q.coefficients().index_axis(Axis(0), 1), p.coefficients().index_axis(Axis(0), 0));
		assert!(p.restrict(&other_ctx).is_err());
		Ok(())
	}

	#[test]
	fn zeroize() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let ctx = Arc::new(Context::new(MODULI, 16)?);
		let mut p = Poly::random(&ctx, Representation::Ntt, &mut rng);
		p.zeroize();
		assert_eq!(p, Poly::zero(&ctx, Representation::Ntt));
		Ok(())
	}
}
