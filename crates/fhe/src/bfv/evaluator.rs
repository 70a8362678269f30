//! Homomorphic evaluation for the BFV encryption scheme.
//!
//! The evaluator never changes the level of its inputs implicitly: binary
//! operations run at the minimum level of their operands, and the operand
//! at the higher level is brought down with the same exact rounding as
//! [`Evaluator::mod_switch_to_level`]. The outputs are in Ntt representation.

use crate::{
	bfv::{
		traits::{same_parameters, FheParametrized},
		BfvParameters, Ciphertext, Encoding, EvaluationKey, Plaintext, RelinearizationKey,
		RotationKeySet,
	},
	Error, Result,
};
use fhe_math::rq::{Poly, Representation};
use itertools::izip;
use num_bigint::BigUint;
use std::sync::Arc;
use tracing::instrument;

/// The second operand of a binary operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
	/// A ciphertext operand.
	Ciphertext(&'a Ciphertext),
	/// A plaintext operand.
	Plaintext(&'a Plaintext),
}

impl<'a> From<&'a Ciphertext> for Operand<'a> {
	fn from(ct: &'a Ciphertext) -> Self {
		Self::Ciphertext(ct)
	}
}

impl<'a> From<&'a Plaintext> for Operand<'a> {
	fn from(pt: &'a Plaintext) -> Self {
		Self::Plaintext(pt)
	}
}

/// Evaluator of homomorphic operations, bound to optional relinearization
/// and rotation keys.
#[derive(Debug, Clone)]
pub struct Evaluator {
	par: Arc<BfvParameters>,
	rlk: Option<Arc<RelinearizationKey>>,
	rtks: Option<Arc<RotationKeySet>>,
}

impl FheParametrized for Evaluator {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl Evaluator {
	/// Create an evaluator bound to the key material.
	///
	/// Returns an error if a key was generated under other parameters.
	pub fn new(par: &Arc<BfvParameters>, key: EvaluationKey) -> Result<Self> {
		let matches = |other: &Arc<BfvParameters>| same_parameters(par, other);
		if !key.rlk.as_ref().map_or(true, |rlk| matches(rlk.parameters()))
			|| !key.rtks.as_ref().map_or(true, |rtks| matches(rtks.parameters()))
		{
			return Err(Error::ParametersMismatch);
		}

		Ok(Self {
			par: par.clone(),
			rlk: key.rlk,
			rtks: key.rtks,
		})
	}

	/// Returns an evaluator with the same parameters, bound to other keys.
	pub fn with_key(&self, key: EvaluationKey) -> Result<Self> {
		Self::new(&self.par, key)
	}

	/// Returns an evaluator sharing the parameters and keys with `self`.
	pub fn shallow_copy(&self) -> Self {
		self.clone()
	}

	fn check_parameters<T: FheParametrized>(&self, other: &T) -> Result<()> {
		if self.has_same_parameters(other) {
			Ok(())
		} else {
			Err(Error::ParametersMismatch)
		}
	}

	fn check_degree(ct: &Ciphertext, degree: usize) -> Result<()> {
		if ct.degree() != degree {
			Err(Error::DegreeMismatch(ct.degree(), degree))
		} else {
			Ok(())
		}
	}

	fn output(&self, c: Vec<Poly>, level: usize) -> Ciphertext {
		Ciphertext {
			par: self.par.clone(),
			c,
			level,
			is_zero_encryption: false,
		}
	}

	/// The polynomials of the ciphertext at the level, in Ntt representation.
	fn at_level_ntt(&self, ct: &Ciphertext, level: usize) -> Result<Vec<Poly>> {
		let mut c = ct.mod_switch_to(level)?.c;
		c.iter_mut()
			.for_each(|ci| ci.change_representation(Representation::Ntt));
		Ok(c)
	}

	/// The polynomials of the ciphertext at the level, extended to the
	/// auxiliary basis in Ntt representation.
	fn extend(&self, ct: &Ciphertext, level: usize) -> Result<Vec<Poly>> {
		ct.mod_switch_to(level)?
			.c
			.into_iter()
			.map(|ci| self.extend_poly(ci, level))
			.collect()
	}

	fn extend_poly(&self, mut p: Poly, level: usize) -> Result<Poly> {
		p.change_representation(Representation::PowerBasis);
		let mut p = p.scale(&self.par.extenders[level])?;
		p.change_representation(Representation::Ntt);
		Ok(p)
	}

	/// Scale the extended polynomials by t / Q back to the level.
	fn scale_down(&self, c: Vec<Poly>, level: usize) -> Result<Ciphertext> {
		let c = c
			.into_iter()
			.map(|mut ci| -> Result<Poly> {
				ci.change_representation(Representation::PowerBasis);
				let mut ci = ci.scale(&self.par.mul_scalers[level])?;
				ci.change_representation(Representation::Ntt);
				Ok(ci)
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(self.output(c, level))
	}

	/// Combine a ciphertext and an operand that is a ciphertext or a Standard
	/// or RingT plaintext, coefficient-wise.
	fn combine<F: Fn(&mut Poly, &Poly)>(
		&self,
		ct: &Ciphertext,
		operand: Operand<'_>,
		f: F,
	) -> Result<Ciphertext> {
		self.check_parameters(ct)?;
		match operand {
			Operand::Ciphertext(other) => {
				self.check_parameters(other)?;
				let level = ct.level.min(other.level);
				let mut c = self.at_level_ntt(ct, level)?;
				let d = self.at_level_ntt(other, level)?;
				while c.len() < d.len() {
					c.push(Poly::zero(&self.par.ctx[level], Representation::Ntt));
				}
				izip!(c.iter_mut(), d.iter()).for_each(|(ci, di)| f(ci, di));
				Ok(self.output(c, level))
			}
			Operand::Plaintext(pt) => {
				self.check_parameters(pt)?;
				if pt.encoding == Encoding::Mul {
					return Err(Error::EncodingMismatch(
						pt.encoding.to_string(),
						"Standard or RingT".to_string(),
					));
				}
				let level = ct.level.min(pt.level);
				let mut c = self.at_level_ntt(ct, level)?;
				let pt = pt.lift_to(Encoding::Standard, level)?;
				f(&mut c[0], &pt.poly);
				Ok(self.output(c, level))
			}
		}
	}

	/// Add a ciphertext and an operand into `out`.
	///
	/// The operand is a ciphertext, or a plaintext with the Standard or the
	/// RingT encoding.
	pub fn add<'a, O: Into<Operand<'a>>>(
		&self,
		ct: &Ciphertext,
		operand: O,
		out: &mut Ciphertext,
	) -> Result<()> {
		*out = self.add_new(ct, operand)?;
		Ok(())
	}

	/// Add a ciphertext and an operand into a new ciphertext.
	pub fn add_new<'a, O: Into<Operand<'a>>>(
		&self,
		ct: &Ciphertext,
		operand: O,
	) -> Result<Ciphertext> {
		self.combine(ct, operand.into(), |a, b| *a += b)
	}

	/// Subtract an operand from a ciphertext into `out`.
	pub fn sub<'a, O: Into<Operand<'a>>>(
		&self,
		ct: &Ciphertext,
		operand: O,
		out: &mut Ciphertext,
	) -> Result<()> {
		*out = self.sub_new(ct, operand)?;
		Ok(())
	}

	/// Subtract an operand from a ciphertext into a new ciphertext.
	pub fn sub_new<'a, O: Into<Operand<'a>>>(
		&self,
		ct: &Ciphertext,
		operand: O,
	) -> Result<Ciphertext> {
		self.combine(ct, operand.into(), |a, b| *a -= b)
	}

	/// Negate a ciphertext into `out`.
	pub fn neg(&self, ct: &Ciphertext, out: &mut Ciphertext) -> Result<()> {
		*out = self.neg_new(ct)?;
		Ok(())
	}

	/// Negate a ciphertext into a new ciphertext.
	pub fn neg_new(&self, ct: &Ciphertext) -> Result<Ciphertext> {
		self.check_parameters(ct)?;
		let c = self
			.at_level_ntt(ct, ct.level)?
			.iter()
			.map(|ci| -ci)
			.collect();
		Ok(self.output(c, ct.level))
	}

	/// Multiply a ciphertext by a scalar modulo the plaintext modulus into
	/// `out`.
	pub fn mul_scalar(&self, ct: &Ciphertext, scalar: u64, out: &mut Ciphertext) -> Result<()> {
		*out = self.mul_scalar_new(ct, scalar)?;
		Ok(())
	}

	/// Multiply a ciphertext by a scalar modulo the plaintext modulus into a
	/// new ciphertext.
	pub fn mul_scalar_new(&self, ct: &Ciphertext, scalar: u64) -> Result<Ciphertext> {
		self.check_parameters(ct)?;

		// Multiply by the centered representative to limit the noise growth.
		let t = self.par.plaintext();
		let scalar = scalar % t;
		let (magnitude, negative) = if scalar > t >> 1 {
			(t - scalar, true)
		} else {
			(scalar, false)
		};
		let factor = BigUint::from(magnitude);

		let mut c = self.at_level_ntt(ct, ct.level)?;
		for ci in c.iter_mut() {
			*ci *= &factor;
			if negative {
				*ci = -&*ci;
			}
		}
		Ok(self.output(c, ct.level))
	}

	/// Multiply a ciphertext and an operand into `out`.
	///
	/// The product of two ciphertexts of degree 1 is a ciphertext of degree 2
	/// that must be relinearized before decryption. The product with a
	/// plaintext keeps the degree; the Mul encoding is the fastest, a RingT
	/// plaintext is lifted to the Mul encoding, and a Standard plaintext goes
	/// through the same scaling as the product of ciphertexts.
	pub fn mul<'a, O: Into<Operand<'a>>>(
		&self,
		ct: &Ciphertext,
		operand: O,
		out: &mut Ciphertext,
	) -> Result<()> {
		*out = self.mul_new(ct, operand)?;
		Ok(())
	}

	/// Multiply a ciphertext and an operand into a new ciphertext.
	#[instrument(skip_all)]
	pub fn mul_new<'a, O: Into<Operand<'a>>>(
		&self,
		ct: &Ciphertext,
		operand: O,
	) -> Result<Ciphertext> {
		self.check_parameters(ct)?;
		match operand.into() {
			Operand::Ciphertext(other) if std::ptr::eq(ct, other) => self.square_new(ct),
			Operand::Ciphertext(other) => {
				self.check_parameters(other)?;
				Self::check_degree(ct, 1)?;
				Self::check_degree(other, 1)?;

				let level = ct.level.min(other.level);
				let a = self.extend(ct, level)?;
				let b = self.extend(other, level)?;
				let c0 = &a[0] * &b[0];
				let mut c1 = &a[0] * &b[1];
				c1 += &(&a[1] * &b[0]);
				let c2 = &a[1] * &b[1];
				self.scale_down(vec![c0, c1, c2], level)
			}
			Operand::Plaintext(pt) => {
				self.check_parameters(pt)?;
				let level = ct.level.min(pt.level);
				match pt.encoding {
					Encoding::Mul | Encoding::RingT => {
						let pt = pt.lift_to(Encoding::Mul, level)?;
						let mut c = self.at_level_ntt(ct, level)?;
						c.iter_mut().for_each(|ci| *ci *= &pt.poly);
						Ok(self.output(c, level))
					}
					Encoding::Standard => {
						let pt = pt.lift_to(Encoding::Standard, level)?;
						let m = self.extend_poly(pt.poly, level)?;
						let c = self
							.extend(ct, level)?
							.iter()
							.map(|ci| ci * &m)
							.collect();
						self.scale_down(c, level)
					}
				}
			}
		}
	}

	/// Square a ciphertext of degree 1 into `out`.
	pub fn square(&self, ct: &Ciphertext, out: &mut Ciphertext) -> Result<()> {
		*out = self.square_new(ct)?;
		Ok(())
	}

	/// Square a ciphertext of degree 1 into a new ciphertext of degree 2. The
	/// ciphertext is extended to the auxiliary basis only once.
	#[instrument(skip_all)]
	pub fn square_new(&self, ct: &Ciphertext) -> Result<Ciphertext> {
		self.check_parameters(ct)?;
		Self::check_degree(ct, 1)?;

		let a = self.extend(ct, ct.level)?;
		let c0 = &a[0] * &a[0];
		let a01 = &a[0] * &a[1];
		let c1 = &a01 + &a01;
		let c2 = &a[1] * &a[1];
		self.scale_down(vec![c0, c1, c2], ct.level)
	}

	/// Relinearize a ciphertext of degree 2 into a ciphertext of degree 1 in
	/// `out`.
	pub fn relinearize(&self, ct: &Ciphertext, out: &mut Ciphertext) -> Result<()> {
		*out = self.relinearize_new(ct)?;
		Ok(())
	}

	/// Relinearize a ciphertext of degree 2 into a new ciphertext of degree 1.
	///
	/// Returns an error if the evaluator is not bound to a relinearization key.
	pub fn relinearize_new(&self, ct: &Ciphertext) -> Result<Ciphertext> {
		self.check_parameters(ct)?;
		let rlk = self
			.rlk
			.as_ref()
			.ok_or_else(|| Error::MissingKey("RelinearizationKey".to_string()))?;
		rlk.relinearize(ct)
	}

	fn rotate(&self, ct: &Ciphertext, element: usize) -> Result<Ciphertext> {
		self.check_parameters(ct)?;
		let rtks = self
			.rtks
			.as_ref()
			.ok_or_else(|| Error::MissingKey("RotationKeySet".to_string()))?;
		let key = rtks.get(element).ok_or_else(|| {
			Error::MissingKey(format!("RotationKey for galois element {element}"))
		})?;
		key.apply(ct)
	}

	/// Swap the rows of the plaintext matrix into `out`.
	pub fn rotate_rows(&self, ct: &Ciphertext, out: &mut Ciphertext) -> Result<()> {
		*out = self.rotate_rows_new(ct)?;
		Ok(())
	}

	/// Swap the rows of the plaintext matrix into a new ciphertext.
	///
	/// Returns an error if the evaluator is not bound to the row rotation key.
	#[instrument(skip_all)]
	pub fn rotate_rows_new(&self, ct: &Ciphertext) -> Result<Ciphertext> {
		self.rotate(ct, self.par.galois_element_for_row_rotation())
	}

	/// Rotate the columns of the plaintext matrix by `k` positions to the left
	/// into `out`.
	pub fn rotate_columns(&self, ct: &Ciphertext, k: i64, out: &mut Ciphertext) -> Result<()> {
		*out = self.rotate_columns_new(ct, k)?;
		Ok(())
	}

	/// Rotate the columns of the plaintext matrix by `k` positions to the left
	/// into a new ciphertext; negative values of `k` rotate to the right.
	///
	/// Returns an error if the evaluator is not bound to the key generated for
	/// this rotation. Rotations by multiples of half the degree need no key.
	#[instrument(skip_all)]
	pub fn rotate_columns_new(&self, ct: &Ciphertext, k: i64) -> Result<Ciphertext> {
		let element = self.par.galois_element_for_column_rotation(k);
		if element == 1 {
			self.check_parameters(ct)?;
			let c = self.at_level_ntt(ct, ct.level)?;
			return Ok(self.output(c, ct.level));
		}
		self.rotate(ct, element)
	}

	/// Bring a ciphertext to a lower level into `out`, dividing and rounding
	/// by the dropped moduli.
	pub fn mod_switch_to_level(
		&self,
		ct: &Ciphertext,
		level: usize,
		out: &mut Ciphertext,
	) -> Result<()> {
		*out = self.mod_switch_to_level_new(ct, level)?;
		Ok(())
	}

	/// Bring a ciphertext to a lower level into a new ciphertext.
	pub fn mod_switch_to_level_new(&self, ct: &Ciphertext, level: usize) -> Result<Ciphertext> {
		self.check_parameters(ct)?;
		let mut out = ct.mod_switch_to(level)?;
		out.change_representation(Representation::Ntt);
		Ok(out)
	}
}
