//! Ciphertext type in the BFV encryption scheme.

use crate::{
	bfv::{traits::FheParametrized, BfvParameters},
	Error, Result,
};
use fhe_math::rq::{Poly, Representation};
use std::{ops::Deref, sync::Arc};

/// A ciphertext encrypting a plaintext.
///
/// A ciphertext of degree `d` holds `d + 1` polynomials; fresh ciphertexts
/// have degree 1, and a multiplication outputs a ciphertext of degree 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
	/// The parameters of the underlying BFV encryption scheme.
	pub(crate) par: Arc<BfvParameters>,

	/// The ciphertext elements.
	pub(crate) c: Vec<Poly>,

	/// The ciphertext level.
	pub(crate) level: usize,

	/// Whether the ciphertext is a fresh encryption of zero.
	pub(crate) is_zero_encryption: bool,
}

impl FheParametrized for Ciphertext {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl Deref for Ciphertext {
	type Target = [Poly];

	fn deref(&self) -> &Self::Target {
		&self.c
	}
}

impl Ciphertext {
	/// Generate the zero ciphertext of a given degree at a given level, in Ntt
	/// representation.
	pub fn zero(par: &Arc<BfvParameters>, degree: usize, level: usize) -> Result<Self> {
		let ctx = par.ctx_at_level(level)?;
		Ok(Self {
			par: par.clone(),
			c: vec![Poly::zero(ctx, Representation::Ntt); degree + 1],
			level,
			is_zero_encryption: false,
		})
	}

	/// Create a ciphertext from a vector of polynomials.
	///
	/// The polynomials must share the context of one of the levels and the
	/// representation, and there must be at least two of them.
	pub fn new(c: Vec<Poly>, par: &Arc<BfvParameters>) -> Result<Self> {
		if c.len() < 2 {
			return Err(Error::DegreeMismatch(c.len().saturating_sub(1), 1));
		}

		let ctx = c[0].ctx();
		let representation = c[0].representation();
		let level = par
			.ctx
			.iter()
			.position(|ctx_level| ctx_level == ctx)
			.ok_or_else(|| {
				Error::DefaultError("The context does not belong to the parameters".to_string())
			})?;
		if c
			.iter()
			.any(|ci| ci.ctx() != ctx || ci.representation() != representation)
		{
			return Err(Error::DefaultError(
				"The polynomials do not share the same context and representation".to_string(),
			));
		}

		Ok(Self {
			par: par.clone(),
			c,
			level,
			is_zero_encryption: false,
		})
	}

	/// Returns the degree of the ciphertext.
	pub fn degree(&self) -> usize {
		self.c.len() - 1
	}

	/// Returns the level of the ciphertext.
	pub const fn level(&self) -> usize {
		self.level
	}

	/// Returns whether the ciphertext is a fresh encryption of zero.
	pub const fn is_zero_encryption(&self) -> bool {
		self.is_zero_encryption
	}

	/// Returns the representation of the ciphertext polynomials.
	pub fn representation(&self) -> Representation {
		*self.c[0].representation()
	}

	/// Change the representation of the ciphertext polynomials.
	pub fn change_representation(&mut self, to: Representation) {
		self.c.iter_mut().for_each(|ci| ci.change_representation(to));
	}

	/// Relabel an encryption of zero at a lower level by dropping moduli.
	///
	/// An encryption of zero stays valid when the last moduli are dropped, so
	/// no rounding is needed. Any other ciphertext must be brought to a lower
	/// level with `Evaluator::mod_switch_to_level`.
	pub fn set_level(&mut self, level: usize) -> Result<()> {
		if !self.is_zero_encryption {
			return Err(Error::DefaultError(
				"Only fresh encryptions of zero can be relabelled".to_string(),
			));
		}
		if level > self.level {
			return Err(Error::InvalidLevel {
				level,
				min_level: 0,
				max_level: self.level,
			});
		}

		let ctx = &self.par.ctx[level];
		self.c = self
			.c
			.iter()
			.map(|ci| ci.restrict(ctx))
			.collect::<std::result::Result<Vec<_>, _>>()?;
		self.level = level;
		Ok(())
	}

	/// Bring the ciphertext to a lower level, dividing and rounding by each
	/// dropped modulus. The representation is kept.
	pub(crate) fn mod_switch_to(&self, level: usize) -> Result<Ciphertext> {
		if level > self.level {
			return Err(Error::InvalidLevel {
				level,
				min_level: 0,
				max_level: self.level,
			});
		}
		if level == self.level {
			return Ok(self.clone());
		}

		let representation = self.representation();
		let mut c = Vec::with_capacity(self.c.len());
		for ci in &self.c {
			let mut p = ci.clone();
			p.change_representation(Representation::PowerBasis);
			for l in (level..self.level).rev() {
				p = p.scale(&self.par.level_down[l])?;
			}
			p.change_representation(representation);
			c.push(p);
		}

		Ok(Ciphertext {
			par: self.par.clone(),
			c,
			level,
			is_zero_encryption: self.is_zero_encryption,
		})
	}
}
