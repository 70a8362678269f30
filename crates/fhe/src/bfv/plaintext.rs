//! Plaintext type in the BFV encryption scheme.

use crate::{
	bfv::{traits::FheParametrized, BfvParameters},
	Error, Result,
};
use fhe_math::rq::{Poly, Representation};
use std::{fmt::Display, sync::Arc};
use zeroize::Zeroize;

/// An encoding for the plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
	/// The message is scaled by floor(Q / t) and stored in Ntt representation
	/// modulo the ciphertext moduli. This is the encoding accepted by the
	/// encryptors.
	Standard,
	/// The message is stored modulo the plaintext modulus, in PowerBasis
	/// representation.
	RingT,
	/// The message is stored in Ntt representation modulo the ciphertext
	/// moduli, without scaling, for fast multiplications.
	Mul,
}

impl Display for Encoding {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Standard => "Standard",
			Self::RingT => "RingT",
			Self::Mul => "Mul",
		};
		f.write_str(name)
	}
}

/// A plaintext object, that encodes a vector according to a specific
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plaintext {
	/// The parameters of the underlying BFV encryption scheme.
	pub(crate) par: Arc<BfvParameters>,
	/// The encoded polynomial.
	pub(crate) poly: Poly,
	/// The encoding of the plaintext.
	pub(crate) encoding: Encoding,
	/// The level of the plaintext. A RingT plaintext is always at the maximum
	/// level.
	pub(crate) level: usize,
}

impl FheParametrized for Plaintext {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl Zeroize for Plaintext {
	fn zeroize(&mut self) {
		self.poly.zeroize();
	}
}

impl Plaintext {
	/// Generate a zero plaintext with the given encoding and level.
	pub fn zero(par: &Arc<BfvParameters>, encoding: Encoding, level: usize) -> Result<Self> {
		par.check_level(level)?;
		let (poly, level) = match encoding {
			Encoding::RingT => (
				Poly::zero(&par.ctx_t, Representation::PowerBasis),
				par.max_level(),
			),
			Encoding::Standard | Encoding::Mul => {
				(Poly::zero(&par.ctx[level], Representation::Ntt), level)
			}
		};
		Ok(Self {
			par: par.clone(),
			poly,
			encoding,
			level,
		})
	}

	/// Returns the encoding of the plaintext.
	pub const fn encoding(&self) -> Encoding {
		self.encoding
	}

	/// Returns the level of the plaintext.
	pub const fn level(&self) -> usize {
		self.level
	}

	/// Recover the message modulo the plaintext modulus, as a polynomial in
	/// PowerBasis representation.
	pub(crate) fn ring_t(&self) -> Result<Poly> {
		match self.encoding {
			Encoding::RingT => Ok(self.poly.clone()),
			Encoding::Standard => {
				let mut p = self.poly.clone();
				p.change_representation(Representation::PowerBasis);
				Ok(p.scale(&self.par.decode_scalers[self.level])?)
			}
			Encoding::Mul => {
				let mut p = self.poly.clone();
				p.change_representation(Representation::PowerBasis);
				Ok(p.scale(&self.par.lift_scalers[self.level])?)
			}
		}
	}

	/// Create a plaintext with the given encoding and level from a message
	/// modulo the plaintext modulus in PowerBasis representation.
	pub(crate) fn from_ring_t(
		par: &Arc<BfvParameters>,
		m: &Poly,
		encoding: Encoding,
		level: usize,
	) -> Result<Self> {
		par.check_level(level)?;
		if m.ctx() != &par.ctx_t || m.representation() != &Representation::PowerBasis {
			return Err(Error::DefaultError(
				"The message should be modulo the plaintext modulus in PowerBasis representation"
					.to_string(),
			));
		}

		let (poly, level) = match encoding {
			Encoding::RingT => (m.clone(), par.max_level()),
			Encoding::Standard | Encoding::Mul => {
				let t = par.plaintext.modulus();
				let centered = m
					.coefficients()
					.row(0)
					.iter()
					.map(|mi| {
						if *mi > t >> 1 {
							*mi as i64 - t as i64
						} else {
							*mi as i64
						}
					})
					.collect::<Vec<_>>();
				let mut poly = Poly::from_i64(&par.ctx[level], &centered)?;
				if encoding == Encoding::Standard {
					poly *= &par.delta[level];
				}
				poly.change_representation(Representation::Ntt);
				(poly, level)
			}
		};

		Ok(Self {
			par: par.clone(),
			poly,
			encoding,
			level,
		})
	}

	/// Re-encode the plaintext with another encoding and at another level.
	pub(crate) fn lift_to(&self, encoding: Encoding, level: usize) -> Result<Self> {
		if self.encoding == encoding && (self.level == level || encoding == Encoding::RingT) {
			Ok(self.clone())
		} else {
			Self::from_ring_t(&self.par, &self.ring_t()?, encoding, level)
		}
	}
}
