//! Encoding of vectors of integers into BFV plaintexts.
//!
//! The plaintext ring Z_t\[x\]/(x^N + 1) is isomorphic to N copies of Z_t
//! when t = 1 mod 2N. The slots are arranged as a 2 x (N / 2) matrix, so that
//! the automorphism x -> x^3 rotates both rows to the left, and the
//! automorphism x -> x^(2N - 1) swaps the rows.

use crate::{
	bfv::{
		plaintext::{Encoding, Plaintext},
		traits::FheParametrized,
		BfvParameters,
	},
	Error, Result,
};
use fhe_math::rq::{traits::TryConvertFrom, Poly, Representation};
use std::sync::Arc;

/// Encoder of vectors of integers modulo the plaintext modulus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoder {
	par: Arc<BfvParameters>,
}

impl FheParametrized for Encoder {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl Encoder {
	/// Create a new encoder.
	pub fn new(par: &Arc<BfvParameters>) -> Self {
		Self { par: par.clone() }
	}

	/// Returns an encoder sharing the parameters with `self`.
	pub fn shallow_copy(&self) -> Self {
		Self {
			par: self.par.clone(),
		}
	}

	/// Place the values in the slots, and return the corresponding message
	/// modulo the plaintext modulus.
	fn slots_to_ring_t(&self, values: &[u64]) -> Result<Poly> {
		if values.len() > self.par.degree() {
			return Err(Error::TooManyValues(values.len(), self.par.degree()));
		}

		let mut v = vec![0u64; self.par.degree()];
		for (value, index) in values.iter().zip(self.par.matrix_reps_index_map.iter()) {
			v[*index] = self.par.plaintext.reduce(*value);
		}

		let mut m = Poly::try_convert_from(v, &self.par.ctx_t, Representation::Ntt)?;
		m.change_representation(Representation::PowerBasis);
		Ok(m)
	}

	fn encode_with(
		&self,
		values: &[u64],
		pt: &mut Plaintext,
		encoding: Encoding,
	) -> Result<()> {
		if !self.has_same_parameters(&*pt) {
			return Err(Error::ParametersMismatch);
		}
		let m = self.slots_to_ring_t(values)?;
		*pt = Plaintext::from_ring_t(&self.par, &m, encoding, pt.level)?;
		Ok(())
	}

	/// Encode the values in the Standard encoding, at the level of `pt`.
	///
	/// Missing values are set to zero. Returns an error if there are more
	/// values than the degree.
	pub fn encode(&self, values: &[u64], pt: &mut Plaintext) -> Result<()> {
		self.encode_with(values, pt, Encoding::Standard)
	}

	/// Encode the values in a new plaintext with the Standard encoding at the
	/// given level.
	pub fn encode_new(&self, values: &[u64], level: usize) -> Result<Plaintext> {
		let mut pt = Plaintext::zero(&self.par, Encoding::Standard, level)?;
		self.encode(values, &mut pt)?;
		Ok(pt)
	}

	/// Encode the values in the RingT encoding.
	pub fn encode_ring_t(&self, values: &[u64], pt: &mut Plaintext) -> Result<()> {
		self.encode_with(values, pt, Encoding::RingT)
	}

	/// Encode the values in a new plaintext with the RingT encoding.
	pub fn encode_ring_t_new(&self, values: &[u64]) -> Result<Plaintext> {
		let mut pt = Plaintext::zero(&self.par, Encoding::RingT, self.par.max_level())?;
		self.encode_ring_t(values, &mut pt)?;
		Ok(pt)
	}

	/// Encode the values in the Mul encoding, at the level of `pt`.
	pub fn encode_mul(&self, values: &[u64], pt: &mut Plaintext) -> Result<()> {
		self.encode_with(values, pt, Encoding::Mul)
	}

	/// Encode the values in a new plaintext with the Mul encoding at the given
	/// level.
	pub fn encode_mul_new(&self, values: &[u64], level: usize) -> Result<Plaintext> {
		let mut pt = Plaintext::zero(&self.par, Encoding::Mul, level)?;
		self.encode_mul(values, &mut pt)?;
		Ok(pt)
	}

	/// Decode a plaintext of any encoding into `out`, which must have exactly
	/// as many slots as the degree.
	pub fn decode(&self, pt: &Plaintext, out: &mut [u64]) -> Result<()> {
		if !self.has_same_parameters(pt) {
			return Err(Error::ParametersMismatch);
		}
		if out.len() != self.par.degree() {
			return Err(Error::EncodingMismatch(
				format!("buffer of {} slots", out.len()),
				format!("buffer of {} slots", self.par.degree()),
			));
		}

		let mut m = pt.ring_t()?;
		m.change_representation(Representation::Ntt);
		let w = m.coefficients();
		for (oi, index) in out.iter_mut().zip(self.par.matrix_reps_index_map.iter()) {
			*oi = w[(0, *index)];
		}
		Ok(())
	}

	/// Decode a plaintext into a new vector.
	pub fn decode_new(&self, pt: &Plaintext) -> Result<Vec<u64>> {
		let mut out = vec![0u64; self.par.degree()];
		self.decode(pt, &mut out)?;
		Ok(out)
	}

	/// Decode a plaintext into a vector of values centered around zero.
	pub fn decode_i64(&self, pt: &Plaintext) -> Result<Vec<i64>> {
		let t = self.par.plaintext();
		Ok(self
			.decode_new(pt)?
			.into_iter()
			.map(|v| {
				if v > t >> 1 {
					v as i64 - t as i64
				} else {
					v as i64
				}
			})
			.collect())
	}
}
