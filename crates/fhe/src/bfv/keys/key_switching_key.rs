//! Key-switching keys for the BFV encryption scheme

use crate::{
	bfv::{traits::FheParametrized, BfvParameters, SecretKey},
	Error, Result,
};
use fhe_math::rq::{traits::TryConvertFrom, Poly, Representation};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::instrument;

/// Key switching key for the BFV encryption scheme.
///
/// The key holds one RLWE encryption of `P * g_i * s'` per ciphertext
/// modulus, where `P` is the product of the special moduli and `g_i` the
/// i-th CRT reconstruction coefficient of the ciphertext modulus. Switching
/// decomposes the input in its residues, and divides the result by `P`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KeySwitchingKey {
	pub(crate) par: Arc<BfvParameters>,
	pub(crate) c0: Box<[Poly]>,
	pub(crate) c1: Box<[Poly]>,
}

impl FheParametrized for KeySwitchingKey {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl KeySwitchingKey {
	/// Generate a [`KeySwitchingKey`] to switch from `from` to the secret key.
	///
	/// `from` must be in Ntt representation over the ciphertext and special
	/// moduli at the maximum level.
	pub(crate) fn new<R: RngCore + CryptoRng>(
		sk: &SecretKey,
		from: &Poly,
		rng: &mut R,
	) -> Result<Self> {
		let par = sk.par.clone();
		let level = par.max_level();
		let ctx = &par.ctx_qp[level];
		if from.ctx() != ctx || from.representation() != &Representation::Ntt {
			return Err(Error::DefaultError(
				"The polynomial should be in Ntt representation over the extended context"
					.to_string(),
			));
		}

		let s = sk.poly_at(ctx)?;
		let rns = par.ctx[level].rns();
		let mut c0 = Vec::with_capacity(par.moduli().len());
		let mut c1 = Vec::with_capacity(par.moduli().len());
		for i in 0..par.moduli().len() {
			let garner = rns
				.get_garner(i)
				.ok_or_else(|| Error::DefaultError("Missing CRT coefficient".to_string()))?;
			let factor = &par.special_modulus * garner;

			let a = Poly::random(ctx, Representation::Ntt, rng);
			let mut b = par.sample_error(ctx, rng)?;
			b -= &(&a * &*s);
			b += &(from * &factor);
			c0.push(b);
			c1.push(a);
		}

		Ok(Self {
			par,
			c0: c0.into_boxed_slice(),
			c1: c1.into_boxed_slice(),
		})
	}

	/// Key switch a polynomial at a given level, and output the two
	/// polynomials in Ntt representation over the context of that level.
	#[instrument(skip_all)]
	pub(crate) fn key_switch(&self, p: &Poly, level: usize) -> Result<(Poly, Poly)> {
		let ctx = self.par.ctx_at_level(level)?;
		if p.ctx() != ctx {
			return Err(Error::DefaultError(
				"The polynomial is not at the requested level".to_string(),
			));
		}

		let ctx_qp = &self.par.ctx_qp[level];
		let mut p = p.clone();
		p.change_representation(Representation::PowerBasis);

		let mut c0 = Poly::zero(ctx_qp, Representation::Ntt);
		let mut c1 = Poly::zero(ctx_qp, Representation::Ntt);
		for (i, residues) in p.coefficients().outer_iter().enumerate() {
			let mut digit =
				Poly::try_convert_from(residues.to_vec(), ctx_qp, Representation::PowerBasis)?;
			digit.change_representation(Representation::Ntt);
			c0 += &(&digit * &self.c0[i].restrict(ctx_qp)?);
			c1 += &(&digit * &self.c1[i].restrict(ctx_qp)?);
		}

		c0.change_representation(Representation::PowerBasis);
		c1.change_representation(Representation::PowerBasis);
		let mut c0 = c0.scale(&self.par.mod_down[level])?;
		let mut c1 = c1.scale(&self.par.mod_down[level])?;
		c0.change_representation(Representation::Ntt);
		c1.change_representation(Representation::Ntt);
		Ok((c0, c1))
	}
}
