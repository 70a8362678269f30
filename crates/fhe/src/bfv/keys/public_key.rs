//! Public keys for the BFV encryption scheme

use crate::{
	bfv::{traits::FheParametrized, BfvParameters, Ciphertext, SecretKey},
	Result,
};
use fhe_math::rq::{Poly, Representation};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

/// Public key for the BFV encryption scheme: an encryption of zero at the
/// maximum level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
	pub(crate) par: Arc<BfvParameters>,
	pub(crate) c: Ciphertext,
}

impl FheParametrized for PublicKey {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl PublicKey {
	/// Generate a new [`PublicKey`] from a [`SecretKey`].
	pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
		let par = sk.par.clone();
		let level = par.max_level();
		let ctx = &par.ctx[level];
		let s = sk.poly_at(ctx)?;

		let a = Poly::random(ctx, Representation::Ntt, rng);
		let mut b = par.sample_error(ctx, rng)?;
		b -= &(&a * &*s);

		Ok(Self {
			c: Ciphertext {
				par: par.clone(),
				c: vec![b, a],
				level,
				is_zero_encryption: true,
			},
			par,
		})
	}
}
