//! Relinearization keys for the BFV encryption scheme

use super::key_switching_key::KeySwitchingKey;
use crate::{
	bfv::{traits::FheParametrized, BfvParameters, Ciphertext, SecretKey},
	Error, Result,
};
use fhe_math::rq::Representation;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::instrument;
use zeroize::Zeroizing;

/// Relinearization key for the BFV encryption scheme: a key switching key
/// from the square of the secret key to the secret key.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RelinearizationKey {
	pub(crate) ksk: KeySwitchingKey,
}

impl FheParametrized for RelinearizationKey {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.ksk.par
	}
}

impl RelinearizationKey {
	/// Generate a [`RelinearizationKey`] from a [`SecretKey`].
	pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
		let ctx = &sk.par.ctx_qp[sk.par.max_level()];
		let s = sk.poly_at(ctx)?;
		let s2 = Zeroizing::new(&*s * &*s);
		let ksk = KeySwitchingKey::new(sk, &s2, rng)?;
		Ok(Self { ksk })
	}

	/// Relinearize a ciphertext of degree 2 into a ciphertext of degree 1.
	#[instrument(skip_all)]
	pub(crate) fn relinearize(&self, ct: &Ciphertext) -> Result<Ciphertext> {
		if ct.degree() != 2 {
			return Err(Error::DegreeMismatch(ct.degree(), 2));
		}

		let mut c = ct.c.clone();
		c.iter_mut()
			.for_each(|ci| ci.change_representation(Representation::Ntt));
		let (c0, c1) = self.ksk.key_switch(&c[2], ct.level)?;
		c[0] += &c0;
		c[1] += &c1;
		c.truncate(2);

		Ok(Ciphertext {
			par: ct.par.clone(),
			c,
			level: ct.level,
			is_zero_encryption: false,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::RelinearizationKey;
	use crate::{
		bfv::{BfvParameters, Ciphertext, SecretKey},
		Error,
	};
	use fhe_math::rq::{Poly, Representation};
	use num_bigint::BigUint;
	use rand::thread_rng;
	use std::error::Error as StdError;

	#[test]
	fn relinearize() -> Result<(), Box<dyn StdError>> {
		let mut rng = thread_rng();
		let params = BfvParameters::default_arc(2, 16)?;
		let sk = SecretKey::random(&params, &mut rng);
		let rlk = RelinearizationKey::new(&sk, &mut rng)?;

		for level in 0..=params.max_level() {
			let ctx = &params.ctx[level];
			let c = (0..3)
				.map(|_| Poly::random(ctx, Representation::Ntt, &mut rng))
				.collect();
			let ct = Ciphertext::new(c, &params)?;
			let relinearized = rlk.relinearize(&ct)?;
			assert_eq!(relinearized.degree(), 1);
			assert_eq!(relinearized.level(), level);

			// Both ciphertexts decrypt to the same value, up to a small error.
			let s = sk.poly_at(ctx)?;
			let s2 = &*s * &*s;
			let mut diff = &(&ct[0] + &(&ct[1] * &*s)) + &(&ct[2] * &s2);
			diff -= &(&relinearized[0] + &(&relinearized[1] * &*s));
			diff.change_representation(Representation::PowerBasis);
			let q = ctx.modulus();
			let bound = BigUint::from(1u64 << 20);
			for d in Vec::<BigUint>::from(&diff) {
				assert!(std::cmp::min(d.clone(), q - &d) < bound);
			}

			assert_eq!(
				rlk.relinearize(&relinearized).unwrap_err(),
				Error::DegreeMismatch(1, 2)
			);
		}
		Ok(())
	}
}
