//! Secret keys for the BFV encryption scheme

use crate::{
	bfv::{traits::FheParametrized, BfvParameters},
	Error, Result,
};
use fhe_math::rq::{Context, Poly, Representation};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

/// Secret key for the BFV encryption scheme.
#[derive(Debug, PartialEq, Eq, Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
	#[zeroize(skip)]
	pub(crate) par: Arc<BfvParameters>,
	pub(crate) coeffs: Box<[i64]>,
}

impl FheParametrized for SecretKey {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl SecretKey {
	/// Generate a random [`SecretKey`] following the secret distribution of
	/// the parameters.
	pub fn random<R: RngCore + CryptoRng>(par: &Arc<BfvParameters>, rng: &mut R) -> Self {
		let coeffs = par.secret_distribution().sample(par.degree(), rng);
		Self {
			par: par.clone(),
			coeffs: coeffs.into_boxed_slice(),
		}
	}

	/// Create a [`SecretKey`] from its coefficients.
	///
	/// Returns an error if the number of coefficients differs from the degree.
	pub fn new(coeffs: Vec<i64>, par: &Arc<BfvParameters>) -> Result<Self> {
		if coeffs.len() != par.degree() {
			return Err(Error::DefaultError(format!(
				"Expected {} coefficients, got {}",
				par.degree(),
				coeffs.len()
			)));
		}
		Ok(Self {
			par: par.clone(),
			coeffs: coeffs.into_boxed_slice(),
		})
	}

	/// The secret key as a polynomial in Ntt representation in the context.
	pub(crate) fn poly_at(&self, ctx: &Arc<Context>) -> Result<Zeroizing<Poly>> {
		let mut s = Zeroizing::new(Poly::from_i64(ctx, &self.coeffs)?);
		s.change_representation(Representation::Ntt);
		Ok(s)
	}
}

#[cfg(test)]
mod tests {
	use super::SecretKey;
	use crate::bfv::{parameters::SecretDistribution, BfvParameters, BfvParametersBuilder};
	use rand::thread_rng;
	use std::error::Error;
	use zeroize::Zeroize;

	#[test]
	fn keygen() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let params = BfvParameters::default_arc(1, 16)?;
		let sk = SecretKey::random(&params, &mut rng);
		assert_eq!(sk.par, params);
		assert_eq!(sk.coeffs.len(), 16);
		assert!(sk.coeffs.iter().all(|si| (-1..=1).contains(si)));

		let params = BfvParametersBuilder::new()
			.set_degree(16)
			.set_plaintext_modulus(65537)
			.set_moduli_sizes(&[62])
			.set_secret_distribution(SecretDistribution::SparseTernary { hamming_weight: 4 })
			.build_arc()?;
		let sk = SecretKey::random(&params, &mut rng);
		assert_eq!(sk.coeffs.iter().filter(|si| **si != 0).count(), 4);
		Ok(())
	}

	#[test]
	fn new_and_zeroize() -> Result<(), Box<dyn Error>> {
		let params = BfvParameters::default_arc(1, 16)?;
		assert!(SecretKey::new(vec![1; 15], &params).is_err());

		let mut sk = SecretKey::new(vec![1; 16], &params)?;
		let s = sk.poly_at(&params.ctx[0])?;
		assert_eq!(s.ctx(), &params.ctx[0]);

		sk.zeroize();
		assert!(sk.coeffs.iter().all(|si| *si == 0));
		Ok(())
	}
}
