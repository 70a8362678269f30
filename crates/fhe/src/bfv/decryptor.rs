//! Decryptor for the BFV encryption scheme.

use crate::{
	bfv::{
		traits::{same_parameters, FheParametrized},
		BfvParameters, Ciphertext, Encoding, Plaintext, SecretKey,
	},
	Error, Result,
};
use fhe_math::rq::{Poly, Representation};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Decryptor holding a secret key.
#[derive(Debug, Clone)]
pub struct Decryptor {
	par: Arc<BfvParameters>,
	sk: Arc<Zeroizing<Poly>>,
}

impl FheParametrized for Decryptor {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl Decryptor {
	/// Create a decryptor for a secret key.
	pub fn new(sk: &SecretKey) -> Result<Self> {
		let par = sk.par.clone();
		let s = sk.poly_at(&par.ctx[par.max_level()])?;
		Ok(Self {
			par,
			sk: Arc::new(s),
		})
	}

	/// Returns a decryptor sharing the secret key with `self`.
	pub fn shallow_copy(&self) -> Self {
		self.clone()
	}

	/// Decrypt a ciphertext of degree 1 into `pt`, which receives the
	/// message in the Standard encoding at the level of the ciphertext.
	pub fn decrypt(&self, ct: &Ciphertext, pt: &mut Plaintext) -> Result<()> {
		if !same_parameters(&self.par, &ct.par) || !same_parameters(&self.par, &pt.par) {
			return Err(Error::ParametersMismatch);
		}
		if ct.degree() != 1 {
			return Err(Error::DegreeMismatch(ct.degree(), 1));
		}

		let ctx = &self.par.ctx[ct.level];
		let s = Zeroizing::new(self.sk.restrict(ctx)?);
		let mut c0 = ct.c[0].clone();
		let mut c1 = ct.c[1].clone();
		c0.change_representation(Representation::Ntt);
		c1.change_representation(Representation::Ntt);

		let mut phase = Zeroizing::new(&c1 * &*s);
		*phase += &c0;
		phase.change_representation(Representation::PowerBasis);
		let m = Zeroizing::new(phase.scale(&self.par.decode_scalers[ct.level])?);

		*pt = Plaintext::from_ring_t(&self.par, &m, Encoding::Standard, ct.level)?;
		Ok(())
	}

	/// Decrypt a ciphertext of degree 1 into a new plaintext.
	pub fn decrypt_new(&self, ct: &Ciphertext) -> Result<Plaintext> {
		let mut pt = Plaintext::zero(&self.par, Encoding::Standard, ct.level)?;
		self.decrypt(ct, &mut pt)?;
		Ok(pt)
	}
}

#[cfg(test)]
mod tests {
	use super::Decryptor;
	use crate::{
		bfv::{
			BfvParameters, Ciphertext, Encoder, Encoding, Encryptor, KeyGenerator, Plaintext,
			SkEncryptor,
		},
		Error,
	};
	use std::{error::Error as StdError, thread};

	#[test]
	fn decrypt() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(2, 16)?;
		let mut kgen = KeyGenerator::new(&params);
		let sk = kgen.gen_secret_key();
		let decryptor = Decryptor::new(&sk)?;
		let encoder = Encoder::new(&params);
		let mut encryptor = SkEncryptor::new(&sk)?;

		let values = (0..16u64).collect::<Vec<_>>();
		let ct = encryptor.encrypt_new(&encoder.encode_new(&values, 1)?)?;
		let mut pt = Plaintext::zero(&params, Encoding::Mul, 0)?;
		decryptor.decrypt(&ct, &mut pt)?;
		assert_eq!(pt.encoding(), Encoding::Standard);
		assert_eq!(pt.level(), 1);
		assert_eq!(pt, encoder.encode_new(&values, 1)?);

		// Copies decrypt concurrently.
		let copy = decryptor.shallow_copy();
		let result = thread::scope(|s| {
			let handle = s.spawn(|| copy.decrypt_new(&ct));
			let own = decryptor.decrypt_new(&ct);
			(own, handle.join())
		});
		assert_eq!(encoder.decode_new(&result.0?)?, values);
		assert!(matches!(result.1, Ok(Ok(_))));
		Ok(())
	}

	#[test]
	fn errors() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(1, 16)?;
		let sk = KeyGenerator::new(&params).gen_secret_key();
		let decryptor = Decryptor::new(&sk)?;

		let ct = Ciphertext::zero(&params, 2, 0)?;
		assert_eq!(
			decryptor.decrypt_new(&ct).unwrap_err(),
			Error::DegreeMismatch(2, 1)
		);

		let other = BfvParameters::default_arc(1, 32)?;
		let ct = Ciphertext::zero(&other, 1, 0)?;
		assert_eq!(
			decryptor.decrypt_new(&ct).unwrap_err(),
			Error::ParametersMismatch
		);
		Ok(())
	}
}
