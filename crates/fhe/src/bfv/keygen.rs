//! Key generation for the BFV encryption scheme

use crate::{
	bfv::{
		traits::FheParametrized, BfvParameters, PublicKey, RelinearizationKey, RotationKey,
		RotationKeySet, SecretKey,
	},
	Error, Result,
};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Generator of the keys of the BFV encryption scheme.
///
/// The generator owns its random source: by default, a ChaCha8 generator
/// seeded from the operating system.
#[derive(Debug)]
pub struct KeyGenerator<R: RngCore + CryptoRng = ChaCha8Rng> {
	par: Arc<BfvParameters>,
	rng: R,
}

impl<R: RngCore + CryptoRng> FheParametrized for KeyGenerator<R> {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl KeyGenerator<ChaCha8Rng> {
	/// Create a key generator with a fresh random source.
	pub fn new(par: &Arc<BfvParameters>) -> Self {
		Self::with_rng(par, ChaCha8Rng::from_entropy())
	}
}

impl<R: RngCore + CryptoRng> KeyGenerator<R> {
	/// Create a key generator drawing its randomness from `rng`.
	pub fn with_rng(par: &Arc<BfvParameters>, rng: R) -> Self {
		Self {
			par: par.clone(),
			rng,
		}
	}

	fn check_key(&self, sk: &SecretKey) -> Result<()> {
		if self.has_same_parameters(sk) {
			Ok(())
		} else {
			Err(Error::ParametersMismatch)
		}
	}

	/// Generate a secret key.
	pub fn gen_secret_key(&mut self) -> SecretKey {
		SecretKey::random(&self.par, &mut self.rng)
	}

	/// Generate a public key for the secret key.
	pub fn gen_public_key(&mut self, sk: &SecretKey) -> Result<PublicKey> {
		self.check_key(sk)?;
		PublicKey::new(sk, &mut self.rng)
	}

	/// Generate a secret key and the corresponding public key.
	#[instrument(skip_all)]
	pub fn gen_key_pair(&mut self) -> Result<(SecretKey, PublicKey)> {
		let sk = self.gen_secret_key();
		let pk = self.gen_public_key(&sk)?;
		Ok((sk, pk))
	}

	/// Generate a relinearization key for ciphertexts up to degree
	/// `max_degree + 1`. Only `max_degree = 1` is supported.
	#[instrument(skip_all)]
	pub fn gen_relinearization_key(
		&mut self,
		sk: &SecretKey,
		max_degree: usize,
	) -> Result<RelinearizationKey> {
		self.check_key(sk)?;
		if max_degree != 1 {
			return Err(Error::DegreeMismatch(max_degree, 1));
		}
		RelinearizationKey::new(sk, &mut self.rng)
	}

	/// Generate the rotation key for a galois element.
	#[instrument(skip_all)]
	pub fn gen_rotation_key(&mut self, sk: &SecretKey, element: usize) -> Result<RotationKey> {
		self.check_key(sk)?;
		RotationKey::new(sk, element, &mut self.rng)
	}

	/// Generate the rotation keys to rotate the columns by each of the
	/// `shifts`, and the key to swap the rows if `include_conjugate`.
	///
	/// A shift that is a multiple of half the degree is the identity and does
	/// not need a key. The keys to undo a rotation by `k` are generated only if
	/// `-k` belongs to the shifts.
	#[instrument(skip_all)]
	pub fn gen_rotation_keys_for_rotations(
		&mut self,
		shifts: &[i64],
		include_conjugate: bool,
		sk: &SecretKey,
	) -> Result<RotationKeySet> {
		self.check_key(sk)?;

		let mut elements = shifts
			.iter()
			.map(|k| self.par.galois_element_for_column_rotation(*k))
			.filter(|element| *element != 1)
			.collect::<Vec<_>>();
		if include_conjugate {
			elements.push(self.par.galois_element_for_row_rotation());
		}
		elements.sort_unstable();
		elements.dedup();
		debug!(galois_elements = ?elements, "generating rotation keys");

		let mut keys = RotationKeySet::new(&self.par);
		for element in elements {
			keys.insert(self.gen_rotation_key(sk, element)?)?;
		}
		Ok(keys)
	}
}

#[cfg(test)]
mod tests {
	use super::KeyGenerator;
	use crate::{bfv::BfvParameters, Error};
	use rand::SeedableRng;
	use rand_chacha::ChaCha8Rng;
	use std::error::Error as StdError;

	#[test]
	fn keys() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(2, 16)?;
		let mut kgen = KeyGenerator::new(&params);
		let (sk, pk) = kgen.gen_key_pair()?;
		assert_eq!(pk.c.level(), params.max_level());
		let rlk = kgen.gen_relinearization_key(&sk, 1)?;
		assert_eq!(rlk.ksk.c0.len(), 2);

		assert_eq!(
			kgen.gen_relinearization_key(&sk, 2).unwrap_err(),
			Error::DegreeMismatch(2, 1)
		);

		let other = BfvParameters::default_arc(1, 16)?;
		let other_sk = KeyGenerator::new(&other).gen_secret_key();
		assert_eq!(
			kgen.gen_public_key(&other_sk).unwrap_err(),
			Error::ParametersMismatch
		);
		assert_eq!(
			kgen.gen_rotation_key(&other_sk, 3).unwrap_err(),
			Error::ParametersMismatch
		);
		Ok(())
	}

	#[test]
	fn rotation_keys() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(1, 16)?;
		let mut kgen = KeyGenerator::new(&params);
		let sk = kgen.gen_secret_key();

		let keys = kgen.gen_rotation_keys_for_rotations(&[1, -1, 0, 8, 9], true, &sk)?;
		// 1 and 9 share the galois element 3; 0 and 8 are the identity.
		assert_eq!(keys.galois_elements(), vec![3, 11, 31]);

		let keys = kgen.gen_rotation_keys_for_rotations(&[2], false, &sk)?;
		assert_eq!(keys.galois_elements(), vec![9]);
		Ok(())
	}

	#[test]
	fn deterministic() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(1, 16)?;
		let mut kgen1 = KeyGenerator::with_rng(&params, ChaCha8Rng::seed_from_u64(42));
		let mut kgen2 = KeyGenerator::with_rng(&params, ChaCha8Rng::seed_from_u64(42));
		let (sk1, pk1) = kgen1.gen_key_pair()?;
		let (sk2, pk2) = kgen2.gen_key_pair()?;
		assert_eq!(sk1, sk2);
		assert_eq!(pk1, pk2);
		Ok(())
	}
}
