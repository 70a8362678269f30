//! Keyed pseudo-random generator.

use crate::{Error, Result};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// A deterministic random generator derived from a key: parties sharing the
/// key draw the same stream, for example to agree on the public randomness of
/// ciphertexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedPrng {
	rng: ChaCha20Rng,
}

impl KeyedPrng {
	/// Create a generator from a key, which must not be empty.
	pub fn new(key: &[u8]) -> Result<Self> {
		if key.is_empty() {
			return Err(Error::InvalidPrng("The key must not be empty".to_string()));
		}
		let seed: [u8; 32] = Sha256::digest(key).into();
		Ok(Self {
			rng: ChaCha20Rng::from_seed(seed),
		})
	}
}

impl RngCore for KeyedPrng {
	fn next_u32(&mut self) -> u32 {
		self.rng.next_u32()
	}

	fn next_u64(&mut self) -> u64 {
		self.rng.next_u64()
	}

	fn fill_bytes(&mut self, dest: &mut [u8]) {
		self.rng.fill_bytes(dest)
	}

	fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
		self.rng.try_fill_bytes(dest)
	}
}

impl CryptoRng for KeyedPrng {}
