//! Encryptors for the BFV encryption scheme.
//!
//! Three encryptors share the [`Encryptor`] interface: [`PkEncryptor`]
//! encrypts under a public key, [`SkEncryptor`] under a secret key, and
//! [`PrngEncryptor`] under a secret key with the uniform part of the
//! ciphertexts drawn from a caller-provided generator.

use crate::{
	bfv::{
		parameters::SecretDistribution,
		traits::{same_parameters, FheParametrized},
		BfvParameters, Ciphertext, Encoding, Plaintext, PublicKey, RelinearizationKey,
		RotationKeySet, SecretKey,
	},
	Error, Result,
};
use fhe_math::rq::{Poly, Representation};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{fmt::Debug, sync::Arc};
use zeroize::Zeroizing;

/// Key material an encryptor can be bound to.
#[derive(Debug, Clone, Copy)]
pub enum KeyMaterial<'a> {
	/// A public key.
	Public(&'a PublicKey),
	/// A secret key.
	Secret(&'a SecretKey),
	/// A relinearization key.
	Relinearization(&'a RelinearizationKey),
	/// A set of rotation keys.
	Rotation(&'a RotationKeySet),
}

impl KeyMaterial<'_> {
	fn kind(&self) -> &'static str {
		match self {
			Self::Public(_) => "PublicKey",
			Self::Secret(_) => "SecretKey",
			Self::Relinearization(_) => "RelinearizationKey",
			Self::Rotation(_) => "RotationKeySet",
		}
	}

	fn parameters(&self) -> &Arc<BfvParameters> {
		match self {
			Self::Public(key) => key.parameters(),
			Self::Secret(key) => key.parameters(),
			Self::Relinearization(key) => key.parameters(),
			Self::Rotation(key) => key.parameters(),
		}
	}
}

/// Create an encryptor bound to a public key or to a secret key.
///
/// Returns an error for any other kind of key.
pub fn new_encryptor(key: KeyMaterial<'_>) -> Result<Box<dyn Encryptor>> {
	match key {
		KeyMaterial::Public(pk) => Ok(Box::new(PkEncryptor::new(pk))),
		KeyMaterial::Secret(sk) => Ok(Box::new(SkEncryptor::new(sk)?)),
		_ => Err(Error::KeyTypeMismatch(
			key.kind().to_string(),
			"PublicKey or SecretKey".to_string(),
		)),
	}
}

/// Encryption of plaintexts into ciphertexts.
///
/// Only plaintexts with the Standard encoding can be encrypted. The
/// encryption of `pt` into `ct` is at the level `min(pt.level(),
/// ct.level())`.
pub trait Encryptor: FheParametrized + Send + Debug {
	/// Encrypt `pt` into `ct`, at the minimum of their levels.
	fn encrypt(&mut self, pt: &Plaintext, ct: &mut Ciphertext) -> Result<()>;

	/// Encrypt `pt` into a new ciphertext at the level of `pt`.
	fn encrypt_new(&mut self, pt: &Plaintext) -> Result<Ciphertext> {
		let mut ct = Ciphertext::zero(self.parameters(), 1, pt.level())?;
		self.encrypt(pt, &mut ct)?;
		Ok(ct)
	}

	/// Encrypt zero into `ct`, at the level of `ct`.
	///
	/// The resulting ciphertext can be relabelled at a lower level with
	/// [`Ciphertext::set_level`].
	fn encrypt_zero(&mut self, ct: &mut Ciphertext) -> Result<()>;

	/// Encrypt zero into a new ciphertext at the given level.
	fn encrypt_zero_new(&mut self, level: usize) -> Result<Ciphertext> {
		let mut ct = Ciphertext::zero(self.parameters(), 1, level)?;
		self.encrypt_zero(&mut ct)?;
		Ok(ct)
	}

	/// Returns an encryptor sharing the key and parameters, with its own
	/// random source. Both can be used concurrently.
	fn shallow_copy(&self) -> Box<dyn Encryptor>;

	/// Returns an encryptor bound to another key.
	///
	/// Returns an error if the kind of key is not supported by the encryptor,
	/// or if the key was generated under other parameters.
	fn with_key(&self, key: KeyMaterial<'_>) -> Result<Box<dyn Encryptor>>;
}

/// Check the operands of an encryption and return the output level.
fn encryption_level(par: &Arc<BfvParameters>, pt: &Plaintext, ct: &Ciphertext) -> Result<usize> {
	if !same_parameters(par, &pt.par) || !same_parameters(par, &ct.par) {
		return Err(Error::ParametersMismatch);
	}
	if pt.encoding != Encoding::Standard {
		return Err(Error::EncodingMismatch(
			pt.encoding.to_string(),
			Encoding::Standard.to_string(),
		));
	}
	Ok(pt.level.min(ct.level))
}

/// Add the plaintext to an encryption of zero at the given level.
fn add_plaintext(
	par: &Arc<BfvParameters>,
	pt: &Plaintext,
	level: usize,
	mut c: Vec<Poly>,
) -> Result<Ciphertext> {
	let pt = pt.lift_to(Encoding::Standard, level)?;
	c[0] += &pt.poly;
	Ok(Ciphertext {
		par: par.clone(),
		c,
		level,
		is_zero_encryption: false,
	})
}

fn check_key_parameters(par: &Arc<BfvParameters>, key: &KeyMaterial<'_>) -> Result<()> {
	if same_parameters(par, key.parameters()) {
		Ok(())
	} else {
		Err(Error::ParametersMismatch)
	}
}

/// Secret key encryption of zero with the uniform polynomial `a`.
fn sk_encrypt_zero<R: RngCore + CryptoRng>(
	par: &BfvParameters,
	sk: &Poly,
	a: Poly,
	level: usize,
	rng: &mut R,
) -> Result<Vec<Poly>> {
	let ctx = &par.ctx[level];
	let s = Zeroizing::new(sk.restrict(ctx)?);
	let mut b = par.sample_error(ctx, rng)?;
	b -= &(&a * &*s);
	Ok(vec![b, a])
}

/// Encryptor using a public key.
#[derive(Debug)]
pub struct PkEncryptor {
	par: Arc<BfvParameters>,
	pk: Arc<PublicKey>,
	rng: ChaCha8Rng,
}

impl FheParametrized for PkEncryptor {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl PkEncryptor {
	/// Create an encryptor bound to a public key.
	pub fn new(pk: &PublicKey) -> Self {
		Self {
			par: pk.par.clone(),
			pk: Arc::new(pk.clone()),
			rng: ChaCha8Rng::from_entropy(),
		}
	}

	fn encrypt_zero_at(&mut self, level: usize) -> Result<Vec<Poly>> {
		let ctx = &self.par.ctx[level];
		let u = SecretDistribution::Ternary.sample(self.par.degree(), &mut self.rng);
		let mut u = Zeroizing::new(Poly::from_i64(ctx, &u)?);
		u.change_representation(Representation::Ntt);

		let mut c0 = &self.pk.c.c[0].restrict(ctx)? * &*u;
		c0 += &self.par.sample_error(ctx, &mut self.rng)?;
		let mut c1 = &self.pk.c.c[1].restrict(ctx)? * &*u;
		c1 += &self.par.sample_error(ctx, &mut self.rng)?;
		Ok(vec![c0, c1])
	}
}

impl Encryptor for PkEncryptor {
	fn encrypt(&mut self, pt: &Plaintext, ct: &mut Ciphertext) -> Result<()> {
		let level = encryption_level(&self.par, pt, ct)?;
		let c = self.encrypt_zero_at(level)?;
		*ct = add_plaintext(&self.par, pt, level, c)?;
		Ok(())
	}

	fn encrypt_zero(&mut self, ct: &mut Ciphertext) -> Result<()> {
		if !self.has_same_parameters(&*ct) {
			return Err(Error::ParametersMismatch);
		}
		let c = self.encrypt_zero_at(ct.level)?;
		ct.c = c;
		ct.is_zero_encryption = true;
		Ok(())
	}

	fn shallow_copy(&self) -> Box<dyn Encryptor> {
		Box::new(Self {
			par: self.par.clone(),
			pk: self.pk.clone(),
			rng: ChaCha8Rng::from_entropy(),
		})
	}

	fn with_key(&self, key: KeyMaterial<'_>) -> Result<Box<dyn Encryptor>> {
		check_key_parameters(&self.par, &key)?;
		new_encryptor(key)
	}
}

/// Encryptor using a secret key.
#[derive(Debug)]
pub struct SkEncryptor {
	par: Arc<BfvParameters>,
	sk: Arc<Zeroizing<Poly>>,
	rng: ChaCha8Rng,
}

impl FheParametrized for SkEncryptor {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl SkEncryptor {
	/// Create an encryptor bound to a secret key.
	pub fn new(sk: &SecretKey) -> Result<Self> {
		let par = sk.par.clone();
		let s = sk.poly_at(&par.ctx[par.max_level()])?;
		Ok(Self {
			par,
			sk: Arc::new(s),
			rng: ChaCha8Rng::from_entropy(),
		})
	}

	/// Returns an encryptor drawing the uniform part of the ciphertexts from
	/// `prng`. Encryptors given identical generators output ciphertexts with
	/// identical uniform parts.
	pub fn with_prng<P: RngCore + CryptoRng + Send + Debug>(&self, prng: P) -> PrngEncryptor<P> {
		PrngEncryptor {
			par: self.par.clone(),
			sk: self.sk.clone(),
			prng,
			rng: ChaCha8Rng::from_entropy(),
		}
	}

	fn encrypt_zero_at(&mut self, level: usize) -> Result<Vec<Poly>> {
		let a = Poly::random(&self.par.ctx[level], Representation::Ntt, &mut self.rng);
		sk_encrypt_zero(&self.par, &self.sk, a, level, &mut self.rng)
	}
}

impl Encryptor for SkEncryptor {
	fn encrypt(&mut self, pt: &Plaintext, ct: &mut Ciphertext) -> Result<()> {
		let level = encryption_level(&self.par, pt, ct)?;
		let c = self.encrypt_zero_at(level)?;
		*ct = add_plaintext(&self.par, pt, level, c)?;
		Ok(())
	}

	fn encrypt_zero(&mut self, ct: &mut Ciphertext) -> Result<()> {
		if !self.has_same_parameters(&*ct) {
			return Err(Error::ParametersMismatch);
		}
		ct.c = self.encrypt_zero_at(ct.level)?;
		ct.is_zero_encryption = true;
		Ok(())
	}

	fn shallow_copy(&self) -> Box<dyn Encryptor> {
		Box::new(Self {
			par: self.par.clone(),
			sk: self.sk.clone(),
			rng: ChaCha8Rng::from_entropy(),
		})
	}

	fn with_key(&self, key: KeyMaterial<'_>) -> Result<Box<dyn Encryptor>> {
		check_key_parameters(&self.par, &key)?;
		new_encryptor(key)
	}
}

/// Encryptor using a secret key, where the uniform part of the ciphertexts is
/// drawn from a caller-provided generator. The errors are drawn from a
/// private random source.
#[derive(Debug)]
pub struct PrngEncryptor<P: RngCore + CryptoRng + Send + Debug> {
	par: Arc<BfvParameters>,
	sk: Arc<Zeroizing<Poly>>,
	prng: P,
	rng: ChaCha8Rng,
}

impl<P: RngCore + CryptoRng + Send + Debug> FheParametrized for PrngEncryptor<P> {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl<P: RngCore + CryptoRng + Send + Debug> PrngEncryptor<P> {
	/// Returns an encryptor with the same secret key drawing the uniform part
	/// of the ciphertexts from another generator.
	pub fn with_prng<Q: RngCore + CryptoRng + Send + Debug>(&self, prng: Q) -> PrngEncryptor<Q> {
		PrngEncryptor {
			par: self.par.clone(),
			sk: self.sk.clone(),
			prng,
			rng: ChaCha8Rng::from_entropy(),
		}
	}

	fn encrypt_zero_at(&mut self, level: usize) -> Result<Vec<Poly>> {
		let a = Poly::random(&self.par.ctx[level], Representation::Ntt, &mut self.prng);
		sk_encrypt_zero(&self.par, &self.sk, a, level, &mut self.rng)
	}
}

impl<P: RngCore + CryptoRng + Send + Debug> Encryptor for PrngEncryptor<P> {
	fn encrypt(&mut self, pt: &Plaintext, ct: &mut Ciphertext) -> Result<()> {
		let level = encryption_level(&self.par, pt, ct)?;
		let c = self.encrypt_zero_at(level)?;
		*ct = add_plaintext(&self.par, pt, level, c)?;
		Ok(())
	}

	fn encrypt_zero(&mut self, ct: &mut Ciphertext) -> Result<()> {
		if !self.has_same_parameters(&*ct) {
			return Err(Error::ParametersMismatch);
		}
		ct.c = self.encrypt_zero_at(ct.level)?;
		ct.is_zero_encryption = true;
		Ok(())
	}

	/// The copy is a secret key encryptor with a private random source: a
	/// generator cannot be shared between concurrent encryptors.
	fn shallow_copy(&self) -> Box<dyn Encryptor> {
		Box::new(SkEncryptor {
			par: self.par.clone(),
			sk: self.sk.clone(),
			rng: ChaCha8Rng::from_entropy(),
		})
	}

	fn with_key(&self, key: KeyMaterial<'_>) -> Result<Box<dyn Encryptor>> {
		check_key_parameters(&self.par, &key)?;
		match key {
			KeyMaterial::Secret(sk) => Ok(Box::new(SkEncryptor::new(sk)?)),
			_ => Err(Error::KeyTypeMismatch(
				key.kind().to_string(),
				"SecretKey".to_string(),
			)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{new_encryptor, Encryptor, KeyMaterial, PkEncryptor, SkEncryptor};
	use crate::{
		bfv::{BfvParameters, Ciphertext, Decryptor, Encoder, KeyGenerator, KeyedPrng},
		Error,
	};
	use std::error::Error as StdError;

	#[test]
	fn encrypt_decrypt() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(2, 16)?;
		let mut kgen = KeyGenerator::new(&params);
		let (sk, pk) = kgen.gen_key_pair()?;
		let encoder = Encoder::new(&params);
		let decryptor = Decryptor::new(&sk)?;
		let values = params.plaintext.random_vec(16, &mut rand::thread_rng());

		let mut encryptors: Vec<Box<dyn Encryptor>> = vec![
			Box::new(PkEncryptor::new(&pk)),
			Box::new(SkEncryptor::new(&sk)?),
			Box::new(SkEncryptor::new(&sk)?.with_prng(KeyedPrng::new(b"seed")?)),
		];
		for encryptor in encryptors.iter_mut() {
			for level in 0..=params.max_level() {
				let pt = encoder.encode_new(&values, level)?;
				let ct = encryptor.encrypt_new(&pt)?;
				assert_eq!(ct.level(), level);
				assert_eq!(ct.degree(), 1);
				assert_eq!(encoder.decode_new(&decryptor.decrypt_new(&ct)?)?, values);

				let ct = encryptor.encrypt_zero_new(level)?;
				assert!(ct.is_zero_encryption());
				assert_eq!(encoder.decode_new(&decryptor.decrypt_new(&ct)?)?, vec![0; 16]);
			}

			// The output level is the minimum of the levels.
			let pt = encoder.encode_new(&values, 1)?;
			let mut ct = Ciphertext::zero(&params, 1, 0)?;
			encryptor.encrypt(&pt, &mut ct)?;
			assert_eq!(ct.level(), 0);
			assert_eq!(encoder.decode_new(&decryptor.decrypt_new(&ct)?)?, values);

			let pt = encoder.encode_new(&values, 0)?;
			let mut ct = Ciphertext::zero(&params, 1, 1)?;
			encryptor.encrypt(&pt, &mut ct)?;
			assert_eq!(ct.level(), 0);

			let mut copy = encryptor.shallow_copy();
			let ct = copy.encrypt_new(&pt)?;
			assert_eq!(encoder.decode_new(&decryptor.decrypt_new(&ct)?)?, values);
		}
		Ok(())
	}

	#[test]
	fn zero_relabel() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(3, 16)?;
		let mut kgen = KeyGenerator::new(&params);
		let (sk, pk) = kgen.gen_key_pair()?;
		let decryptor = Decryptor::new(&sk)?;
		let encoder = Encoder::new(&params);

		let mut encryptor = PkEncryptor::new(&pk);
		let mut ct = encryptor.encrypt_zero_new(2)?;
		ct.set_level(0)?;
		assert_eq!(ct.level(), 0);
		assert_eq!(encoder.decode_new(&decryptor.decrypt_new(&ct)?)?, vec![0; 16]);

		let pt = encoder.encode_new(&[1, 2, 3], 2)?;
		let mut ct = encryptor.encrypt_new(&pt)?;
		assert!(ct.set_level(0).is_err());
		Ok(())
	}

	#[test]
	fn prng_is_reproducible() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(1, 16)?;
		let mut kgen = KeyGenerator::new(&params);
		let sk = kgen.gen_secret_key();
		let encoder = Encoder::new(&params);
		let pt = encoder.encode_new(&[1, 2, 3], 0)?;

		let encryptor = SkEncryptor::new(&sk)?;
		let mut e1 = encryptor.with_prng(KeyedPrng::new(b"public randomness")?);
		let mut e2 = encryptor.with_prng(KeyedPrng::new(b"public randomness")?);
		let ct1 = e1.encrypt_new(&pt)?;
		let ct2 = e2.encrypt_new(&pt)?;
		assert_eq!(ct1[1], ct2[1]);
		assert_ne!(ct1[0], ct2[0]);

		let mut e3 = e1.with_prng(KeyedPrng::new(b"other randomness")?);
		assert_ne!(e3.encrypt_new(&pt)?[1], ct1[1]);
		Ok(())
	}

	#[test]
	fn errors() -> Result<(), Box<dyn StdError>> {
		let params = BfvParameters::default_arc(1, 16)?;
		let mut kgen = KeyGenerator::new(&params);
		let (sk, pk) = kgen.gen_key_pair()?;
		let rlk = kgen.gen_relinearization_key(&sk, 1)?;
		let encoder = Encoder::new(&params);

		let mut encryptor = new_encryptor(KeyMaterial::Public(&pk))?;
		let pt = encoder.encode_mul_new(&[1, 2, 3], 0)?;
		assert_eq!(
			encryptor.encrypt_new(&pt).unwrap_err(),
			Error::EncodingMismatch("Mul".to_string(), "Standard".to_string())
		);
		let pt = encoder.encode_ring_t_new(&[1, 2, 3])?;
		assert!(encryptor.encrypt_new(&pt).is_err());

		assert_eq!(
			encryptor
				.with_key(KeyMaterial::Relinearization(&rlk))
				.unwrap_err(),
			Error::KeyTypeMismatch(
				"RelinearizationKey".to_string(),
				"PublicKey or SecretKey".to_string()
			)
		);
		let mut encryptor = encryptor.with_key(KeyMaterial::Secret(&sk))?;
		let pt = encoder.encode_new(&[1, 2, 3], 0)?;
		assert_eq!(encryptor.encrypt_new(&pt)?.level(), 0);

		let prng_encryptor = SkEncryptor::new(&sk)?.with_prng(KeyedPrng::new(b"seed")?);
		assert!(matches!(
			prng_encryptor.with_key(KeyMaterial::Public(&pk)).unwrap_err(),
			Error::KeyTypeMismatch(_, _)
		));

		let other = BfvParameters::default_arc(2, 16)?;
		let other_sk = KeyGenerator::new(&other).gen_secret_key();
		assert_eq!(
			encryptor.with_key(KeyMaterial::Secret(&other_sk)).unwrap_err(),
			Error::ParametersMismatch
		);
		let other_pt = Encoder::new(&other).encode_new(&[1], 0)?;
		assert_eq!(
			encryptor.encrypt_new(&other_pt).unwrap_err(),
			Error::ParametersMismatch
		);
		let mut ct = Ciphertext::zero(&other, 1, 0)?;
		assert_eq!(
			encryptor.encrypt_zero(&mut ct).unwrap_err(),
			Error::ParametersMismatch
		);
		Ok(())
	}
}
