//! Rotation keys for the BFV encryption scheme

use super::key_switching_key::KeySwitchingKey;
use crate::{
	bfv::{traits::FheParametrized, BfvParameters, Ciphertext, SecretKey},
	Error, Result,
};
use fhe_math::rq::{Representation, SubstitutionExponent};
use rand::{CryptoRng, RngCore};
use std::{collections::HashMap, sync::Arc};
use tracing::instrument;

/// Rotation key for the BFV encryption scheme: a key switching key from
/// the image of the secret key under the automorphism x -> x^element, to the
/// secret key.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RotationKey {
	pub(crate) element: usize,
	pub(crate) ksk: KeySwitchingKey,
}

impl FheParametrized for RotationKey {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.ksk.par
	}
}

impl RotationKey {
	/// Generate a [`RotationKey`] for the galois element `element`, which must
	/// be odd modulo twice the degree.
	pub fn new<R: RngCore + CryptoRng>(
		sk: &SecretKey,
		element: usize,
		rng: &mut R,
	) -> Result<Self> {
		let ctx = &sk.par.ctx_qp[sk.par.max_level()];
		let exponent = SubstitutionExponent::new(ctx, element)?;
		let s = sk.poly_at(ctx)?;
		let s_sub = zeroize::Zeroizing::new(s.substitute(&exponent)?);
		let ksk = KeySwitchingKey::new(sk, &s_sub, rng)?;
		Ok(Self {
			element: exponent.exponent(),
			ksk,
		})
	}

	/// Returns the galois element of the key.
	pub const fn element(&self) -> usize {
		self.element
	}

	/// Apply the automorphism to a ciphertext of degree 1, and switch the key
	/// back to the secret key.
	#[instrument(skip_all)]
	pub(crate) fn apply(&self, ct: &Ciphertext) -> Result<Ciphertext> {
		if ct.degree() != 1 {
			return Err(Error::DegreeMismatch(ct.degree(), 1));
		}

		let exponent = SubstitutionExponent::new(&ct.par.ctx[ct.level], self.element)?;
		let mut c0 = ct.c[0].substitute(&exponent)?;
		let c1 = ct.c[1].substitute(&exponent)?;
		let (k0, k1) = self.ksk.key_switch(&c1, ct.level)?;
		c0.change_representation(Representation::Ntt);
		c0 += &k0;

		Ok(Ciphertext {
			par: ct.par.clone(),
			c: vec![c0, k1],
			level: ct.level,
			is_zero_encryption: false,
		})
	}
}

/// A set of rotation keys, indexed by galois element.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RotationKeySet {
	pub(crate) par: Arc<BfvParameters>,
	pub(crate) keys: HashMap<usize, RotationKey>,
}

impl FheParametrized for RotationKeySet {
	fn parameters(&self) -> &Arc<BfvParameters> {
		&self.par
	}
}

impl RotationKeySet {
	/// Create an empty set of rotation keys.
	pub fn new(par: &Arc<BfvParameters>) -> Self {
		Self {
			par: par.clone(),
			keys: HashMap::new(),
		}
	}

	/// Insert a key, replacing the key with the same galois element if any.
	///
	/// Returns an error if the key was generated under other parameters.
	pub fn insert(&mut self, key: RotationKey) -> Result<()> {
		if !self.has_same_parameters(&key) {
			return Err(Error::ParametersMismatch);
		}
		self.keys.insert(key.element, key);
		Ok(())
	}

	/// Returns the key for the galois element, if any.
	pub fn get(&self, element: usize) -> Option<&RotationKey> {
		self.keys.get(&(element % (2 * self.par.degree())))
	}

	/// Returns whether the set holds a key for the galois element.
	pub fn contains(&self, element: usize) -> bool {
		self.get(element).is_some()
	}

	/// Returns the galois elements of the keys, in increasing order.
	pub fn galois_elements(&self) -> Vec<usize> {
		let mut elements = self.keys.keys().copied().collect::<Vec<_>>();
		elements.sort_unstable();
		elements
	}

	/// Returns the number of keys.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Returns whether the set is empty.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}
}
