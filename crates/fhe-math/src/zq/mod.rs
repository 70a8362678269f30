//! Ring operations for moduli up to 62 bits.

pub mod ntt;
pub mod primes;

use crate::{Error, Result};
use fhe_util::inverse;
use itertools::izip;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rand::{CryptoRng, Rng, RngCore};

/// Structure encapsulating an integer modulus up to 62 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modulus {
	pub(crate) p: u64,
	barrett_hi: u64,
	barrett_lo: u64,
}

impl Modulus {
	/// Create a modulus from an integer of at most 62 bits.
	pub fn new(p: u64) -> Result<Self> {
		if p < 2 || (p >> 62) != 0 {
			Err(Error::InvalidModulus(p))
		} else {
			let barrett = ((BigUint::from(1u64) << 128usize) / p).to_u128().unwrap_or_default();
			Ok(Self {
				p,
				barrett_hi: (barrett >> 64) as u64,
				barrett_lo: barrett as u64,
			})
		}
	}

	/// Returns the value of the modulus.
	pub const fn modulus(&self) -> u64 {
		self.p
	}

	/// Modular addition of a and b in constant time.
	///
	/// Aborts if a >= p or b >= p in debug mode.
	pub const fn add(&self, a: u64, b: u64) -> u64 {
		debug_assert!(a < self.p && b < self.p);
		Self::reduce1(a + b, self.p)
	}

	/// Modular subtraction of a and b in constant time.
	///
	/// Aborts if a >= p or b >= p in debug mode.
	pub const fn sub(&self, a: u64, b: u64) -> u64 {
		debug_assert!(a < self.p && b < self.p);
		Self::reduce1(a + self.p - b, self.p)
	}

	/// Modular multiplication of a and b in constant time.
	///
	/// Aborts if a >= p or b >= p in debug mode.
	pub const fn mul(&self, a: u64, b: u64) -> u64 {
		debug_assert!(a < self.p && b < self.p);
		self.reduce_u128((a as u128) * (b as u128))
	}

	/// Modular negation in constant time.
	///
	/// Aborts if a >= p in debug mode.
	pub const fn neg(&self, a: u64) -> u64 {
		debug_assert!(a < self.p);
		Self::reduce1(self.p - a, self.p)
	}

	/// Compute the Shoup representation of a.
	///
	/// Aborts if a >= p in debug mode.
	pub const fn shoup(&self, a: u64) -> u64 {
		debug_assert!(a < self.p);
		(((a as u128) << 64) / (self.p as u128)) as u64
	}

	/// Shoup multiplication of a and b in constant time.
	///
	/// Aborts if b >= p or b_shoup != shoup(b) in debug mode.
	pub const fn mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
		Self::reduce1(self.lazy_mul_shoup(a, b, b_shoup), self.p)
	}

	/// Lazy Shoup multiplication of a and b in constant time.
	/// The output is in the interval [0, 2 * p).
	///
	/// Aborts if b >= p or b_shoup != shoup(b) in debug mode.
	pub const fn lazy_mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
		debug_assert!(b < self.p);

		let q = ((a as u128) * (b_shoup as u128)) >> 64;
		let r = ((a as u128) * (b as u128) - q * (self.p as u128)) as u64;

		debug_assert!(r < 2 * self.p);
		r
	}

	/// Modular exponentiation in variable time.
	///
	/// Aborts if a >= p in debug mode.
	pub fn pow(&self, a: u64, n: u64) -> u64 {
		debug_assert!(a < self.p);

		if n == 0 {
			return 1;
		}

		let mut r = a;
		let mut i = 62 - n.leading_zeros() as isize;
		while i >= 0 {
			r = self.mul(r, r);
			if (n >> i) & 1 == 1 {
				r = self.mul(r, a);
			}
			i -= 1;
		}
		r
	}

	/// Modular inversion in variable time.
	///
	/// Returns None if a is not invertible modulo p.
	pub fn inv(&self, a: u64) -> Option<u64> {
		inverse(a % self.p, self.p)
	}

	/// Modular reduction of a in constant time.
	pub const fn reduce(&self, a: u64) -> u64 {
		self.reduce_u128(a as u128)
	}

	/// Modular reduction of a u128 in constant time, using Barrett reduction.
	pub const fn reduce_u128(&self, a: u128) -> u64 {
		let a_lo = (a as u64) as u128;
		let a_hi = a >> 64;
		let lo_lo = (a_lo * (self.barrett_lo as u128)) >> 64;
		let hi_lo = a_hi * (self.barrett_lo as u128);
		let lo_hi = a_lo * (self.barrett_hi as u128);

		// The middle words are summed separately so that no carry is lost.
		let mid = (hi_lo as u64) as u128 + (lo_hi as u64) as u128 + lo_lo;
		let q = a_hi * (self.barrett_hi as u128) + (hi_lo >> 64) + (lo_hi >> 64) + (mid >> 64);
		let r = (a - q * (self.p as u128)) as u64;

		Self::reduce1(r, self.p)
	}

	/// Modular reduction of a signed integer.
	pub const fn reduce_i64(&self, a: i64) -> u64 {
		let r = self.reduce(a.unsigned_abs());
		if a < 0 {
			self.neg(r)
		} else {
			r
		}
	}

	/// Returns the centered representative of a, in the interval
	/// [-(p - 1) / 2, p / 2].
	///
	/// Aborts if a >= p in debug mode.
	pub const fn center(&self, a: u64) -> i64 {
		debug_assert!(a < self.p);
		if 2 * a > self.p {
			(a as i64) - (self.p as i64)
		} else {
			a as i64
		}
	}

	/// Reduce x in [0, 2 * p) to [0, p) in constant time.
	///
	/// Aborts if x >= 2 * p in debug mode.
	pub(crate) const fn reduce1(x: u64, p: u64) -> u64 {
		debug_assert!(p >> 63 == 0);
		debug_assert!(x < 2 * p);

		let y = x.wrapping_sub(p);
		let mask = 0u64.wrapping_sub(y >> 63);
		(y & !mask) | (x & mask)
	}

	/// Modular addition of vectors in place in constant time.
	///
	/// Aborts if a and b differ in size, and if any of their values is >= p in
	/// debug mode.
	pub fn add_vec(&self, a: &mut [u64], b: &[u64]) {
		debug_assert_eq!(a.len(), b.len());
		izip!(a.iter_mut(), b.iter()).for_each(|(ai, bi)| *ai = self.add(*ai, *bi));
	}

	/// Modular subtraction of vectors in place in constant time.
	///
	/// Aborts if a and b differ in size, and if any of their values is >= p in
	/// debug mode.
	pub fn sub_vec(&self, a: &mut [u64], b: &[u64]) {
		debug_assert_eq!(a.len(), b.len());
		izip!(a.iter_mut(), b.iter()).for_each(|(ai, bi)| *ai = self.sub(*ai, *bi));
	}

	/// Modular multiplication of vectors in place in constant time.
	///
	/// Aborts if a and b differ in size, and if any of their values is >= p in
	/// debug mode.
	pub fn mul_vec(&self, a: &mut [u64], b: &[u64]) {
		debug_assert_eq!(a.len(), b.len());
		izip!(a.iter_mut(), b.iter()).for_each(|(ai, bi)| *ai = self.mul(*ai, *bi));
	}

	/// Modular scalar multiplication of vectors in place in constant time.
	///
	/// Aborts if any of the values in a is >= p in debug mode.
	pub fn scalar_mul_vec(&self, a: &mut [u64], b: u64) {
		let b = self.reduce(b);
		let b_shoup = self.shoup(b);
		a.iter_mut()
			.for_each(|ai| *ai = self.mul_shoup(*ai, b, b_shoup));
	}

	/// Modular negation of a vector in place in constant time.
	///
	/// Aborts if any of the values in the vector is >= p in debug mode.
	pub fn neg_vec(&self, a: &mut [u64]) {
		a.iter_mut().for_each(|ai| *ai = self.neg(*ai));
	}

	/// Modular reduction of a vector in place in constant time.
	pub fn reduce_vec(&self, a: &mut [u64]) {
		a.iter_mut().for_each(|ai| *ai = self.reduce(*ai));
	}

	/// Compute the Shoup representation of a vector.
	///
	/// Aborts if any of the values of the vector is >= p in debug mode.
	pub fn shoup_vec(&self, a: &[u64]) -> Vec<u64> {
		a.iter().map(|ai| self.shoup(*ai)).collect()
	}

	/// Shoup modular multiplication of vectors in place in constant time.
	///
	/// Aborts if a and b differ in size, or if b_shoup is not the Shoup
	/// representation of b in debug mode.
	pub fn mul_shoup_vec(&self, a: &mut [u64], b: &[u64], b_shoup: &[u64]) {
		debug_assert_eq!(a.len(), b.len());
		debug_assert_eq!(a.len(), b_shoup.len());
		izip!(a.iter_mut(), b.iter(), b_shoup.iter())
			.for_each(|(ai, bi, bi_shoup)| *ai = self.mul_shoup(*ai, *bi, *bi_shoup));
	}

	/// Reduce a vector of signed integers modulo p.
	pub fn reduce_vec_i64(&self, a: &[i64]) -> Vec<u64> {
		a.iter().map(|ai| self.reduce_i64(*ai)).collect()
	}

	/// Returns a random vector of uniform elements modulo p.
	pub fn random_vec<R: RngCore + CryptoRng>(&self, size: usize, rng: &mut R) -> Vec<u64> {
		(0..size).map(|_| rng.gen_range(0..self.p)).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::Modulus;
	use crate::Error;
	use fhe_util::is_prime;
	use proptest::{collection::vec as prop_vec, prelude::*};
	use rand::thread_rng;

	// Utility functions for the proptests.

	fn valid_moduli() -> impl Strategy<Value = Modulus> {
		any::<u64>().prop_filter_map("filter invalid moduli", |p| Modulus::new(p).ok())
	}

	fn vecs() -> BoxedStrategy<(Vec<u64>, Vec<u64>)> {
		prop_vec(any::<u64>(), 1..100)
			.prop_flat_map(|vec| {
				let len = vec.len();
				(Just(vec), prop_vec(any::<u64>(), len))
			})
			.boxed()
	}

	proptest! {
		#[test]
		fn constructor(p: u64) {
			if (2..1 << 62).contains(&p) {
				prop_assert!(Modulus::new(p).is_ok());
			} else {
				prop_assert_eq!(Modulus::new(p).unwrap_err(), Error::InvalidModulus(p));
			}
		}

		#[test]
		fn add(p in valid_moduli(), mut a: u64, mut b: u64) {
			a = p.reduce(a);
			b = p.reduce(b);
			prop_assert_eq!(p.add(a, b), ((a as u128 + b as u128) % (p.p as u128)) as u64);
		}

		#[test]
		fn sub(p in valid_moduli(), mut a: u64, mut b: u64) {
			a = p.reduce(a);
			b = p.reduce(b);
			prop_assert_eq!(p.sub(a, b), ((a as u128 + (p.p as u128) - b as u128) % (p.p as u128)) as u64);
		}

		#[test]
		fn mul(p in valid_moduli(), mut a: u64, mut b: u64) {
			a = p.reduce(a);
			b = p.reduce(b);
			prop_assert_eq!(p.mul(a, b), ((a as u128 * b as u128) % (p.p as u128)) as u64);
		}

		#[test]
		fn mul_shoup(p in valid_moduli(), mut a: u64, mut b: u64) {
			a = p.reduce(a);
			b = p.reduce(b);
			let b_shoup = p.shoup(b);
			prop_assert_eq!(p.mul_shoup(a, b, b_shoup), ((a as u128 * b as u128) % (p.p as u128)) as u64);
		}

		#[test]
		fn neg(p in valid_moduli(), mut a: u64) {
			a = p.reduce(a);
			prop_assert_eq!(p.add(p.neg(a), a), 0);
		}

		#[test]
		fn reduce(p in valid_moduli(), a: u64, b: u128, c: i64) {
			prop_assert_eq!(p.reduce(a), a % p.p);
			prop_assert_eq!(p.reduce_u128(b), (b % (p.p as u128)) as u64);
			prop_assert_eq!(p.reduce_i64(c), (c as i128).rem_euclid(p.p as i128) as u64);
		}

		#[test]
		fn center(p in valid_moduli(), a: i64) {
			let a = a % ((p.p / 2) as i64).max(1);
			prop_assert_eq!(p.center(p.reduce_i64(a)), a);
		}

		#[test]
		fn add_vec(p in valid_moduli(), (mut a, mut b) in vecs()) {
			p.reduce_vec(&mut a);
			p.reduce_vec(&mut b);
			let mut c = a.clone();
			p.add_vec(&mut c, &b);
			prop_assert_eq!(c, a.iter().zip(b.iter()).map(|(ai, bi)| p.add(*ai, *bi)).collect::<Vec<_>>());
		}

		#[test]
		fn sub_vec(p in valid_moduli(), (mut a, mut b) in vecs()) {
			p.reduce_vec(&mut a);
			p.reduce_vec(&mut b);
			let mut c = a.clone();
			p.sub_vec(&mut c, &b);
			prop_assert_eq!(c, a.iter().zip(b.iter()).map(|(ai, bi)| p.sub(*ai, *bi)).collect::<Vec<_>>());
		}

		#[test]
		fn mul_vec(p in valid_moduli(), (mut a, mut b) in vecs()) {
			p.reduce_vec(&mut a);
			p.reduce_vec(&mut b);
			let b_shoup = p.shoup_vec(&b);
			let expected = a.iter().zip(b.iter()).map(|(ai, bi)| p.mul(*ai, *bi)).collect::<Vec<_>>();
			let mut c = a.clone();
			p.mul_vec(&mut c, &b);
			prop_assert_eq!(&c, &expected);
			let mut c = a.clone();
			p.mul_shoup_vec(&mut c, &b, &b_shoup);
			prop_assert_eq!(&c, &expected);
		}

		#[test]
		fn scalar_mul_vec(p in valid_moduli(), mut a: Vec<u64>, b: u64) {
			p.reduce_vec(&mut a);
			let mut c = a.clone();
			p.scalar_mul_vec(&mut c, b);
			prop_assert_eq!(c, a.iter().map(|ai| p.mul(*ai, p.reduce(b))).collect::<Vec<_>>());
		}

		#[test]
		fn neg_vec(p in valid_moduli(), mut a: Vec<u64>) {
			p.reduce_vec(&mut a);
			let mut c = a.clone();
			p.neg_vec(&mut c);
			prop_assert_eq!(c, a.iter().map(|ai| p.neg(*ai)).collect::<Vec<_>>());
		}
	}

	#[test]
	fn pow_and_inv() {
		let ntests = 100;
		let mut rng = thread_rng();

		for p in [2u64, 3, 17, 1987, 4611686018326724609] {
			let q = Modulus::new(p).unwrap();

			assert_eq!(q.pow(p - 1, 0), 1);
			assert_eq!(q.pow(p - 1, 1), p - 1);
			assert_eq!(q.pow(p - 1, 2 * (p / 2)), 1);
			assert_eq!(q.inv(0), None);

			for a in q.random_vec(ntests, &mut rng) {
				if is_prime(p) && a != 0 {
					assert_eq!(q.pow(a, p - 1), 1);
					let a_inv = q.inv(a).unwrap();
					assert_eq!(q.mul(a, a_inv), 1);
				}
			}
		}
	}

	#[test]
	fn random_vec() {
		let mut rng = thread_rng();
		let q = Modulus::new(1153).unwrap();
		let v = q.random_vec(1000, &mut rng);
		assert_eq!(v.len(), 1000);
		assert!(v.iter().all(|vi| *vi < 1153));
	}
}
