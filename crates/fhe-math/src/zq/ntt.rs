//! Number-Theoretic Transform in ZZ_q.
//!
//! The transform is negacyclic: the forward transform of a polynomial `a` of
//! degree less than `n` outputs, at index `j`, the evaluation of `a` at
//! `psi^(2 * bitrev(j) + 1)` where `psi` is a primitive `2n`-th root of unity.

use super::Modulus;
use fhe_util::is_prime;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Returns whether a modulus p is prime and supports the Number Theoretic
/// Transform of size n.
///
/// Returns false if n is not a power of 2 that is >= 8.
pub fn supports_ntt(p: u64, n: usize) -> bool {
	if n < 8 || !n.is_power_of_two() {
		return false;
	}

	p % ((n as u64) << 1) == 1 && is_prime(p)
}

/// Number-Theoretic Transform operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttOperator {
	p: Modulus,
	p_twice: u64,
	size: usize,
	omegas: Box<[u64]>,
	omegas_shoup: Box<[u64]>,
	zetas_inv: Box<[u64]>,
	zetas_inv_shoup: Box<[u64]>,
	size_inv: u64,
	size_inv_shoup: u64,
}

impl NttOperator {
	/// Create an NTT operator given a modulus for a specific size.
	///
	/// Returns None if the size is not a power of 2 that is >= 8, or if the
	/// modulus does not support the NTT for this specific size.
	pub fn new(p: &Modulus, size: usize) -> Option<Self> {
		if !supports_ntt(p.p, size) {
			return None;
		}

		let omega = Self::primitive_root(size, p)?;
		let omega_inv = p.inv(omega)?;

		let mut exp = 1u64;
		let mut exp_inv = 1u64;
		let mut powers = Vec::with_capacity(size + 1);
		let mut powers_inv = Vec::with_capacity(size + 1);
		for _ in 0..size + 1 {
			powers.push(exp);
			powers_inv.push(exp_inv);
			exp = p.mul(exp, omega);
			exp_inv = p.mul(exp_inv, omega_inv);
		}

		let mut omegas = Vec::with_capacity(size);
		let mut zetas_inv = Vec::with_capacity(size);
		for i in 0..size {
			let j = i.reverse_bits() >> (size.leading_zeros() + 1);
			omegas.push(powers[j]);
			zetas_inv.push(powers_inv[j + 1]);
		}

		let size_inv = p.inv(size as u64)?;

		let omegas_shoup = p.shoup_vec(&omegas);
		let zetas_inv_shoup = p.shoup_vec(&zetas_inv);

		Some(Self {
			p: p.clone(),
			p_twice: p.p * 2,
			size,
			omegas: omegas.into_boxed_slice(),
			omegas_shoup: omegas_shoup.into_boxed_slice(),
			zetas_inv: zetas_inv.into_boxed_slice(),
			zetas_inv_shoup: zetas_inv_shoup.into_boxed_slice(),
			size_inv,
			size_inv_shoup: p.shoup(size_inv),
		})
	}

	/// Returns the size of the transform.
	pub const fn size(&self) -> usize {
		self.size
	}

	/// Compute the forward NTT in place.
	/// Aborts if a is not of the size handled by the operator.
	pub fn forward(&self, a: &mut [u64]) {
		self.forward_lazy(a);
		a.iter_mut().for_each(|ai| *ai = self.reduce3(*ai));
	}

	/// Compute the forward NTT in place in a lazy fashion.
	/// This means that the output coefficients may be up to 4 times the
	/// modulus.
	///
	/// Aborts if a is not of the size handled by the operator.
	pub fn forward_lazy(&self, a: &mut [u64]) {
		assert_eq!(a.len(), self.size);

		let mut l = self.size >> 1;
		let mut m = 1;
		let mut k = 1;
		while l > 0 {
			for i in 0..m {
				let omega = self.omegas[k];
				let omega_shoup = self.omegas_shoup[k];
				k += 1;

				let s = 2 * i * l;
				let (x, y) = a[s..s + 2 * l].split_at_mut(l);
				x.iter_mut()
					.zip(y.iter_mut())
					.for_each(|(xj, yj)| self.butterfly(xj, yj, omega, omega_shoup));
			}
			l >>= 1;
			m <<= 1;
		}
	}

	/// Compute the backward NTT in place.
	/// Aborts if a is not of the size handled by the operator.
	pub fn backward(&self, a: &mut [u64]) {
		assert_eq!(a.len(), self.size);

		let mut k = 0;
		let mut m = self.size >> 1;
		let mut l = 1;
		while m > 0 {
			for i in 0..m {
				let zeta_inv = self.zetas_inv[k];
				let zeta_inv_shoup = self.zetas_inv_shoup[k];
				k += 1;

				let s = 2 * i * l;
				let (x, y) = a[s..s + 2 * l].split_at_mut(l);
				x.iter_mut()
					.zip(y.iter_mut())
					.for_each(|(xj, yj)| self.inv_butterfly(xj, yj, zeta_inv, zeta_inv_shoup));
			}
			l <<= 1;
			m >>= 1;
		}

		a.iter_mut()
			.for_each(|ai| *ai = self.p.mul_shoup(*ai, self.size_inv, self.size_inv_shoup));
	}

	/// Reduce a modulo p.
	///
	/// Aborts if a >= 4 * p.
	const fn reduce3(&self, a: u64) -> u64 {
		debug_assert!(a < 4 * self.p.p);

		let y = Modulus::reduce1(a, 2 * self.p.p);
		Modulus::reduce1(y, self.p.p)
	}

	/// NTT Butterfly.
	fn butterfly(&self, x: &mut u64, y: &mut u64, w: u64, w_shoup: u64) {
		debug_assert!(*x < 4 * self.p.p);
		debug_assert!(*y < 4 * self.p.p);
		debug_assert!(w < self.p.p);
		debug_assert_eq!(self.p.shoup(w), w_shoup);

		*x = Modulus::reduce1(*x, self.p_twice);
		let t = self.p.lazy_mul_shoup(*y, w, w_shoup);
		*y = *x + self.p_twice - t;
		*x += t;

		debug_assert!(*x < 4 * self.p.p);
		debug_assert!(*y < 4 * self.p.p);
	}

	/// Inverse NTT butterfly.
	fn inv_butterfly(&self, x: &mut u64, y: &mut u64, z: u64, z_shoup: u64) {
		debug_assert!(*x < self.p_twice);
		debug_assert!(*y < self.p_twice);
		debug_assert!(z < self.p.p);
		debug_assert_eq!(self.p.shoup(z), z_shoup);

		let t = *x;
		*x = Modulus::reduce1(*y + t, self.p_twice);
		*y = self.p.lazy_mul_shoup(self.p_twice + t - *y, z, z_shoup);

		debug_assert!(*x < self.p_twice);
		debug_assert!(*y < self.p_twice);
	}

	/// Returns a 2n-th primitive root modulo p, or None if none was found.
	fn primitive_root(n: usize, p: &Modulus) -> Option<u64> {
		let lambda = (p.p - 1) / (2 * n as u64);

		let mut rng = ChaCha8Rng::seed_from_u64(0);
		(0..100)
			.map(|_| p.pow(rng.gen_range(0..p.p), lambda))
			.find(|root| Self::is_primitive_root(*root, 2 * n, p))
	}

	/// Returns whether a is a n-th primitive root of unity, for n a power of
	/// two.
	fn is_primitive_root(a: u64, n: usize, p: &Modulus) -> bool {
		debug_assert!(a < p.p);

		// For n a power of two, x is a primitive n-th root of unity when
		// x^n = 1 and x^(n/2) != 1.
		(p.pow(a, n as u64) == 1) && (p.pow(a, (n / 2) as u64) != 1)
	}
}
