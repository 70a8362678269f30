#![warn(missing_docs, unused_imports)]

//! RNS scaler inspired from Remark 3.2 of <https://eprint.iacr.org/2021/204.pdf>.

use super::{reduce_biguint, RnsContext};
use ndarray::{ArrayView1, ArrayViewMut1};
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use std::sync::Arc;

/// Scaling factor when performing a RNS scaling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingFactor {
	numerator: BigUint,
	denominator: BigUint,
	pub(crate) is_one: bool,
}

impl ScalingFactor {
	/// Create a new scaling factor. The fraction is reduced.
	///
	/// Aborts if the denominator is 0.
	pub fn new(numerator: &BigUint, denominator: &BigUint) -> Self {
		assert!(!denominator.is_zero(), "The denominator must be non-zero");

		let gcd = numerator.gcd(denominator);
		let numerator = numerator / &gcd;
		let denominator = denominator / &gcd;
		let is_one = numerator == denominator;
		Self {
			numerator,
			denominator,
			is_one,
		}
	}

	/// Returns the identity element of `Self`.
	pub fn one() -> Self {
		Self {
			numerator: BigUint::one(),
			denominator: BigUint::one(),
			is_one: true,
		}
	}

	/// Returns the numerator of the (reduced) scaling factor.
	pub const fn numerator(&self) -> &BigUint {
		&self.numerator
	}

	/// Returns the denominator of the (reduced) scaling factor.
	pub const fn denominator(&self) -> &BigUint {
		&self.denominator
	}
}

/// Scaler in RNS basis.
///
/// The scaler maps the rests of `x` in a source basis of modulus `Q` to the
/// rests of `round(x * numerator / denominator)` in a target basis, where `x`
/// is taken as the representative of the class in `[-Q/2, Q/2)`. The
/// computation is exact, and rounds half-way values towards positive
/// infinity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RnsScaler {
	from: Arc<RnsContext>,
	to: Arc<RnsContext>,
	factor: ScalingFactor,

	from_modulus: BigInt,
	from_half_modulus: BigUint,
	numerator_twice: BigInt,
	denominator_twice: BigInt,
	denominator: BigInt,
}

impl RnsScaler {
	/// Create a RNS scaler by numerator / denominator.
	pub fn new(from: &Arc<RnsContext>, to: &Arc<RnsContext>, factor: ScalingFactor) -> Self {
		let from_modulus = BigInt::from_biguint(Sign::Plus, from.modulus().clone());
		let from_half_modulus = from.modulus() >> 1usize;
		let numerator_twice = BigInt::from_biguint(Sign::Plus, factor.numerator() << 1usize);
		let denominator_twice = BigInt::from_biguint(Sign::Plus, factor.denominator() << 1usize);
		let denominator = BigInt::from_biguint(Sign::Plus, factor.denominator().clone());

		Self {
			from: from.clone(),
			to: to.clone(),
			factor,
			from_modulus,
			from_half_modulus,
			numerator_twice,
			denominator_twice,
			denominator,
		}
	}

	/// Returns the scaling factor.
	pub const fn factor(&self) -> &ScalingFactor {
		&self.factor
	}

	/// Returns the source RNS context.
	pub const fn from(&self) -> &Arc<RnsContext> {
		&self.from
	}

	/// Returns the target RNS context.
	pub const fn to(&self) -> &Arc<RnsContext> {
		&self.to
	}

	/// Output the RNS representation of the rests scaled by numerator /
	/// denominator, rounded to the nearest integer.
	///
	/// Aborts if the number of rests is different than the number of moduli
	/// of the source context, or if the output length is different than the
	/// number of moduli of the target context.
	pub fn scale(&self, rests: ArrayView1<u64>, mut out: ArrayViewMut1<u64>) {
		assert_eq!(rests.len(), self.from.moduli().len());
		assert_eq!(out.len(), self.to.moduli().len());

		let y = self.scale_to_bigint(rests);

		let (sign, magnitude) = (y.sign(), y.magnitude());
		out.iter_mut()
			.zip(self.to.moduli())
			.for_each(|(oi, qi)| {
				let r = reduce_biguint(magnitude, *qi);
				*oi = if sign == Sign::Minus && r != 0 {
					qi - r
				} else {
					r
				}
			});
	}

	/// Output the RNS representation of the rests scaled by numerator /
	/// denominator, rounded to the nearest integer, as a vector.
	pub fn scale_new(&self, rests: ArrayView1<u64>) -> Vec<u64> {
		let mut out = vec![0u64; self.to.moduli().len()];
		self.scale(rests, ArrayViewMut1::from(&mut out));
		out
	}

	/// Returns the rounded scaled value of the rests, as a signed integer.
	pub fn scale_to_bigint(&self, rests: ArrayView1<u64>) -> BigInt {
		let x = self.from.lift(rests);
		let x = if x > self.from_half_modulus {
			BigInt::from_biguint(Sign::Plus, x) - &self.from_modulus
		} else {
			BigInt::from_biguint(Sign::Plus, x)
		};
		if self.factor.is_one {
			x
		} else {
			(x * &self.numerator_twice + &self.denominator).div_floor(&self.denominator_twice)
		}
	}

	/// Returns whether the scaled value of the rests is negative.
	pub fn is_negative(&self, rests: ArrayView1<u64>) -> bool {
		self.scale_to_bigint(rests).is_negative()
	}
}

#[cfg(test)]
mod tests {
	use super::{RnsScaler, ScalingFactor};
	use crate::rns::RnsContext;
	use ndarray::ArrayView1;
	use num_bigint::{BigInt, BigUint};
	use num_traits::{One, ToPrimitive, Zero};
	use proptest::prelude::*;
	use std::sync::Arc;

	#[test]
	fn scaling_factor() {
		let f = ScalingFactor::new(&BigUint::from(6u64), &BigUint::from(4u64));
		assert_eq!(f.numerator(), &BigUint::from(3u64));
		assert_eq!(f.denominator(), &BigUint::from(2u64));
		assert!(!f.is_one);

		let f = ScalingFactor::new(&BigUint::from(5u64), &BigUint::from(5u64));
		assert_eq!(f, ScalingFactor::one());

		let f = ScalingFactor::new(&BigUint::zero(), &BigUint::from(5u64));
		assert_eq!(f.numerator(), &BigUint::zero());
		assert_eq!(f.denominator(), &BigUint::one());
	}

	#[test]
	#[should_panic]
	fn scaling_factor_zero_denominator() {
		ScalingFactor::new(&BigUint::one(), &BigUint::zero());
	}

	#[test]
	fn rounding() {
		let from = Arc::new(RnsContext::new(&[1153, 4611686018326724609]).unwrap());
		let to = Arc::new(RnsContext::new(&[1153]).unwrap());

		// Scaling by 1/2 rounds half-way values up.
		let scaler = RnsScaler::new(
			&from,
			&to,
			ScalingFactor::new(&BigUint::one(), &BigUint::from(2u64)),
		);
		for (x, expected) in [(5i64, 3i64), (4, 2), (-5, -2), (-4, -2), (-1, 0), (1, 1)] {
			let rests = from.moduli().iter().map(|qi| (x as i128).rem_euclid(*qi as i128) as u64).collect::<Vec<_>>();
			assert_eq!(scaler.scale_to_bigint(ArrayView1::from(&rests)), BigInt::from(expected));
			let out = scaler.scale_new(ArrayView1::from(&rests));
			assert_eq!(out[0], (expected as i128).rem_euclid(1153) as u64);
			assert_eq!(scaler.is_negative(ArrayView1::from(&rests)), expected < 0);
		}
	}

	proptest! {
		#[test]
		fn scale(x: u64, numerator in 1u64..1 << 20, denominator in 1u64..1 << 20) {
			let from = Arc::new(RnsContext::new(&[1153, 4611686018326724609]).unwrap());
			let to = Arc::new(RnsContext::new(&[4611686018326724609, 17, 1153]).unwrap());
			let factor = ScalingFactor::new(&BigUint::from(numerator), &BigUint::from(denominator));
			let scaler = RnsScaler::new(&from, &to, factor);

			// Values of 62 bits are well within [-Q/2, Q/2).
			let x = (x >> 2) as i128 - (1i128 << 61);
			let rests = from.moduli().iter().map(|qi| x.rem_euclid(*qi as i128) as u64).collect::<Vec<_>>();

			let expected = (2 * x * numerator as i128 + denominator as i128).div_euclid(2 * denominator as i128);
			let out = scaler.scale_new(ArrayView1::from(&rests));
			for (oi, qi) in out.iter().zip(to.moduli()) {
				prop_assert_eq!(*oi, expected.rem_euclid(*qi as i128) as u64);
			}
			prop_assert_eq!(scaler.scale_to_bigint(ArrayView1::from(&rests)).to_i128().unwrap(), expected);
		}
	}
}
