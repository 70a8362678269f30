#![warn(missing_docs, unused_imports)]

//! Traits associated with polynomials.

use super::{Context, Poly, Representation};
use crate::{rns::reduce_biguint, Error, Result};
use itertools::izip;
use ndarray::{Array2, Axis};
use num_bigint::BigUint;
use std::sync::Arc;

/// Conversions to create polynomials.
///
/// We unfortunately cannot use the `TryFrom` trait from std::convert because
/// we need to specify additional parameters, and if we try to redefine a
/// `TryFrom` trait here, we need to fully specify the trait when we use it
/// because of the blanket implementation <https://github.com/rust-lang/rust/issues/50133#issuecomment-488512355>.
pub trait TryConvertFrom<T>
where
	Self: Sized,
{
	/// Attempt to convert the `value` into a polynomial with a specific
	/// context and under a specific representation.
	fn try_convert_from(
		value: T,
		ctx: &Arc<Context>,
		representation: Representation,
	) -> Result<Self>;
}

/// Conversion from an array of rests, one row per modulus.
impl TryConvertFrom<Array2<u64>> for Poly {
	fn try_convert_from(
		mut value: Array2<u64>,
		ctx: &Arc<Context>,
		representation: Representation,
	) -> Result<Self> {
		if value.shape() != [ctx.q.len(), ctx.degree] {
			return Err(Error::Default(
				"The array of coefficient does not have the correct shape".to_string(),
			));
		}

		izip!(value.outer_iter_mut(), ctx.q.iter())
			.for_each(|(mut row, qi)| row.iter_mut().for_each(|c| *c = qi.reduce(*c)));
		Ok(Poly {
			ctx: ctx.clone(),
			representation,
			coefficients: value,
		})
	}
}

/// Conversion from a slice of `u64`, either of length `degree` (in which case
/// the values are reduced modulo every modulus), or of length `moduli.len() *
/// degree` (in which case the values are the rests, modulus after modulus).
impl<'a> TryConvertFrom<&'a [u64]> for Poly {
	fn try_convert_from(
		value: &'a [u64],
		ctx: &Arc<Context>,
		representation: Representation,
	) -> Result<Self> {
		let coefficients = if value.len() == ctx.degree {
			Array2::from_shape_fn((ctx.q.len(), ctx.degree), |(_, j)| value[j])
		} else if value.len() == ctx.q.len() * ctx.degree {
			Array2::from_shape_vec((ctx.q.len(), ctx.degree), value.to_vec())
				.map_err(|e| Error::Default(e.to_string()))?
		} else {
			return Err(Error::Default(
				"In PowerBasis representation, value must be of length degree or moduli.len() * degree".to_string(),
			));
		};
		Poly::try_convert_from(coefficients, ctx, representation)
	}
}

impl TryConvertFrom<Vec<u64>> for Poly {
	fn try_convert_from(
		value: Vec<u64>,
		ctx: &Arc<Context>,
		representation: Representation,
	) -> Result<Self> {
		Poly::try_convert_from(value.as_slice(), ctx, representation)
	}
}

/// Conversion from signed coefficients, of length `degree`.
impl<'a> TryConvertFrom<&'a [i64]> for Poly {
	fn try_convert_from(
		value: &'a [i64],
		ctx: &Arc<Context>,
		representation: Representation,
	) -> Result<Self> {
		let mut p = Poly::from_i64(ctx, value)?;
		// The values are interpreted in the requested representation.
		p.representation = representation;
		Ok(p)
	}
}

impl From<&Poly> for Vec<BigUint> {
	fn from(p: &Poly) -> Self {
		p.coefficients
			.axis_iter(Axis(1))
			.map(|rests| p.ctx.rns.lift(rests))
			.collect()
	}
}

/// Returns the rests of a BigUint modulo each modulus of a context, as a
/// constant polynomial in the given representation. Since a constant is
/// invariant by the NTT, the result is valid in both representations.
impl<'a> TryConvertFrom<&'a BigUint> for Poly {
	fn try_convert_from(
		value: &'a BigUint,
		ctx: &Arc<Context>,
		representation: Representation,
	) -> Result<Self> {
		let mut p = Poly::zero(ctx, representation);
		izip!(p.coefficients.outer_iter_mut(), ctx.moduli.iter()).for_each(|(mut row, qi)| {
			let c = reduce_biguint(value, *qi);
			match representation {
				Representation::PowerBasis => row[0] = c,
				Representation::Ntt => row.fill(c),
			}
		});
		Ok(p)
	}
}

#[cfg(test)]
mod tests {
	use super::TryConvertFrom;
	use crate::rq::{Context, Poly, Representation};
	use ndarray::Array2;
	use num_bigint::BigUint;
	use rand::thread_rng;
	use std::{error::Error, sync::Arc};

	const MODULI: &[u64; 3] = &[1153, 4611686018326724609, 4611686018309947393];

	#[test]
	fn from_u64() -> Result<(), Box<dyn Error>> {
		let ctx = Arc::new(Context::new(MODULI, 16)?);

		let values = (0..16u64).collect::<Vec<_>>();
		let p = Poly::try_convert_from(values.as_slice(), &ctx, Representation::PowerBasis)?;
		for row in p.coefficients().outer_iter() {
			assert_eq!(row.to_vec(), values);
		}

		let rests = (0..48u64).collect::<Vec<_>>();
		let p = Poly::try_convert_from(rests.clone(), &ctx, Representation::Ntt)?;
		assert_eq!(p.representation(), &Representation::Ntt);
		assert_eq!(p.coefficients().iter().copied().collect::<Vec<_>>(), rests);

		// Values are reduced.
		let p = Poly::try_convert_from(vec![1153u64; 16], &ctx, Representation::PowerBasis)?;
		assert!(p.coefficients().row(0).iter().all(|c| *c == 0));
		assert!(p.coefficients().row(1).iter().all(|c| *c == 1153));

		assert!(Poly::try_convert_from(vec![0u64; 15], &ctx, Representation::PowerBasis).is_err());
		assert!(Poly::try_convert_from(Array2::<u64>::zeros((2, 16)), &ctx, Representation::Ntt).is_err());
		Ok(())
	}

	#[test]
	fn from_i64_and_biguint() -> Result<(), Box<dyn Error>> {
		let mut rng = thread_rng();
		let ctx = Arc::new(Context::new(MODULI, 16)?);

		let values = (0..16).map(|i| -(i as i64)).collect::<Vec<_>>();
		let p = Poly::try_convert_from(values.as_slice(), &ctx, Representation::PowerBasis)?;
		assert_eq!(p, Poly::from_i64(&ctx, &values)?);

		let lifted: Vec<BigUint> = (&p).into();
		assert_eq!(lifted[0], BigUint::from(0u64));
		assert_eq!(lifted[1], ctx.modulus() - 1u64);

		// A constant multiplies as a scalar in both representations.
		let c = BigUint::from(12345u64);
		for representation in [Representation::PowerBasis, Representation::Ntt] {
			let mut cst = Poly::try_convert_from(&c, &ctx, representation)?;
			let mut q = Poly::random(&ctx, representation, &mut rng);
			let expected = &q * &c;
			cst.change_representation(Representation::Ntt);
			q.change_representation(Representation::Ntt);
			let mut r = &q * &cst;
			r.change_representation(representation);
			assert_eq!(r, expected);
		}
		Ok(())
	}
}
