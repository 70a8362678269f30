//! Create parameters for the BFV encryption scheme

use crate::{Error, ParametersError, Result};
use fhe_math::{
	rns::ScalingFactor,
	rq::{Context, Poly, Representation, Scaler},
	zq::{primes::generate_prime, Modulus},
};
use fhe_util::{is_prime, sample_vec_cbd};
use num_bigint::BigUint;
use num_traits::One;
use rand::{seq::index::sample, CryptoRng, Rng, RngCore};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};
use tracing::debug;

/// Smallest supported polynomial degree.
const MIN_DEGREE: usize = 8;

/// Largest supported polynomial degree.
const MAX_DEGREE: usize = 1 << 17;

/// Distribution of the coefficients of the secret keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretDistribution {
	/// Coefficients sampled uniformly in {-1, 0, 1}.
	#[default]
	Ternary,
	/// Exactly `hamming_weight` non-zero coefficients, sampled uniformly in
	/// {-1, 1}.
	SparseTernary {
		/// Number of non-zero coefficients.
		hamming_weight: usize,
	},
}

impl SecretDistribution {
	fn validate(&self, degree: usize) -> std::result::Result<(), ParametersError> {
		match self {
			Self::Ternary => Ok(()),
			Self::SparseTernary { hamming_weight } => {
				if *hamming_weight == 0 || *hamming_weight > degree {
					Err(ParametersError::InvalidDistribution(format!(
						"The hamming weight {hamming_weight} should be between 1 and {degree}"
					)))
				} else {
					Ok(())
				}
			}
		}
	}

	/// Sample `degree` coefficients.
	pub(crate) fn sample<R: RngCore + CryptoRng>(&self, degree: usize, rng: &mut R) -> Vec<i64> {
		match self {
			Self::Ternary => (0..degree).map(|_| rng.gen_range(-1..=1)).collect(),
			Self::SparseTernary { hamming_weight } => {
				let mut s = vec![0i64; degree];
				for i in sample(rng, degree, *hamming_weight) {
					s[i] = if rng.gen::<bool>() { 1 } else { -1 };
				}
				s
			}
		}
	}
}

/// Distribution of the coefficients of the encryption errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ErrorDistribution {
	/// Centered binomial distribution of the given variance.
	CenteredBinomial {
		/// The variance, between 1 and 16.
		variance: usize,
	},
	/// Rounded Gaussian of standard deviation `sigma`, where samples larger
	/// than `bound` in absolute value are rejected.
	DiscreteGaussian {
		/// The standard deviation.
		sigma: f64,
		/// The rejection bound.
		bound: f64,
	},
}

impl Default for ErrorDistribution {
	fn default() -> Self {
		Self::CenteredBinomial { variance: 10 }
	}
}

impl ErrorDistribution {
	fn validate(&self) -> std::result::Result<(), ParametersError> {
		match self {
			Self::CenteredBinomial { variance } if !(1..=16).contains(variance) => {
				Err(ParametersError::InvalidDistribution(format!(
					"The variance {variance} should be between 1 and 16"
				)))
			}
			Self::DiscreteGaussian { sigma, bound }
				if !sigma.is_finite() || !bound.is_finite() || *sigma <= 0.0 || bound < sigma =>
			{
				Err(ParametersError::InvalidDistribution(format!(
					"The standard deviation {sigma} should be positive and at most the bound {bound}"
				)))
			}
			_ => Ok(()),
		}
	}

	/// Sample `degree` coefficients.
	pub(crate) fn sample<R: RngCore + CryptoRng>(
		&self,
		degree: usize,
		rng: &mut R,
	) -> Result<Vec<i64>> {
		match self {
			Self::CenteredBinomial { variance } => sample_vec_cbd(degree, *variance, rng)
				.map_err(|e| Error::DefaultError(e.to_string())),
			Self::DiscreteGaussian { sigma, bound } => {
				let normal =
					Normal::new(0.0, *sigma).map_err(|e| Error::DefaultError(e.to_string()))?;
				Ok((0..degree)
					.map(|_| loop {
						let x = normal.sample(rng).round();
						if x.abs() <= *bound {
							break x as i64;
						}
					})
					.collect())
			}
		}
	}
}

/// Parameters for the BFV encryption scheme.
///
/// Level `l` uses the first `l + 1` ciphertext moduli; the maximum level uses
/// all of them. Key switching uses the special moduli on top of the
/// ciphertext moduli, and ciphertext multiplication uses an auxiliary basis
/// that is derived from the ciphertext moduli.
pub struct BfvParameters {
	/// Number of coefficients in a polynomial.
	polynomial_degree: usize,

	/// Modulus of the plaintext.
	plaintext_modulus: u64,

	/// Vector of coprime moduli q_i for the ciphertext.
	moduli: Box<[u64]>,

	/// Vector of the sized of the coprime moduli q_i for the ciphertext.
	moduli_sizes: Box<[usize]>,

	/// Special moduli used during key switching.
	special_moduli: Box<[u64]>,

	/// Auxiliary moduli used during the multiplication.
	aux_moduli: Box<[u64]>,

	secret_distribution: SecretDistribution,
	error_distribution: ErrorDistribution,

	pub(crate) plaintext: Modulus,
	pub(crate) ctx_t: Arc<Context>,
	pub(crate) ctx: Vec<Arc<Context>>,
	pub(crate) ctx_qp: Vec<Arc<Context>>,
	pub(crate) special_modulus: BigUint,
	pub(crate) delta: Vec<BigUint>,
	pub(crate) decode_scalers: Vec<Scaler>,
	pub(crate) lift_scalers: Vec<Scaler>,
	pub(crate) extenders: Vec<Scaler>,
	pub(crate) mul_scalers: Vec<Scaler>,
	pub(crate) mod_down: Vec<Scaler>,
	pub(crate) level_down: Vec<Scaler>,
	pub(crate) matrix_reps_index_map: Box<[usize]>,
}

impl Debug for BfvParameters {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BfvParameters")
			.field("polynomial_degree", &self.polynomial_degree)
			.field("plaintext_modulus", &self.plaintext_modulus)
			.field("moduli", &self.moduli)
			.field("special_moduli", &self.special_moduli)
			.field("secret_distribution", &self.secret_distribution)
			.field("error_distribution", &self.error_distribution)
			.finish()
	}
}

impl PartialEq for BfvParameters {
	fn eq(&self, other: &Self) -> bool {
		self.polynomial_degree == other.polynomial_degree
			&& self.plaintext_modulus == other.plaintext_modulus
			&& self.moduli == other.moduli
			&& self.special_moduli == other.special_moduli
			&& self.secret_distribution == other.secret_distribution
			&& self.error_distribution == other.error_distribution
	}
}

// The distribution parameters are validated to be finite.
impl Eq for BfvParameters {}

impl BfvParameters {
	/// Returns the underlying polynomial degree
	pub const fn degree(&self) -> usize {
		self.polynomial_degree
	}

	/// Returns a reference to the ciphertext moduli
	pub fn moduli(&self) -> &[u64] {
		&self.moduli
	}

	/// Returns a reference to the ciphertext moduli sizes
	pub fn moduli_sizes(&self) -> &[usize] {
		&self.moduli_sizes
	}

	/// Returns a reference to the special moduli used for key switching
	pub fn special_moduli(&self) -> &[u64] {
		&self.special_moduli
	}

	/// Returns a reference to the auxiliary moduli used for the tensor product
	pub fn aux_moduli(&self) -> &[u64] {
		&self.aux_moduli
	}

	/// Returns the plaintext modulus
	pub const fn plaintext(&self) -> u64 {
		self.plaintext_modulus
	}

	/// Returns the maximum level allowed by these parameters.
	pub fn max_level(&self) -> usize {
		self.moduli.len() - 1
	}

	/// Returns the distribution of the secret keys.
	pub const fn secret_distribution(&self) -> &SecretDistribution {
		&self.secret_distribution
	}

	/// Returns the distribution of the encryption errors.
	pub const fn error_distribution(&self) -> &ErrorDistribution {
		&self.error_distribution
	}

	/// Returns the context corresponding to the level.
	pub fn ctx_at_level(&self, level: usize) -> Result<&Arc<Context>> {
		self.check_level(level)?;
		Ok(&self.ctx[level])
	}

	/// Returns the galois element to rotate the columns by `k` positions to
	/// the left, which is `3^k mod 2N`. Negative values of `k` rotate to the
	/// right.
	pub fn galois_element_for_column_rotation(&self, k: i64) -> usize {
		let row_size = (self.polynomial_degree >> 1) as i64;
		let m = 2 * self.polynomial_degree;
		(0..k.rem_euclid(row_size)).fold(1usize, |g, _| (3 * g) % m)
	}

	/// Returns the galois element that swaps the two rows of the plaintext
	/// matrix.
	pub const fn galois_element_for_row_rotation(&self) -> usize {
		2 * self.polynomial_degree - 1
	}

	/// Generate default parameters with `num_moduli` moduli of 62 bits,
	/// a plaintext modulus 65537, and a single special modulus.
	pub fn default_arc(num_moduli: usize, degree: usize) -> Result<Arc<Self>> {
		BfvParametersBuilder::new()
			.set_degree(degree)
			.set_plaintext_modulus(65537)
			.set_moduli_sizes(&vec![62usize; num_moduli])
			.build_arc()
	}

	pub(crate) fn check_level(&self, level: usize) -> Result<()> {
		if level > self.max_level() {
			Err(Error::InvalidLevel {
				level,
				min_level: 0,
				max_level: self.max_level(),
			})
		} else {
			Ok(())
		}
	}

	/// Sample an error polynomial in Ntt representation.
	pub(crate) fn sample_error<R: RngCore + CryptoRng>(
		&self,
		ctx: &Arc<Context>,
		rng: &mut R,
	) -> Result<Poly> {
		let e = self.error_distribution.sample(self.polynomial_degree, rng)?;
		let mut p = Poly::from_i64(ctx, &e)?;
		p.change_representation(Representation::Ntt);
		Ok(p)
	}

	#[allow(clippy::too_many_arguments)]
	fn new_from_moduli(
		polynomial_degree: usize,
		plaintext_modulus: u64,
		moduli: Vec<u64>,
		special_moduli: Vec<u64>,
		aux_moduli: Vec<u64>,
		secret_distribution: SecretDistribution,
		error_distribution: ErrorDistribution,
	) -> Result<Self> {
		let plaintext = Modulus::new(plaintext_modulus)?;
		let ctx_t = Context::new_arc(&[plaintext_modulus], polynomial_degree)?;
		let special_modulus = special_moduli
			.iter()
			.fold(BigUint::one(), |acc, pi| acc * *pi);
		let t = BigUint::from(plaintext_modulus);

		let mut ctx: Vec<Arc<Context>> = Vec::with_capacity(moduli.len());
		let mut ctx_qp = Vec::with_capacity(moduli.len());
		let mut delta = Vec::with_capacity(moduli.len());
		let mut decode_scalers = Vec::with_capacity(moduli.len());
		let mut lift_scalers = Vec::with_capacity(moduli.len());
		let mut extenders = Vec::with_capacity(moduli.len());
		let mut mul_scalers = Vec::with_capacity(moduli.len());
		let mut mod_down = Vec::with_capacity(moduli.len());
		let mut level_down = Vec::with_capacity(moduli.len());
		for level in 0..moduli.len() {
			let q = &moduli[..=level];
			let ctx_level = Context::new_arc(q, polynomial_degree)?;
			let ctx_qp_level = Context::new_arc(&[q, &special_moduli].concat(), polynomial_degree)?;
			let ctx_ext_level = Context::new_arc(&[q, &aux_moduli].concat(), polynomial_degree)?;

			let t_over_q = ScalingFactor::new(&t, ctx_level.modulus());
			delta.push(ctx_level.modulus() / plaintext_modulus);
			decode_scalers.push(Scaler::new(&ctx_level, &ctx_t, t_over_q.clone())?);
			lift_scalers.push(Scaler::new(&ctx_level, &ctx_t, ScalingFactor::one())?);
			extenders.push(Scaler::new(
				&ctx_level,
				&ctx_ext_level,
				ScalingFactor::one(),
			)?);
			mul_scalers.push(Scaler::new(&ctx_ext_level, &ctx_level, t_over_q)?);
			mod_down.push(Scaler::new(
				&ctx_qp_level,
				&ctx_level,
				ScalingFactor::new(&BigUint::one(), &special_modulus),
			)?);
			if level > 0 {
				level_down.push(Scaler::new(
					&ctx_level,
					&ctx[level - 1],
					ScalingFactor::new(&BigUint::one(), &BigUint::from(moduli[level])),
				)?);
			}

			ctx.push(ctx_level);
			ctx_qp.push(ctx_qp_level);
		}

		// Compute the permutation between the slots and the NTT evaluations
		// modulo the plaintext modulus.
		let row_size = polynomial_degree >> 1;
		let m = polynomial_degree << 1;
		let gen = 3;
		let mut pos = 1;
		let mut matrix_reps_index_map = vec![0usize; polynomial_degree];
		for i in 0..row_size {
			let index1 = (pos - 1) >> 1;
			let index2 = (m - pos - 1) >> 1;
			matrix_reps_index_map[i] = index1.reverse_bits() >> (polynomial_degree.leading_zeros() + 1);
			matrix_reps_index_map[row_size | i] =
				index2.reverse_bits() >> (polynomial_degree.leading_zeros() + 1);
			pos *= gen;
			pos &= m - 1;
		}

		let moduli_sizes = moduli
			.iter()
			.map(|qi| 64 - qi.leading_zeros() as usize)
			.collect::<Vec<_>>();

		debug!(
			degree = polynomial_degree,
			plaintext = plaintext_modulus,
			moduli = ?moduli,
			special_moduli = ?special_moduli,
			aux_moduli = ?aux_moduli,
			"created BFV parameters"
		);

		Ok(Self {
			polynomial_degree,
			plaintext_modulus,
			moduli: moduli.into_boxed_slice(),
			moduli_sizes: moduli_sizes.into_boxed_slice(),
			special_moduli: special_moduli.into_boxed_slice(),
			aux_moduli: aux_moduli.into_boxed_slice(),
			secret_distribution,
			error_distribution,
			plaintext,
			ctx_t,
			ctx,
			ctx_qp,
			special_modulus,
			delta,
			decode_scalers,
			lift_scalers,
			extenders,
			mul_scalers,
			mod_down,
			level_down,
			matrix_reps_index_map: matrix_reps_index_map.into_boxed_slice(),
		})
	}
}

/// Builder for parameters for the Bfv encryption scheme.
#[derive(Debug, Default, Clone)]
pub struct BfvParametersBuilder {
	degree: usize,
	plaintext: u64,
	ciphertext_moduli: Vec<u64>,
	ciphertext_moduli_sizes: Vec<usize>,
	special_moduli: Vec<u64>,
	special_moduli_sizes: Vec<usize>,
	secret_distribution: SecretDistribution,
	error_distribution: ErrorDistribution,
}

impl BfvParametersBuilder {
	/// Creates a new instance of the builder
	#[allow(clippy::new_without_default)]
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the polynomial degree. Returns an error if the degree is not
	/// a power of two between 8 and 2^17.
	pub fn set_degree(&mut self, degree: usize) -> &mut Self {
		self.degree = degree;
		self
	}

	/// Sets the plaintext modulus. It must be a prime congruent to 1 modulo
	/// twice the degree, so that the plaintext slots are available.
	pub fn set_plaintext_modulus(&mut self, plaintext: u64) -> &mut Self {
		self.plaintext = plaintext;
		self
	}

	/// Sets the sizes of the ciphertext moduli.
	/// Only one of `set_moduli_sizes` and `set_moduli`
	/// can be specified.
	pub fn set_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
		sizes.clone_into(&mut self.ciphertext_moduli_sizes);
		self
	}

	/// Sets the ciphertext moduli to use.
	/// Only one of `set_moduli_sizes` and `set_moduli`
	/// can be specified.
	pub fn set_moduli(&mut self, moduli: &[u64]) -> &mut Self {
		moduli.clone_into(&mut self.ciphertext_moduli);
		self
	}

	/// Sets the sizes of the special moduli used during key switching.
	/// When neither the special moduli nor their sizes are set, a single
	/// special modulus of 62 bits is used.
	pub fn set_special_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
		sizes.clone_into(&mut self.special_moduli_sizes);
		self
	}

	/// Sets the special moduli used during key switching.
	pub fn set_special_moduli(&mut self, moduli: &[u64]) -> &mut Self {
		moduli.clone_into(&mut self.special_moduli);
		self
	}

	/// Sets the distribution of the secret keys.
	pub fn set_secret_distribution(&mut self, distribution: SecretDistribution) -> &mut Self {
		self.secret_distribution = distribution;
		self
	}

	/// Sets the distribution of the encryption errors.
	pub fn set_error_distribution(&mut self, distribution: ErrorDistribution) -> &mut Self {
		self.error_distribution = distribution;
		self
	}

	/// Generate a new prime of `size` bits supporting the NTT, that is not
	/// already used.
	fn generate_modulus(
		size: usize,
		degree: usize,
		plaintext: u64,
		used: &mut Vec<u64>,
	) -> std::result::Result<u64, ParametersError> {
		if !(10..=62).contains(&size) {
			return Err(ParametersError::InvalidModulusSize(size, 10, 62));
		}

		let mut upper_bound = 1u64 << size;
		loop {
			let p = generate_prime(size, 2 * degree as u64, upper_bound)
				.ok_or(ParametersError::NotEnoughPrimes(size, degree))?;
			if p <= plaintext {
				return Err(ParametersError::InvalidModuli(format!(
					"The modulus size {size} is too small for the plaintext modulus {plaintext}"
				)));
			}
			if !used.contains(&p) {
				used.push(p);
				return Ok(p);
			}
			upper_bound = p;
		}
	}

	/// Select moduli either from the explicit list or from the sizes.
	fn select_moduli(
		moduli: &[u64],
		sizes: &[usize],
		degree: usize,
		plaintext: u64,
		used: &mut Vec<u64>,
	) -> std::result::Result<Vec<u64>, ParametersError> {
		match (moduli.is_empty(), sizes.is_empty()) {
			(false, false) => Err(ParametersError::TooManySpecified(
				"Only one of moduli and moduli sizes can be specified".to_string(),
			)),
			(true, true) => Err(ParametersError::TooFewSpecified(
				"One of moduli and moduli sizes must be specified".to_string(),
			)),
			(false, true) => {
				for qi in moduli {
					if (qi >> 62) != 0 || !is_prime(*qi) || qi % (2 * degree as u64) != 1 {
						return Err(ParametersError::InvalidModuli(format!(
							"The modulus {qi} should be a prime of at most 62 bits congruent to 1 modulo {}",
							2 * degree
						)));
					}
					if *qi <= plaintext {
						return Err(ParametersError::InvalidModuli(format!(
							"The modulus {qi} should be larger than the plaintext modulus {plaintext}"
						)));
					}
					if used.contains(qi) {
						return Err(ParametersError::InvalidModuli(format!(
							"The modulus {qi} is used more than once"
						)));
					}
					used.push(*qi);
				}
				Ok(moduli.to_vec())
			}
			(true, false) => sizes
				.iter()
				.map(|size| Self::generate_modulus(*size, degree, plaintext, used))
				.collect(),
		}
	}

	/// Build a new `BfvParameters` inside an `Arc`.
	pub fn build_arc(&self) -> Result<Arc<BfvParameters>> {
		self.build().map(Arc::new)
	}

	/// Build a new `BfvParameters`.
	pub fn build(&self) -> Result<BfvParameters> {
		let degree = self.degree;
		if !(MIN_DEGREE..=MAX_DEGREE).contains(&degree) || !degree.is_power_of_two() {
			return Err(ParametersError::InvalidDegree(degree).into());
		}
		let cyclotomic_order = (degree as u64)
			.checked_mul(2)
			.ok_or(ParametersError::InvalidDegree(degree))?;

		let plaintext = self.plaintext;
		if (plaintext >> 62) != 0 || !is_prime(plaintext) || plaintext % cyclotomic_order != 1 {
			return Err(ParametersError::InvalidPlaintext(format!(
				"The plaintext modulus {plaintext} should be a prime congruent to 1 modulo {cyclotomic_order}"
			))
			.into());
		}

		self.secret_distribution.validate(degree)?;
		self.error_distribution.validate()?;

		let mut used = vec![plaintext];
		let moduli = Self::select_moduli(
			&self.ciphertext_moduli,
			&self.ciphertext_moduli_sizes,
			degree,
			plaintext,
			&mut used,
		)?;
		let special_moduli =
			if self.special_moduli.is_empty() && self.special_moduli_sizes.is_empty() {
				Self::select_moduli(&[], &[62], degree, plaintext, &mut used)?
			} else {
				Self::select_moduli(
					&self.special_moduli,
					&self.special_moduli_sizes,
					degree,
					plaintext,
					&mut used,
				)?
			};

		// The auxiliary basis must hold the exact tensor product of two
		// ciphertexts at the maximum level.
		let moduli_bits = moduli
			.iter()
			.map(|qi| 64 - qi.leading_zeros() as usize)
			.sum::<usize>();
		let needed_bits = moduli_bits + degree.trailing_zeros() as usize + 4;
		let aux_sizes = vec![62usize; (needed_bits + 60) / 61];
		let aux_moduli = Self::select_moduli(&[], &aux_sizes, degree, plaintext, &mut used)?;

		BfvParameters::new_from_moduli(
			degree,
			plaintext,
			moduli,
			special_moduli,
			aux_moduli,
			self.secret_distribution,
			self.error_distribution,
		)
	}
}

/// Configuration record for the BFV parameters.
///
/// Exactly one of `moduli` and `moduli_sizes` must be provided, and at most
/// one of `special_moduli` and `special_moduli_sizes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BfvParametersLiteral {
	/// The polynomial degree.
	pub degree: usize,
	/// The plaintext modulus.
	pub plaintext_modulus: u64,
	/// The ciphertext moduli.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub moduli: Option<Vec<u64>>,
	/// The sizes of the ciphertext moduli.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub moduli_sizes: Option<Vec<usize>>,
	/// The special moduli used for key switching.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub special_moduli: Option<Vec<u64>>,
	/// The sizes of the special moduli used for key switching.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub special_moduli_sizes: Option<Vec<usize>>,
	/// The secret key distribution.
	#[serde(default)]
	pub secret_distribution: SecretDistribution,
	/// The error distribution.
	#[serde(default)]
	pub error_distribution: ErrorDistribution,
}

impl TryFrom<&BfvParametersLiteral> for BfvParameters {
	type Error = Error;

	fn try_from(literal: &BfvParametersLiteral) -> Result<Self> {
		BfvParametersBuilder::new()
			.set_degree(literal.degree)
			.set_plaintext_modulus(literal.plaintext_modulus)
			.set_moduli(literal.moduli.as_deref().unwrap_or_default())
			.set_moduli_sizes(literal.moduli_sizes.as_deref().unwrap_or_default())
			.set_special_moduli(literal.special_moduli.as_deref().unwrap_or_default())
			.set_special_moduli_sizes(literal.special_moduli_sizes.as_deref().unwrap_or_default())
			.set_secret_distribution(literal.secret_distribution)
			.set_error_distribution(literal.error_distribution)
			.build()
	}
}

impl From<&BfvParameters> for BfvParametersLiteral {
	fn from(par: &BfvParameters) -> Self {
		Self {
			degree: par.polynomial_degree,
			plaintext_modulus: par.plaintext_modulus,
			moduli: Some(par.moduli.to_vec()),
			moduli_sizes: None,
			special_moduli: Some(par.special_moduli.to_vec()),
			special_moduli_sizes: None,
			secret_distribution: par.secret_distribution,
			error_distribution: par.error_distribution,
		}
	}
}
