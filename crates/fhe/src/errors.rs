use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
	/// Indicates that an operation received a plaintext of the wrong encoding,
	/// or an output buffer of the wrong size.
	#[error("Encoding mismatch: found {0}, expected {1}")]
	EncodingMismatch(String, String),

	/// Indicates that a key of an unsupported kind was provided.
	#[error("Key type mismatch: found {0}, expected {1}")]
	KeyTypeMismatch(String, String),

	/// Indicates that an operation requires a key that is not available.
	#[error("Missing key: {0}")]
	MissingKey(String),

	/// Indicates that a ciphertext does not have the expected degree.
	#[error("Degree mismatch: found {0}, expected {1}")]
	DegreeMismatch(usize, usize),

	/// Indicates that elements were created under different parameters.
	#[error("Parameters mismatch")]
	ParametersMismatch,

	/// Indicates that too many values were provided.
	#[error("Too many values provided: {0} exceeds limit {1}")]
	TooManyValues(usize, usize),

	/// Indicates that the level is out of range.
	#[error("Invalid level: {level} is not between {min_level} and {max_level}")]
	InvalidLevel {
		/// The requested level.
		level: usize,
		/// The smallest valid level.
		min_level: usize,
		/// The largest valid level.
		max_level: usize,
	},

	/// Indicates a misconfigured random source.
	#[error("Invalid random source: {0}")]
	InvalidPrng(String),

	/// Indicates an error from the underlying mathematical library.
	#[error("{0}")]
	MathError(#[from] fhe_math::Error),

	/// Indicates an error in the parameters.
	#[error("{0}")]
	ParametersError(#[from] ParametersError),

	/// Indicates a default error
	#[error("{0}")]
	DefaultError(String),
}

/// Separate enum to indicate parameters-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParametersError {
	/// Indicates that the degree is invalid.
	#[error("Invalid degree: {0} is not a power of 2 between 8 and 131072")]
	InvalidDegree(usize),

	/// Indicates that the moduli sizes are invalid.
	#[error("Invalid modulus size: {0}, expected an integer between {1} and {2}")]
	InvalidModulusSize(usize, usize, usize),

	/// Indicates that there exists not enough primes.
	#[error("Not enough primes of size {0} for polynomials of degree {1}")]
	NotEnoughPrimes(usize, usize),

	/// Indicates that the plaintext is invalid.
	#[error("{0}")]
	InvalidPlaintext(String),

	/// Indicates that a ciphertext or special modulus is invalid.
	#[error("{0}")]
	InvalidModuli(String),

	/// Indicates that a key or error distribution is invalid.
	#[error("{0}")]
	InvalidDistribution(String),

	/// Indicates that too many parameters were specified.
	#[error("{0}")]
	TooManySpecified(String),

	/// Indicates that too few parameters were specified.
	#[error("{0}")]
	TooFewSpecified(String),
}
