//! Generation of NTT-friendly primes.

use fhe_util::is_prime;

/// Returns the largest prime `p` of exactly `num_bits` bits such that
/// `p < upper_bound` and `p = 1 mod modulo`, if it exists.
///
/// Returns None if `num_bits` is not between 10 and 62, or if `modulo` is 0.
pub fn generate_prime(num_bits: usize, modulo: u64, upper_bound: u64) -> Option<u64> {
	if !(10..=62).contains(&num_bits) || modulo == 0 {
		return None;
	}

	let lower_bound = 1u64 << (num_bits - 1);
	let upper_bound = upper_bound.min(1u64 << num_bits);
	if upper_bound <= lower_bound {
		return None;
	}

	let mut candidate = upper_bound - 1;
	candidate -= (candidate - 1) % modulo;
	while candidate >= lower_bound {
		if is_prime(candidate) {
			return Some(candidate);
		}
		candidate = candidate.checked_sub(modulo)?;
	}

	None
}

#[cfg(test)]
mod tests {
	use super::generate_prime;
	use fhe_util::is_prime;

	#[test]
	fn generate() {
		assert_eq!(generate_prime(9, 16, 1 << 9), None);
		assert_eq!(generate_prime(63, 16, u64::MAX), None);
		assert_eq!(generate_prime(20, 0, 1 << 20), None);
		assert_eq!(generate_prime(20, 16, 1 << 18), None);

		// 65537 is the only 17-bit prime congruent to 1 modulo 2^16.
		assert_eq!(generate_prime(17, 1 << 16, 1 << 17), Some(65537));
		assert_eq!(generate_prime(17, 1 << 16, 65537), None);

		for (num_bits, modulo) in [(20, 16), (40, 1 << 12), (62, 1 << 17)] {
			let p = generate_prime(num_bits, modulo, 1 << num_bits).unwrap();
			assert!(is_prime(p));
			assert_eq!(p % modulo, 1);
			assert_eq!(64 - p.leading_zeros() as usize, num_bits);

			let q = generate_prime(num_bits, modulo, p).unwrap();
			assert!(q < p);
			assert!(is_prime(q));
			assert_eq!(q % modulo, 1);
		}
	}
}
