//! Operations over ciphertexts.

use crate::bfv::Ciphertext;
use itertools::izip;
use std::ops::{AddAssign, Neg, SubAssign};

impl AddAssign<&Ciphertext> for Ciphertext {
	fn add_assign(&mut self, rhs: &Ciphertext) {
		assert_eq!(self.par, rhs.par, "Incompatible parameters");
		assert_eq!(self.level, rhs.level, "Incompatible levels");
		assert_eq!(self.c.len(), rhs.c.len(), "Incompatible degrees");

		izip!(self.c.iter_mut(), rhs.c.iter()).for_each(|(c1i, c2i)| *c1i += c2i);
		self.is_zero_encryption &= rhs.is_zero_encryption;
	}
}

impl SubAssign<&Ciphertext> for Ciphertext {
	fn sub_assign(&mut self, rhs: &Ciphertext) {
		assert_eq!(self.par, rhs.par, "Incompatible parameters");
		assert_eq!(self.level, rhs.level, "Incompatible levels");
		assert_eq!(self.c.len(), rhs.c.len(), "Incompatible degrees");

		izip!(self.c.iter_mut(), rhs.c.iter()).for_each(|(c1i, c2i)| *c1i -= c2i);
		self.is_zero_encryption &= rhs.is_zero_encryption;
	}
}

impl Neg for &Ciphertext {
	type Output = Ciphertext;

	fn neg(self) -> Ciphertext {
		Ciphertext {
			par: self.par.clone(),
			c: self.c.iter().map(|ci| -ci).collect(),
			level: self.level,
			is_zero_encryption: self.is_zero_encryption,
		}
	}
}
