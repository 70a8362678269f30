//! Traits shared by the BFV objects.

use crate::bfv::BfvParameters;
use std::sync::Arc;

/// Objects that are bound to a set of parameters.
pub trait FheParametrized {
	/// The parameters this object was created under.
	fn parameters(&self) -> &Arc<BfvParameters>;

	/// Whether two objects were created under the same parameters.
	fn has_same_parameters<T: FheParametrized + ?Sized>(&self, other: &T) -> bool
	where
		Self: Sized,
	{
		same_parameters(self.parameters(), other.parameters())
	}
}

/// Whether two sets of parameters are equal, checking the pointers first.
pub(crate) fn same_parameters(a: &Arc<BfvParameters>, b: &Arc<BfvParameters>) -> bool {
	Arc::ptr_eq(a, b) || a == b
}
