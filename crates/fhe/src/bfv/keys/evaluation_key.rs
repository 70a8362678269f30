//! Evaluation keys for the BFV encryption scheme

use super::{RelinearizationKey, RotationKeySet};
use std::sync::Arc;

/// The key material an evaluator is bound to.
///
/// A missing key makes the operations that require it fail.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvaluationKey {
	/// The relinearization key.
	pub rlk: Option<Arc<RelinearizationKey>>,
	/// The rotation keys.
	pub rtks: Option<Arc<RotationKeySet>>,
}

impl EvaluationKey {
	/// Create an evaluation key from optional key material.
	pub fn new(rlk: Option<Arc<RelinearizationKey>>, rtks: Option<Arc<RotationKeySet>>) -> Self {
		Self { rlk, rtks }
	}
}
