//! Keys for the BFV encryption scheme

mod evaluation_key;
mod key_switching_key;
mod public_key;
mod relinearization_key;
mod rotation_keys;
mod secret_key;

pub use evaluation_key::EvaluationKey;
pub use public_key::PublicKey;
pub use relinearization_key::RelinearizationKey;
pub use rotation_keys::{RotationKey, RotationKeySet};
pub use secret_key::SecretKey;
