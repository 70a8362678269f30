// Private lookup in an encrypted database: the server holds encrypted rows and
// receives an encrypted one-hot selection vector, and returns the selected row
// without learning which one was requested.

use fhe::bfv::{
	new_encryptor, BfvParametersBuilder, Ciphertext, Decryptor, Encoder, EvaluationKey, Evaluator,
	KeyGenerator, KeyMaterial,
};
use fhe_math::zq::Modulus;
use rand::thread_rng;
use std::{error::Error, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sum all the slots, so that every slot holds the total.
fn inner_sum(evaluator: &Evaluator, ct: &Ciphertext, degree: usize) -> fhe::Result<Ciphertext> {
	let mut sum = ct.clone();
	let mut i = 1;
	while i < degree / 2 {
		let rotated = evaluator.rotate_columns_new(&sum, i as i64)?;
		sum = evaluator.add_new(&sum, &rotated)?;
		i *= 2;
	}
	let swapped = evaluator.rotate_rows_new(&sum)?;
	evaluator.add_new(&sum, &swapped)
}

fn main() -> Result<(), Box<dyn Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let params = BfvParametersBuilder::new()
		.set_degree(1024)
		.set_plaintext_modulus(65537)
		.set_moduli_sizes(&[60, 60, 60])
		.build_arc()?;
	let degree = params.degree();
	let mut rng = thread_rng();

	// Client keys.
	let mut kgen = KeyGenerator::new(&params);
	let (sk, pk) = kgen.gen_key_pair()?;
	let rlk = kgen.gen_relinearization_key(&sk, 1)?;
	let shifts = (0..)
		.map(|i| 1i64 << i)
		.take_while(|k| *k < (degree / 2) as i64)
		.collect::<Vec<_>>();
	let rtks = kgen.gen_rotation_keys_for_rotations(&shifts, true, &sk)?;
	info!(rotation_keys = rtks.len(), "generated the client keys");

	let encoder = Encoder::new(&params);
	let mut encryptor = new_encryptor(KeyMaterial::Public(&pk))?;
	let evaluator = Evaluator::new(
		&params,
		EvaluationKey::new(Some(Arc::new(rlk)), Some(Arc::new(rtks))),
	)?;

	// The encrypted database.
	let rows = 10;
	let t = Modulus::new(params.plaintext())?;
	let data = (0..rows)
		.map(|_| {
			let m = t.random_vec(degree, &mut rng);
			let ct = encryptor.encrypt_new(&encoder.encode_new(&m, params.max_level())?)?;
			Ok((m, ct))
		})
		.collect::<fhe::Result<Vec<_>>>()?;

	// The encrypted query.
	let query_index = 5;
	let query = (0..rows)
		.map(|i| (i == query_index) as u64)
		.collect::<Vec<_>>();
	let query_ct = encryptor.encrypt_new(&encoder.encode_new(&query, params.max_level())?)?;
	info!(rows, "encrypted the database and the query");

	// Expand the query into one encrypted selection bit per row, replicated in
	// every slot, and accumulate the selected rows.
	let mut result = Ciphertext::zero(&params, 1, params.max_level())?;
	for (i, (_, row)) in data.iter().enumerate() {
		let mut mask = vec![0u64; rows];
		mask[i] = 1;
		let mask = encoder.encode_mul_new(&mask, params.max_level())?;
		let selected = evaluator.mul_new(&query_ct, &mask)?;
		let bit = inner_sum(&evaluator, &selected, degree)?;
		let product = evaluator.relinearize_new(&evaluator.mul_new(row, &bit)?)?;
		result = evaluator.add_new(&result, &product)?;
	}
	info!("processed the query");

	let decryptor = Decryptor::new(&sk)?;
	let m = encoder.decode_new(&decryptor.decrypt_new(&result)?)?;
	assert_eq!(m, data[query_index].0);
	info!("retrieved row {query_index}");

	Ok(())
}
