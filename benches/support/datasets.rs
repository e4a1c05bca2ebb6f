use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use plume::{Key, Value};

/// Deterministic synthetic feature tensors for benchmarking.
pub fn tensors(node_count: usize, dim: usize, seed: u64) -> Vec<Value> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..node_count)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// Uniform random query batches over the node-id space.
pub fn query_batches(
    batches: usize,
    batch_size: usize,
    node_count: usize,
    seed: u64,
) -> Vec<Vec<Key>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..batches)
        .map(|_| {
            (0..batch_size)
                .map(|_| Key(rng.gen_range(0..node_count as u64)))
                .collect()
        })
        .collect()
}

/// Writes tensors as a features CSV (one node per line, comma-separated
/// floats).
pub fn write_features_csv(path: &Path, tensors: &[Value]) {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("features csv");
    for tensor in tensors {
        let record: Vec<String> = tensor.iter().map(|v| v.to_string()).collect();
        writer.write_record(&record).expect("row");
    }
    writer.flush().expect("flush");
}
