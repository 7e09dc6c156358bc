//! Benchmark utilities.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::BTreeMap;

/// Generate random payload bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a random alphanumeric key.
pub fn random_key(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a map with `count` random keys and values.
pub fn random_map(count: usize) -> BTreeMap<String, i64> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| (random_key(12), rng.gen())).collect()
}
