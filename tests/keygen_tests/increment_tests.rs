//! Increment Key Generator Tests

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use shardroute::algorithm::Properties;
use shardroute::keygen::{IncrementKeyGenerateAlgorithm, KeyGenerateAlgorithm};

#[test]
fn test_first_key_is_one() {
    let generator = IncrementKeyGenerateAlgorithm::new(Properties::new());
    assert_eq!(generator.generate_key().unwrap(), 1);
    assert_eq!(generator.generate_key().unwrap(), 2);
    assert_eq!(generator.type_name(), "INCREMENT");
}

#[test]
fn test_instances_count_independently() {
    let a = IncrementKeyGenerateAlgorithm::default();
    let b = IncrementKeyGenerateAlgorithm::default();
    a.generate_key().unwrap();
    a.generate_key().unwrap();
    assert_eq!(b.generate_key().unwrap(), 1);
}

#[test]
fn test_concurrent_keys_are_unique_and_dense() {
    let generator = Arc::new(IncrementKeyGenerateAlgorithm::default());
    let mut handles = vec![];

    for _ in 0..4 {
        let generator_clone = Arc::clone(&generator);
        handles.push(thread::spawn(move || {
            (0..1_000).map(|_| generator_clone.generate_key().unwrap()).collect::<Vec<_>>()
        }));
    }

    let mut all = HashSet::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }
    assert_eq!(all.len(), 4_000);
    assert_eq!(all.iter().copied().min(), Some(1));
    assert_eq!(all.iter().copied().max(), Some(4_000));
}
