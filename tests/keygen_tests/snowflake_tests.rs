//! Snowflake Key Generator Tests
//!
//! Tests verify:
//! - Key layout (timestamp | worker id | sequence)
//! - Sequence increments within a millisecond and vibrates across them
//! - Sequence exhaustion rolls into the next millisecond
//! - Clock regression handling
//! - Property validation
//! - Uniqueness and ordering under concurrent callers

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::thread;

use shardroute::algorithm::Properties;
use shardroute::keygen::{KeyGenerateAlgorithm, SnowflakeKeyGenerateAlgorithm, TimeService, EPOCH_MILLIS};
use shardroute::ShardingError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Clock returning scripted readings, then repeating the last one
#[derive(Debug)]
struct ScriptedClock {
    readings: Mutex<VecDeque<i64>>,
    last: Mutex<i64>,
}

impl ScriptedClock {
    fn new(readings: &[i64]) -> Arc<Self> {
        Arc::new(Self {
            readings: Mutex::new(readings.iter().copied().collect()),
            last: Mutex::new(readings.first().copied().unwrap_or(EPOCH_MILLIS)),
        })
    }
}

impl TimeService for ScriptedClock {
    fn current_millis(&self) -> i64 {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.readings.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }
}

fn props(pairs: &[(&str, &str)]) -> Properties {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn generator_with_clock(pairs: &[(&str, &str)], readings: &[i64]) -> SnowflakeKeyGenerateAlgorithm {
    SnowflakeKeyGenerateAlgorithm::with_time_service(props(pairs), ScriptedClock::new(readings)).unwrap()
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_key_layout() {
    let now = EPOCH_MILLIS + 1_000;
    let generator = generator_with_clock(&[("worker-id", "5")], &[now]);
    let key = generator.generate_key().unwrap();

    assert_eq!(key, (1_000 << 22) | (5 << 12) | 1);
    assert_eq!(SnowflakeKeyGenerateAlgorithm::decompose(key), (now, 5, 1));
    assert_eq!(generator.worker_id(), 5);
}

#[test]
fn test_sequence_increments_within_same_millisecond() {
    let now = EPOCH_MILLIS + 42;
    let generator = generator_with_clock(&[], &[now, now, now]);
    let keys: Vec<i64> = (0..3).map(|_| generator.generate_key().unwrap()).collect();

    let sequences: Vec<i64> = keys.iter().map(|k| SnowflakeKeyGenerateAlgorithm::decompose(*k).2).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_sequence_offset_vibrates_on_new_millisecond() {
    let start = EPOCH_MILLIS + 100;
    let generator = generator_with_clock(&[], &[start, start + 1, start + 2, start + 3]);
    let sequences: Vec<i64> = (0..4)
        .map(|_| SnowflakeKeyGenerateAlgorithm::decompose(generator.generate_key().unwrap()).2)
        .collect();
    assert_eq!(sequences, vec![1, 0, 1, 0]);
}

#[test]
fn test_vibration_disabled_starts_at_zero() {
    let start = EPOCH_MILLIS + 100;
    let generator = generator_with_clock(&[("max-vibration-offset", "0")], &[start, start + 1]);
    for _ in 0..2 {
        let key = generator.generate_key().unwrap();
        assert_eq!(SnowflakeKeyGenerateAlgorithm::decompose(key).2, 0);
    }
}

#[test]
fn test_sequence_exhaustion_waits_for_next_millisecond() {
    let now = EPOCH_MILLIS + 500;
    // 4097 reads at `now`, then the clock advances while the generator spins
    let mut readings = vec![now; 4_097];
    readings.push(now + 1);
    let generator = generator_with_clock(&[("max-vibration-offset", "0")], &readings);

    let keys: Vec<i64> = (0..4_098).map(|_| generator.generate_key().unwrap()).collect();

    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(SnowflakeKeyGenerateAlgorithm::decompose(keys[0]), (now, 0, 0));
    assert_eq!(SnowflakeKeyGenerateAlgorithm::decompose(keys[4_095]), (now, 0, 4_095));
    assert_eq!(SnowflakeKeyGenerateAlgorithm::decompose(keys[4_096]), (now + 1, 0, 0));
    assert_eq!(SnowflakeKeyGenerateAlgorithm::decompose(keys[4_097]), (now + 1, 0, 1));
}

// =============================================================================
// Clock Regression Tests
// =============================================================================

#[test]
fn test_small_clock_regression_is_waited_out() {
    let now = EPOCH_MILLIS + 10_000;
    let generator = generator_with_clock(&[], &[now, now - 3, now + 1]);
    let first = generator.generate_key().unwrap();
    let second = generator.generate_key().unwrap();
    assert!(second > first);
    assert_eq!(SnowflakeKeyGenerateAlgorithm::decompose(second).0, now + 1);
}

#[test]
fn test_large_clock_regression_fails() {
    let now = EPOCH_MILLIS + 10_000;
    let generator = generator_with_clock(&[], &[now, now - 50]);
    generator.generate_key().unwrap();
    let err = generator.generate_key().unwrap_err();
    assert!(matches!(
        err,
        ShardingError::ClockBackwards { last, current } if last == now && current == now - 50
    ));
}

#[test]
fn test_regression_not_recovered_after_wait_fails() {
    let now = EPOCH_MILLIS + 10_000;
    let generator = generator_with_clock(&[], &[now, now - 2, now - 2]);
    generator.generate_key().unwrap();
    assert!(matches!(
        generator.generate_key().unwrap_err(),
        ShardingError::ClockBackwards { .. }
    ));
}

// =============================================================================
// Property Validation Tests
// =============================================================================

#[test]
fn test_invalid_worker_id_fails() {
    for bad in ["-1", "1024", "abc"] {
        let err = SnowflakeKeyGenerateAlgorithm::new(props(&[("worker-id", bad)])).unwrap_err();
        assert!(err.is_configuration(), "worker-id {}", bad);
    }
    assert!(SnowflakeKeyGenerateAlgorithm::new(props(&[("worker-id", "1023")])).is_ok());
}

#[test]
fn test_invalid_vibration_offset_fails() {
    let err = SnowflakeKeyGenerateAlgorithm::new(props(&[("max-vibration-offset", "4096")])).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_negative_tolerance_fails() {
    let err = SnowflakeKeyGenerateAlgorithm::new(props(&[("max-tolerate-time-difference-milliseconds", "-1")]))
        .unwrap_err();
    assert!(err.is_configuration());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_sequential_keys_are_unique_and_increasing() {
    let generator = SnowflakeKeyGenerateAlgorithm::new(Properties::new()).unwrap();
    let keys: Vec<i64> = (0..10_000).map(|_| generator.generate_key().unwrap()).collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_concurrent_keys_are_unique() {
    let generator = Arc::new(SnowflakeKeyGenerateAlgorithm::new(Properties::new()).unwrap());
    let mut handles = vec![];

    for _ in 0..8 {
        let generator_clone = Arc::clone(&generator);
        handles.push(thread::spawn(move || {
            let keys: Vec<i64> = (0..500).map(|_| generator_clone.generate_key().unwrap()).collect();
            // Each caller observes its own keys in call order
            assert!(keys.windows(2).all(|w| w[0] < w[1]));
            keys
        }));
    }

    let mut all = HashSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            assert!(all.insert(key), "duplicate key {}", key);
        }
    }
    assert_eq!(all.len(), 4_000);
}
