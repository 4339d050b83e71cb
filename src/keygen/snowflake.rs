//! Snowflake key generator
//!
//! ## Key Layout (63 bits used)
//! ```text
//! ┌───────┬──────────────────────────────┬──────────────┬───────────────┐
//! │ 0 (1) │ millis since epoch (41)      │ worker (10)  │ sequence (12) │
//! └───────┴──────────────────────────────┴──────────────┴───────────────┘
//! ```
//!
//! The epoch is 2016-11-01T00:00:00Z. Up to 4096 keys per millisecond per
//! worker; the generator spins into the next millisecond when a sequence is
//! exhausted. Each new millisecond starts its sequence at a vibrating offset
//! (0..=max-vibration-offset) so low-traffic keys do not all end in 0.
//!
//! Uniqueness across restarts and clock skew is best-effort: small clock
//! regressions are waited out, larger ones fail with `ClockBackwards`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use super::KeyGenerateAlgorithm;
use crate::algorithm::{optional_i64_prop, Properties};
use crate::error::{Result, ShardingError};

/// 2016-11-01T00:00:00Z in unix millis
pub const EPOCH_MILLIS: i64 = 1_477_958_400_000;

const SEQUENCE_BITS: u32 = 12;
const WORKER_ID_BITS: u32 = 10;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const WORKER_ID_LEFT_SHIFT: u32 = SEQUENCE_BITS;
const TIMESTAMP_LEFT_SHIFT: u32 = WORKER_ID_LEFT_SHIFT + WORKER_ID_BITS;
const WORKER_ID_MAX: i64 = 1 << WORKER_ID_BITS;

const WORKER_ID_KEY: &str = "worker-id";
const MAX_VIBRATION_OFFSET_KEY: &str = "max-vibration-offset";
const MAX_TOLERATE_TIME_DIFFERENCE_KEY: &str = "max-tolerate-time-difference-milliseconds";

const DEFAULT_WORKER_ID: i64 = 0;
const DEFAULT_VIBRATION_OFFSET: i64 = 1;
const DEFAULT_TOLERATE_TIME_DIFFERENCE_MILLIS: i64 = 10;

// =============================================================================
// Time Source
// =============================================================================

/// Millisecond clock
pub trait TimeService: Send + Sync + fmt::Debug {
    fn current_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeService;

impl TimeService for SystemTimeService {
    fn current_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

// =============================================================================
// Generator
// =============================================================================

#[derive(Debug, Default)]
struct SnowflakeState {
    last_millis: i64,
    sequence: i64,
    sequence_offset: i64,
}

#[derive(Debug)]
pub struct SnowflakeKeyGenerateAlgorithm {
    props: Properties,
    worker_id: i64,
    max_vibration_offset: i64,
    max_tolerate_time_difference_millis: i64,
    time_service: Arc<dyn TimeService>,
    /// The only lock on the routing path; held for the whole generation step
    state: Mutex<SnowflakeState>,
}

impl SnowflakeKeyGenerateAlgorithm {
    pub const TYPE: &'static str = "SNOWFLAKE";

    pub fn new(props: Properties) -> Result<Self> {
        Self::with_time_service(props, Arc::new(SystemTimeService))
    }

    pub fn with_time_service(props: Properties, time_service: Arc<dyn TimeService>) -> Result<Self> {
        let worker_id = optional_i64_prop(&props, WORKER_ID_KEY, DEFAULT_WORKER_ID, Self::TYPE)?;
        if !(0..WORKER_ID_MAX).contains(&worker_id) {
            return Err(ShardingError::Configuration(format!(
                "Illegal {}: {}, must be in [0, {})",
                WORKER_ID_KEY, worker_id, WORKER_ID_MAX
            )));
        }

        let max_vibration_offset =
            optional_i64_prop(&props, MAX_VIBRATION_OFFSET_KEY, DEFAULT_VIBRATION_OFFSET, Self::TYPE)?;
        if !(0..=SEQUENCE_MASK).contains(&max_vibration_offset) {
            return Err(ShardingError::Configuration(format!(
                "Illegal {}: {}, must be in [0, {}]",
                MAX_VIBRATION_OFFSET_KEY, max_vibration_offset, SEQUENCE_MASK
            )));
        }

        let max_tolerate_time_difference_millis = optional_i64_prop(
            &props,
            MAX_TOLERATE_TIME_DIFFERENCE_KEY,
            DEFAULT_TOLERATE_TIME_DIFFERENCE_MILLIS,
            Self::TYPE,
        )?;
        if max_tolerate_time_difference_millis < 0 {
            return Err(ShardingError::Configuration(format!(
                "Illegal {}: {}, must not be negative",
                MAX_TOLERATE_TIME_DIFFERENCE_KEY, max_tolerate_time_difference_millis
            )));
        }

        Ok(Self {
            props,
            worker_id,
            max_vibration_offset,
            max_tolerate_time_difference_millis,
            time_service,
            state: Mutex::new(SnowflakeState::default()),
        })
    }

    pub fn worker_id(&self) -> i64 {
        self.worker_id
    }

    /// Split a generated key into (unix millis, worker id, sequence)
    pub fn decompose(key: i64) -> (i64, i64, i64) {
        let millis = (key >> TIMESTAMP_LEFT_SHIFT) + EPOCH_MILLIS;
        let worker_id = (key >> WORKER_ID_LEFT_SHIFT) & (WORKER_ID_MAX - 1);
        let sequence = key & SEQUENCE_MASK;
        (millis, worker_id, sequence)
    }

    /// Returns the (possibly re-read) current time, or fails on a large regression
    fn tolerate_clock_regression(&self, last_millis: i64, current_millis: i64) -> Result<i64> {
        if last_millis <= current_millis {
            return Ok(current_millis);
        }
        let difference = last_millis - current_millis;
        if difference >= self.max_tolerate_time_difference_millis {
            return Err(ShardingError::ClockBackwards {
                last: last_millis,
                current: current_millis,
            });
        }

        tracing::warn!(
            last_millis,
            current_millis,
            "Clock moved backwards by {} ms, waiting it out",
            difference
        );
        std::thread::sleep(Duration::from_millis(difference as u64));

        let now = self.time_service.current_millis();
        if now < last_millis {
            return Err(ShardingError::ClockBackwards {
                last: last_millis,
                current: now,
            });
        }
        Ok(now)
    }

    fn wait_until_after(&self, last_millis: i64) -> i64 {
        loop {
            let now = self.time_service.current_millis();
            if now > last_millis {
                return now;
            }
            std::hint::spin_loop();
        }
    }
}

impl KeyGenerateAlgorithm for SnowflakeKeyGenerateAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }

    fn generate_key(&self) -> Result<i64> {
        let mut state = self.state.lock();

        let current = self.time_service.current_millis();
        let mut current = self.tolerate_clock_regression(state.last_millis, current)?;

        if state.last_millis == current {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                current = self.wait_until_after(current);
            }
        } else {
            state.sequence_offset = if state.sequence_offset >= self.max_vibration_offset {
                0
            } else {
                state.sequence_offset + 1
            };
            state.sequence = state.sequence_offset;
        }
        state.last_millis = current;

        Ok(((current - EPOCH_MILLIS) << TIMESTAMP_LEFT_SHIFT)
            | (self.worker_id << WORKER_ID_LEFT_SHIFT)
            | state.sequence)
    }
}
