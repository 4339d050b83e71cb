//! Modulo sharding algorithms
//!
//! `MOD` takes the value modulo `sharding-count`; `HASH_MOD` takes the CRC32
//! of the value's bytes modulo `sharding-count`. Range lookups cannot be
//! narrowed by a modulo and return every available target.

use super::{
    numeric_value, required_i64_prop, target_at, PreciseShardingValue, Properties, RangeShardingValue,
    ShardingAlgorithm, StandardShardingAlgorithm,
};
use crate::error::{Result, ShardingError};

const SHARDING_COUNT: &str = "sharding-count";

fn sharding_count(props: &Properties, algorithm: &str) -> Result<i64> {
    let count = required_i64_prop(props, SHARDING_COUNT, algorithm)?;
    if count <= 0 {
        return Err(ShardingError::Configuration(format!(
            "{} sharding algorithm '{}' must be positive, got {}",
            algorithm, SHARDING_COUNT, count
        )));
    }
    Ok(count)
}

// =============================================================================
// MOD
// =============================================================================

/// `value mod sharding-count` (Euclidean, so negative values stay in range)
#[derive(Debug)]
pub struct ModShardingAlgorithm {
    props: Properties,
}

impl ModShardingAlgorithm {
    pub const TYPE: &'static str = "MOD";

    pub fn new(props: Properties) -> Self {
        Self { props }
    }
}

impl ShardingAlgorithm for ModShardingAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }

    fn init(&self) -> Result<()> {
        sharding_count(&self.props, Self::TYPE).map(|_| ())
    }
}

impl StandardShardingAlgorithm for ModShardingAlgorithm {
    fn do_precise_sharding(&self, available: &[String], value: &PreciseShardingValue<'_>) -> Result<Option<String>> {
        let count = sharding_count(&self.props, Self::TYPE)?;
        let index = numeric_value(value.value, Self::TYPE)?.rem_euclid(count);
        Ok(target_at(available, index as usize))
    }

    fn do_range_sharding(&self, available: &[String], _value: &RangeShardingValue<'_>) -> Result<Vec<String>> {
        Ok(available.to_vec())
    }
}

// =============================================================================
// HASH_MOD
// =============================================================================

/// `crc32(value) mod sharding-count`, usable with string keys
#[derive(Debug)]
pub struct HashModShardingAlgorithm {
    props: Properties,
}

impl HashModShardingAlgorithm {
    pub const TYPE: &'static str = "HASH_MOD";

    pub fn new(props: Properties) -> Self {
        Self { props }
    }
}

impl ShardingAlgorithm for HashModShardingAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }

    fn init(&self) -> Result<()> {
        sharding_count(&self.props, Self::TYPE).map(|_| ())
    }
}

impl StandardShardingAlgorithm for HashModShardingAlgorithm {
    fn do_precise_sharding(&self, available: &[String], value: &PreciseShardingValue<'_>) -> Result<Option<String>> {
        let count = sharding_count(&self.props, Self::TYPE)?;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&value.value.hash_bytes());
        let index = i64::from(hasher.finalize()) % count;
        Ok(target_at(available, index as usize))
    }

    fn do_range_sharding(&self, available: &[String], _value: &RangeShardingValue<'_>) -> Result<Vec<String>> {
        Ok(available.to_vec())
    }
}
