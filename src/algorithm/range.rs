//! Range sharding algorithms
//!
//! Both algorithms map integer values onto an ordered partition table and
//! partition index `i` onto `available[i % available.len()]`.
//!
//! ```text
//! STANDARD_RANGE lower=10 upper=45 volume=10
//!   0: (-∞, 10)  1: [10, 20)  2: [20, 30)  3: [30, 40)  4: [40, 45)  5: [45, +∞)
//!
//! CUSTOM_RANGE partition.ranges=1,5,10
//!   0: (-∞, 1)   1: [1, 5)    2: [5, 10)   3: [10, +∞)
//! ```

use std::sync::OnceLock;

use super::{
    numeric_value, push_unique, required_i64_prop, required_prop, target_at, PreciseShardingValue, Properties,
    RangeShardingValue, ShardingAlgorithm, StandardShardingAlgorithm,
};
use crate::error::{Result, ShardingError};

const PARTITION_LOWER: &str = "partition.lower";
const PARTITION_UPPER: &str = "partition.upper";
const PARTITION_VOLUME: &str = "partition.volume";
const PARTITION_RANGES: &str = "partition.ranges";

/// Half-open partition `[lower, upper)`; `None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl Partition {
    fn new(lower: Option<i64>, upper: Option<i64>) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lower.map_or(true, |l| value >= l) && self.upper.map_or(true, |u| value < u)
    }

    /// Whether any integer in `[low, high]` falls in this partition
    pub fn intersects(&self, low: i64, high: i64) -> bool {
        let own_low = self.lower.unwrap_or(i64::MIN);
        let own_high = match self.upper {
            Some(u) => match u.checked_sub(1) {
                Some(h) => h,
                None => return false,
            },
            None => i64::MAX,
        };
        low.max(own_low) <= high.min(own_high)
    }
}

// =============================================================================
// Shared Lookup
// =============================================================================

fn precise_target(
    partitions: &[Partition],
    available: &[String],
    value: &PreciseShardingValue<'_>,
    algorithm: &str,
) -> Result<Option<String>> {
    let v = numeric_value(value.value, algorithm)?;
    Ok(partitions
        .iter()
        .position(|p| p.contains(v))
        .and_then(|index| target_at(available, index)))
}

fn range_targets(
    partitions: &[Partition],
    available: &[String],
    value: &RangeShardingValue<'_>,
    algorithm: &str,
) -> Result<Vec<String>> {
    let bounds = value.value_range.to_inclusive_i64().map_err(|bad| {
        ShardingError::InvalidShardingValue(format!(
            "{} sharding algorithm requires integer range bounds, got '{}'",
            algorithm, bad
        ))
    })?;
    let mut result = Vec::new();
    let Some((low, high)) = bounds else {
        return Ok(result);
    };
    for (index, partition) in partitions.iter().enumerate() {
        if partition.intersects(low, high) {
            if let Some(target) = target_at(available, index) {
                push_unique(&mut result, target);
            }
        }
    }
    Ok(result)
}

/// Compute once, then serve the cached table
fn cached<'a>(cell: &'a OnceLock<Vec<Partition>>, build: impl FnOnce() -> Result<Vec<Partition>>) -> Result<&'a [Partition]> {
    if let Some(partitions) = cell.get() {
        return Ok(partitions);
    }
    let built = build()?;
    Ok(cell.get_or_init(|| built))
}

// =============================================================================
// STANDARD_RANGE
// =============================================================================

/// Fixed-width partitions tiling `[lower, upper)` plus two open-ended partitions
#[derive(Debug)]
pub struct StandardRangeShardingAlgorithm {
    props: Properties,
    partitions: OnceLock<Vec<Partition>>,
}

impl StandardRangeShardingAlgorithm {
    pub const TYPE: &'static str = "STANDARD_RANGE";

    pub fn new(props: Properties) -> Self {
        Self {
            props,
            partitions: OnceLock::new(),
        }
    }

    pub fn partitions(&self) -> Result<&[Partition]> {
        cached(&self.partitions, || self.build_partitions())
    }

    fn build_partitions(&self) -> Result<Vec<Partition>> {
        let lower = required_i64_prop(&self.props, PARTITION_LOWER, Self::TYPE)?;
        let upper = required_i64_prop(&self.props, PARTITION_UPPER, Self::TYPE)?;
        let volume = required_i64_prop(&self.props, PARTITION_VOLUME, Self::TYPE)?;
        if volume <= 0 {
            return Err(ShardingError::Configuration(format!(
                "{} sharding algorithm partition volume must be positive, got {}",
                Self::TYPE,
                volume
            )));
        }
        let span = upper.checked_sub(lower).filter(|span| *span >= volume).ok_or_else(|| {
            ShardingError::Configuration(format!(
                "{} sharding algorithm partition range can not be smaller than volume",
                Self::TYPE
            ))
        })?;

        let body = span / volume + i64::from(span % volume != 0);
        if body > i32::MAX as i64 {
            return Err(ShardingError::Configuration(format!(
                "{} sharding algorithm produces too many partitions: {}",
                Self::TYPE,
                body
            )));
        }

        let mut partitions = Vec::with_capacity(body as usize + 2);
        partitions.push(Partition::new(None, Some(lower)));
        for i in 0..body {
            let start = lower + i * volume;
            let end = start.saturating_add(volume).min(upper);
            partitions.push(Partition::new(Some(start), Some(end)));
        }
        partitions.push(Partition::new(Some(upper), None));
        Ok(partitions)
    }
}

impl ShardingAlgorithm for StandardRangeShardingAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }

    fn init(&self) -> Result<()> {
        self.partitions().map(|_| ())
    }
}

impl StandardShardingAlgorithm for StandardRangeShardingAlgorithm {
    fn do_precise_sharding(&self, available: &[String], value: &PreciseShardingValue<'_>) -> Result<Option<String>> {
        precise_target(self.partitions()?, available, value, Self::TYPE)
    }

    fn do_range_sharding(&self, available: &[String], value: &RangeShardingValue<'_>) -> Result<Vec<String>> {
        range_targets(self.partitions()?, available, value, Self::TYPE)
    }
}

// =============================================================================
// CUSTOM_RANGE
// =============================================================================

/// User-defined ascending boundaries
#[derive(Debug)]
pub struct CustomRangeShardingAlgorithm {
    props: Properties,
    partitions: OnceLock<Vec<Partition>>,
}

impl CustomRangeShardingAlgorithm {
    pub const TYPE: &'static str = "CUSTOM_RANGE";

    pub fn new(props: Properties) -> Self {
        Self {
            props,
            partitions: OnceLock::new(),
        }
    }

    pub fn partitions(&self) -> Result<&[Partition]> {
        cached(&self.partitions, || self.build_partitions())
    }

    fn build_partitions(&self) -> Result<Vec<Partition>> {
        let raw = required_prop(&self.props, PARTITION_RANGES, Self::TYPE)?;
        // Non-numeric tokens are dropped
        let mut boundaries: Vec<i64> = raw.split(',').filter_map(|token| token.trim().parse().ok()).collect();
        boundaries.sort_unstable();
        boundaries.dedup();
        if boundaries.is_empty() {
            return Err(ShardingError::Configuration(format!(
                "{} sharding algorithm partition ranges is not valid: '{}'",
                Self::TYPE,
                raw
            )));
        }

        let mut partitions = Vec::with_capacity(boundaries.len() + 1);
        partitions.push(Partition::new(None, Some(boundaries[0])));
        for pair in boundaries.windows(2) {
            partitions.push(Partition::new(Some(pair[0]), Some(pair[1])));
        }
        partitions.push(Partition::new(boundaries.last().copied(), None));
        Ok(partitions)
    }
}

impl ShardingAlgorithm for CustomRangeShardingAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }

    fn init(&self) -> Result<()> {
        self.partitions().map(|_| ())
    }
}

impl StandardShardingAlgorithm for CustomRangeShardingAlgorithm {
    fn do_precise_sharding(&self, available: &[String], value: &PreciseShardingValue<'_>) -> Result<Option<String>> {
        precise_target(self.partitions()?, available, value, Self::TYPE)
    }

    fn do_range_sharding(&self, available: &[String], value: &RangeShardingValue<'_>) -> Result<Vec<String>> {
        range_targets(self.partitions()?, available, value, Self::TYPE)
    }
}
