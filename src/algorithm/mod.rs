//! Sharding Algorithm Module
//!
//! Pure functions narrowing candidate target names for a column value.
//!
//! ## Capabilities
//! - Standard: precise (one value -> at most one target) and range
//!   (value range -> every target whose partition intersects it)
//! - Complex: a tuple of column values -> targets
//! - Hint: out-of-band values -> targets
//!
//! Algorithms are stateless after initialization apart from cached derived
//! state (e.g. a partition table), so one instance is shared by every routing
//! thread. Built-ins are created by type key through [`AlgorithmRegistry`].

mod inline;
mod modulo;
mod range;
mod registry;

pub use inline::{ComplexInlineShardingAlgorithm, HintInlineShardingAlgorithm, InlineShardingAlgorithm};
pub use modulo::{HashModShardingAlgorithm, ModShardingAlgorithm};
pub use range::{CustomRangeShardingAlgorithm, Partition, StandardRangeShardingAlgorithm};
pub use registry::AlgorithmRegistry;

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, ShardingError};
use crate::route::{ShardingValue, ValueRange};

/// Algorithm property bag
pub type Properties = BTreeMap<String, String>;

// =============================================================================
// Sharding Values
// =============================================================================

/// One value for a precise lookup
#[derive(Debug, Clone, Copy)]
pub struct PreciseShardingValue<'a> {
    pub logic_table: &'a str,
    pub column_name: &'a str,
    pub value: &'a ShardingValue,
}

/// One range for a range lookup
#[derive(Debug, Clone, Copy)]
pub struct RangeShardingValue<'a> {
    pub logic_table: &'a str,
    pub column_name: &'a str,
    pub value_range: &'a ValueRange,
}

/// All configured columns' values for a complex lookup
#[derive(Debug, Clone, Default)]
pub struct ComplexKeysShardingValue {
    pub logic_table: String,
    pub column_values: BTreeMap<String, Vec<ShardingValue>>,
    pub column_ranges: BTreeMap<String, ValueRange>,
}

/// Hint values for a hint lookup
#[derive(Debug, Clone, Copy)]
pub struct HintShardingValue<'a> {
    pub logic_table: &'a str,
    pub column_name: &'a str,
    pub values: &'a [ShardingValue],
}

// =============================================================================
// Algorithm Traits
// =============================================================================

/// Common surface of every algorithm
pub trait ShardingAlgorithm: Send + Sync + fmt::Debug {
    /// Registry type key, e.g. `STANDARD_RANGE`
    fn type_name(&self) -> &str;

    fn props(&self) -> &Properties;

    /// Validate properties and prepare cached state
    ///
    /// Idempotent: later calls reuse what the first one built.
    fn init(&self) -> Result<()> {
        Ok(())
    }
}

/// Algorithm usable by a standard strategy: both precise and range lookups
pub trait StandardShardingAlgorithm: ShardingAlgorithm {
    /// Returns a name present in `available`, or `None` when no target holds the value
    fn do_precise_sharding(&self, available: &[String], value: &PreciseShardingValue<'_>) -> Result<Option<String>>;

    /// Returns the subset of `available` whose partitions intersect the range
    fn do_range_sharding(&self, available: &[String], value: &RangeShardingValue<'_>) -> Result<Vec<String>>;
}

pub trait ComplexKeysShardingAlgorithm: ShardingAlgorithm {
    fn do_sharding(&self, available: &[String], value: &ComplexKeysShardingValue) -> Result<Vec<String>>;
}

pub trait HintShardingAlgorithm: ShardingAlgorithm {
    fn do_sharding(&self, available: &[String], value: &HintShardingValue<'_>) -> Result<Vec<String>>;
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Partition index -> target at that ordinal, wrapping around the target count
pub(crate) fn target_at(available: &[String], index: usize) -> Option<String> {
    if available.is_empty() {
        return None;
    }
    Some(available[index % available.len()].clone())
}

/// Case-insensitive lookup returning the available spelling
pub(crate) fn find_target(available: &[String], name: &str) -> Option<String> {
    available.iter().find(|each| each.eq_ignore_ascii_case(name)).cloned()
}

pub(crate) fn push_unique(result: &mut Vec<String>, name: String) {
    if !result.iter().any(|each| each.eq_ignore_ascii_case(&name)) {
        result.push(name);
    }
}

pub(crate) fn required_prop<'a>(props: &'a Properties, key: &str, algorithm: &str) -> Result<&'a str> {
    match props.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ShardingError::Configuration(format!(
            "{} sharding algorithm property '{}' cannot be null",
            algorithm, key
        ))),
    }
}

pub(crate) fn required_i64_prop(props: &Properties, key: &str, algorithm: &str) -> Result<i64> {
    let raw = required_prop(props, key, algorithm)?;
    raw.parse().map_err(|_| {
        ShardingError::Configuration(format!(
            "{} sharding algorithm property '{}' must be an integer, got '{}'",
            algorithm, key, raw
        ))
    })
}

pub(crate) fn optional_i64_prop(props: &Properties, key: &str, default: i64, algorithm: &str) -> Result<i64> {
    match props.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(_) => required_i64_prop(props, key, algorithm),
        None => Ok(default),
    }
}

pub(crate) fn bool_prop(props: &Properties, key: &str) -> bool {
    props
        .get(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub(crate) fn numeric_value(value: &ShardingValue, algorithm: &str) -> Result<i64> {
    value.as_i64().ok_or_else(|| {
        ShardingError::InvalidShardingValue(format!(
            "{} sharding algorithm requires an integer value, got '{}'",
            algorithm, value
        ))
    })
}
